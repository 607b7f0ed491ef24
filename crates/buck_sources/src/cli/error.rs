//! Helpful error rendering for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use buck_sources::ResolveError;
use std::fmt;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Resolution failures ===

    pub fn build_tool_hung(command: &str) -> Self {
        Self::new(format!("`{}` did not finish in time", command))
            .with_context("Buck took longer than the query timeout to list target outputs")
            .with_suggestions([
                "TRY: Run `buck clean` and try again".to_string(),
                "TRY: Raise the limit with --query-timeout-secs".to_string(),
            ])
    }

    pub fn query_failed(diagnostics: &str) -> Self {
        Self::new("Could not normalize targets")
            .with_context(buck_context(diagnostics))
            .with_suggestions([
                "TRY: Check that the target paths exist".to_string(),
                "TRY: Run `buck clean` and try again".to_string(),
            ])
    }

    pub fn build_failed(diagnostics: &str) -> Self {
        Self::new("Could not build targets")
            .with_context(buck_context(diagnostics))
            .with_suggestions([
                "TRY: Check that the target paths exist".to_string(),
                "TRY: Run `buck clean` and try again".to_string(),
            ])
    }

    pub fn link_trees_missing(targets: &[String], help_command: &str) -> Self {
        Self::new("Could not find link trees")
            .with_context(format!("No link-tree on disk for: {}", targets.join(", ")))
            .with_suggestions([
                "TRY: Re-run with --build to build the targets first".to_string(),
                format!("TRY: See `{} --help` for more information", help_command),
            ])
    }

    pub fn tool_unavailable(command: &str, reason: &str) -> Self {
        Self::new(format!("Could not run `{}`", command))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Check that buck is installed and on PATH: which buck".to_string(),
                "TRY: Point at a specific binary with --buck or BUCK_SOURCES_BUCK".to_string(),
            ])
    }
}

impl From<&ResolveError> for HelpfulError {
    fn from(err: &ResolveError) -> Self {
        match err {
            ResolveError::BuildToolHung { command } => Self::build_tool_hung(command),
            ResolveError::BuildToolQueryFailed { diagnostics } => Self::query_failed(diagnostics),
            ResolveError::BuildToolBuildFailed { diagnostics } => Self::build_failed(diagnostics),
            ResolveError::LinkTreesMissingAfterBuild {
                targets,
                help_command,
            } => Self::link_trees_missing(targets, help_command),
            ResolveError::ToolLaunch { command, source } => {
                Self::tool_unavailable(command, &source.to_string())
            }
        }
    }
}

fn buck_context(diagnostics: &str) -> String {
    if diagnostics.trim().is_empty() {
        "Buck exited with an error and printed nothing".to_string()
    } else {
        format!("Buck output:\n{}", diagnostics)
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print a command failure to stderr, helpfully when we know the error.
pub fn print_error(err: &anyhow::Error) {
    if let Some(resolve_err) = err.downcast_ref::<ResolveError>() {
        eprint!("{}", HelpfulError::from(resolve_err));
    } else if let Some(helpful) = err.downcast_ref::<HelpfulError>() {
        eprint!("{}", helpful);
    } else {
        eprintln!("ERROR: {:#}", err);
    }
}

/// Print a command failure as a JSON object on stdout.
pub fn print_json_error(err: &anyhow::Error) {
    let kind = match err.downcast_ref::<ResolveError>() {
        Some(ResolveError::BuildToolHung { .. }) => "build_tool_hung",
        Some(ResolveError::BuildToolQueryFailed { .. }) => "build_tool_query_failed",
        Some(ResolveError::BuildToolBuildFailed { .. }) => "build_tool_build_failed",
        Some(ResolveError::LinkTreesMissingAfterBuild { .. }) => "link_trees_missing_after_build",
        Some(ResolveError::ToolLaunch { .. }) => "tool_launch",
        None => "other",
    };
    let payload = serde_json::json!({
        "error": {
            "kind": kind,
            "message": format!("{:#}", err),
        }
    });
    println!("{}", payload);
}
