//! Error types for target resolution

use std::io;
use thiserror::Error;

/// Failures surfaced to callers of the resolver.
///
/// Every variant is terminal for the current resolution; the only retry the
/// resolver performs itself is the single build pass after an unbuilt scan.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// `command` is the complete query command line, trailing `--type`
    /// values included, so it can be pasted back into a shell.
    #[error("Seems like `{command}` is hanging.\n   Try running `buck clean` before trying again.")]
    BuildToolHung { command: String },

    #[error("Could not normalize targets. Check the paths or run `buck clean`.\n{diagnostics}")]
    BuildToolQueryFailed { diagnostics: String },

    #[error("Could not build targets. Check the paths or run `buck clean`.\n{diagnostics}")]
    BuildToolBuildFailed { diagnostics: String },

    #[error(
        "Could not find link trees for:\n    `{}`.\n   See `{help_command} --help` for more information.",
        .targets.join("    \n")
    )]
    LinkTreesMissingAfterBuild {
        targets: Vec<String>,
        help_command: String,
    },

    #[error("Failed to launch `{command}`: {source}")]
    ToolLaunch {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Failures reading or writing the normalization cache.
///
/// Never escapes the normalizer: the cache is an optimization only.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ResolveError>;
