//! `buck build` wrapper

use crate::error::{ResolveError, Result};
use crate::tool::{tail_lines, Invocation, ToolRunner, ToolStatus};
use tracing::{error, info};

pub struct Builder<'a> {
    runner: &'a dyn ToolRunner,
    log_tail: usize,
}

impl<'a> Builder<'a> {
    /// `log_tail` bounds how many stderr lines a failure carries.
    pub fn new(runner: &'a dyn ToolRunner, log_tail: usize) -> Self {
        Self { runner, log_tail }
    }

    /// Build `targets`, waiting as long as buck takes.
    pub fn build(&self, targets: &[String]) -> Result<()> {
        info!(
            "Building target{} `{}`",
            if targets.len() > 1 { "s:" } else { "" },
            targets.join("`, `")
        );

        let output = self.runner.run(&build_invocation(targets))?;
        match output.status {
            ToolStatus::Success => {
                info!("Finished building targets.");
                Ok(())
            }
            // Only reachable if a runner imposes its own deadline.
            ToolStatus::Failed { .. } | ToolStatus::TimedOut => {
                let diagnostics = tail_lines(&output.stderr, self.log_tail);
                error!("Buck returned error: {}", diagnostics);
                Err(ResolveError::BuildToolBuildFailed { diagnostics })
            }
        }
    }
}

/// `build <targets>`, no timeout.
pub fn build_invocation(targets: &[String]) -> Invocation {
    let mut args = Vec::with_capacity(targets.len() + 1);
    args.push("build".to_string());
    args.extend(targets.iter().cloned());
    Invocation::new(args, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_invocation_has_no_timeout() {
        let invocation = build_invocation(&["//a:b".to_string()]);
        assert_eq!(invocation.args, vec!["build", "//a:b"]);
        assert_eq!(invocation.timeout, None);
    }
}
