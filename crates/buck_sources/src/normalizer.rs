//! Target normalization
//!
//! Expands (possibly wildcarded) targets into concrete `<target> <output>`
//! pairs with `buck targets --show-output`, restricted to Python binaries and
//! tests. Results are cached per exact query.

use crate::cache::{cache_key, CacheStore};
use crate::error::{ResolveError, Result};
use crate::tool::{Invocation, ToolRunner, ToolStatus};
use std::time::Duration;
use tracing::{error, info, warn};

/// Rule types whose outputs carry link-trees.
pub const QUERY_TARGET_TYPES: [&str; 2] = ["python_binary", "python_test"];

pub struct Normalizer<'a> {
    runner: &'a dyn ToolRunner,
    cache: &'a mut dyn CacheStore,
    query_timeout: Duration,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        runner: &'a dyn ToolRunner,
        cache: &'a mut dyn CacheStore,
        query_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            cache,
            query_timeout,
        }
    }

    /// Raw query lines for `targets`, one per resolved target.
    ///
    /// With `use_cache`, a cached answer for the identical target list is
    /// returned without running buck. Cache problems are logged, never
    /// returned.
    pub fn normalize(&mut self, targets: &[String], use_cache: bool) -> Result<Vec<String>> {
        info!(
            "Normalizing target{} `{}`",
            if targets.len() > 1 { "s:" } else { "" },
            targets.join("`, `")
        );

        let key = cache_key(targets);
        self.cache.load();
        if use_cache {
            if let Some(lines) = self.cache.get(&key) {
                info!("Using cached targets.");
                return Ok(lines.to_vec());
            }
        }

        let invocation = query_invocation(targets, self.query_timeout);
        let output = self.runner.run(&invocation)?;
        match output.status {
            ToolStatus::Success => {}
            ToolStatus::TimedOut => {
                return Err(ResolveError::BuildToolHung {
                    command: self.runner.command_line(&invocation),
                });
            }
            ToolStatus::Failed { code } => {
                let diagnostics = output.stderr.trim().to_string();
                error!("Buck returned error (exit code {:?}): {}", code, diagnostics);
                return Err(ResolveError::BuildToolQueryFailed { diagnostics });
            }
        }

        let lines = output.stdout_lines();
        if lines.is_empty() {
            warn!("Provided TARGETS files do not contain any binary or unittest targets.");
            return Ok(lines);
        }
        info!(
            "Found {} buck target{}.",
            lines.len(),
            if lines.len() > 1 { "s" } else { "" }
        );

        self.cache.put(key, lines.clone());
        if let Err(e) = self.cache.flush() {
            warn!("Could not write target cache: {}", e);
        }
        Ok(lines)
    }
}

/// `targets --show-output <targets> --type python_binary python_test`
pub fn query_invocation(targets: &[String], timeout: Duration) -> Invocation {
    let mut args = vec!["targets".to_string(), "--show-output".to_string()];
    args.extend(targets.iter().cloned());
    args.push("--type".to_string());
    args.extend(QUERY_TARGET_TYPES.iter().map(|t| t.to_string()));
    Invocation::new(args, Some(timeout))
}
