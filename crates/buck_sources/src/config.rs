//! Resolver configuration
//!
//! Defaults match a stock Buck checkout with the cache under `.pyre/`.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default `buck` executable name, looked up on `PATH`.
pub const DEFAULT_BUCK_PATH: &str = "buck";

/// Generated-output root, relative to the project root.
pub const DEFAULT_BUCK_OUT_GEN: &str = "buck-out/gen";

/// Normalization cache, relative to the project root.
pub const DEFAULT_CACHE_PATH: &str = ".pyre/buckcache.json";

/// Upper bound for `buck targets --show-output`.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(200);

/// Build diagnostics can run to thousands of lines; only the tail is kept.
pub const DEFAULT_BUILD_LOG_TAIL: usize = 20;

/// Command named in "see `<cmd> --help`" messages.
pub const DEFAULT_HELP_COMMAND: &str = "buck-sources";

/// Everything the resolver needs to know about its environment.
#[derive(Debug, Clone, Serialize)]
pub struct ResolverConfig {
    /// Working directory for `buck` and base for relative paths.
    pub project_root: PathBuf,
    pub buck_path: PathBuf,
    pub buck_out_gen: PathBuf,
    pub cache_path: PathBuf,
    #[serde(with = "duration_secs")]
    pub query_timeout: Duration,
    pub build_log_tail: usize,
    pub help_command: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            buck_path: PathBuf::from(DEFAULT_BUCK_PATH),
            buck_out_gen: PathBuf::from(DEFAULT_BUCK_OUT_GEN),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            build_log_tail: DEFAULT_BUILD_LOG_TAIL,
            help_command: DEFAULT_HELP_COMMAND.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Default configuration rooted at `project_root`.
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Cache file location, resolved against the project root when relative.
    pub fn resolved_cache_path(&self) -> PathBuf {
        self.resolve(&self.cache_path)
    }

    /// Generated-output root, resolved against the project root when relative.
    pub fn resolved_buck_out_gen(&self) -> PathBuf {
        self.resolve(&self.buck_out_gen)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }
}
