//! Configuration flags and the `config` command
//!
//! Every flag can also come from the environment, so a wrapping type checker
//! can configure the resolver once for all invocations.

use buck_sources::config::{
    DEFAULT_BUCK_OUT_GEN, DEFAULT_BUCK_PATH, DEFAULT_CACHE_PATH, DEFAULT_HELP_COMMAND,
};
use buck_sources::ResolverConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct GlobalConfigArgs {
    /// Project root: buck runs here and relative paths resolve against it
    #[arg(long, global = true, env = "BUCK_SOURCES_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Buck executable (name on PATH or explicit path)
    #[arg(long = "buck", global = true, env = "BUCK_SOURCES_BUCK", default_value = DEFAULT_BUCK_PATH)]
    pub buck_path: PathBuf,

    /// Normalization cache file
    #[arg(long, global = true, env = "BUCK_SOURCES_CACHE", default_value = DEFAULT_CACHE_PATH)]
    pub cache_path: PathBuf,

    /// Generated-output root that holds link-trees
    #[arg(long, global = true, env = "BUCK_SOURCES_BUCK_OUT", default_value = DEFAULT_BUCK_OUT_GEN)]
    pub buck_out_gen: PathBuf,

    /// Seconds to wait for `buck targets` before giving up
    #[arg(long, global = true, env = "BUCK_SOURCES_QUERY_TIMEOUT", default_value_t = 200)]
    pub query_timeout_secs: u64,
}

impl GlobalConfigArgs {
    pub fn to_config(&self) -> ResolverConfig {
        ResolverConfig {
            project_root: self.project_root.clone(),
            buck_path: self.buck_path.clone(),
            buck_out_gen: self.buck_out_gen.clone(),
            cache_path: self.cache_path.clone(),
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            help_command: DEFAULT_HELP_COMMAND.to_string(),
            ..ResolverConfig::default()
        }
    }
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show the configuration as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the config command - shows the effective configuration
pub fn run(args: ConfigArgs, config: &ResolverConfig) -> anyhow::Result<()> {
    let cache_path = config.resolved_cache_path();
    let buck_out_gen = config.resolved_buck_out_gen();
    let buck = which::which(&config.buck_path).ok();

    if args.json {
        let payload = serde_json::json!({
            "config": config,
            "resolved": {
                "cache_path": cache_path.to_string_lossy(),
                "cache_exists": cache_path.exists(),
                "buck_out_gen": buck_out_gen.to_string_lossy(),
                "buck_out_gen_exists": buck_out_gen.exists(),
                "buck": buck.as_ref().map(|p| p.to_string_lossy().to_string()),
            },
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Project root:   {}", config.project_root.display());
    println!(
        "Buck:           {} ({})",
        config.buck_path.display(),
        buck.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not found".to_string())
    );
    println!(
        "buck-out/gen:   {}{}",
        buck_out_gen.display(),
        if buck_out_gen.exists() { "" } else { " (missing)" }
    );
    println!(
        "Cache:          {}{}",
        cache_path.display(),
        if cache_path.exists() { "" } else { " (not written yet)" }
    );
    println!("Query timeout:  {}s", config.query_timeout.as_secs());
    println!("Build log tail: {} lines", config.build_log_tail);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args_to_config() {
        let args = GlobalConfigArgs {
            project_root: PathBuf::from("/repo"),
            buck_path: PathBuf::from("/opt/buck"),
            cache_path: PathBuf::from("cache.json"),
            buck_out_gen: PathBuf::from(DEFAULT_BUCK_OUT_GEN),
            query_timeout_secs: 5,
        };

        let config = args.to_config();
        assert_eq!(config.project_root, PathBuf::from("/repo"));
        assert_eq!(config.buck_path, PathBuf::from("/opt/buck"));
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.resolved_cache_path(), PathBuf::from("/repo/cache.json"));
        assert_eq!(config.build_log_tail, 20);
    }
}
