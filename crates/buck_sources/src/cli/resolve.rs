//! Resolve command - targets to link-tree directories
//!
//! Prints one directory per line, ready to be handed to a type checker as
//! source directories.

use buck_sources::{
    FileCacheStore, ProcessRunner, ResolveOptions, ResolverConfig, SourceDirectoryResolver,
    StdinConfirm,
};
use serde::Serialize;

/// Arguments for the resolve command
#[derive(Debug, clap::Args)]
pub struct ResolveArgs {
    /// Targets to resolve, e.g. //project/app:main or //project/...
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Build missing targets on the first pass
    #[arg(long)]
    pub build: bool,

    /// Build missing targets without asking first. Otherwise the answer is
    /// read from stdin, and an empty or closed stdin declines
    #[arg(long)]
    pub no_prompt: bool,

    /// Reuse cached `buck targets` results for identical target lists
    #[arg(long)]
    pub use_cache: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ResolveArgs {
    pub fn options(&self) -> ResolveOptions {
        ResolveOptions {
            build: self.build,
            prompt: !self.no_prompt,
            use_cache: self.use_cache,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
    source_directories: Vec<String>,
}

pub fn run(args: ResolveArgs, config: ResolverConfig) -> anyhow::Result<()> {
    let options = args.options();
    let runner = ProcessRunner::from_config(&config);
    let mut cache = FileCacheStore::new(config.resolved_cache_path());

    // Answers may be piped in; a closed stdin declines.
    let mut confirm = StdinConfirm;

    let directories = SourceDirectoryResolver::new(config, &runner, &mut cache, &mut confirm)
        .generate_source_directories(&args.targets, options)?;

    let source_directories: Vec<String> = directories
        .iter()
        .map(|dir| dir.to_string_lossy().to_string())
        .collect();

    if args.json {
        let output = ResolveOutput { source_directories };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for dir in source_directories {
            println!("{}", dir);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(build: bool, no_prompt: bool) -> ResolveArgs {
        ResolveArgs {
            targets: vec!["//a:b".to_string()],
            build,
            no_prompt,
            use_cache: true,
            json: false,
        }
    }

    #[test]
    fn test_options_from_flags() {
        let options = args(false, true).options();
        assert!(!options.build);
        assert!(!options.prompt);
        assert!(options.use_cache);

        let options = args(true, false).options();
        assert!(options.build);
        assert!(options.prompt);
    }
}
