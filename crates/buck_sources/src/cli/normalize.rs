//! Normalize command - show what buck expands targets to
//!
//! Runs only the `buck targets --show-output` step, which is handy when a
//! resolution fails and it is unclear which concrete targets were involved.

use buck_sources::target::split_output_line;
use buck_sources::{FileCacheStore, Normalizer, ProcessRunner, ResolverConfig};
use serde::Serialize;

/// Arguments for the normalize command
#[derive(Debug, clap::Args)]
pub struct NormalizeArgs {
    /// Targets to expand, e.g. //project/...
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Answer from the cache when the same target list was queried before
    #[arg(long)]
    pub use_cache: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct NormalizedTarget {
    target: String,
    output: String,
}

#[derive(Debug, Serialize)]
struct NormalizeOutput {
    targets: Vec<NormalizedTarget>,
}

pub fn run(args: NormalizeArgs, config: ResolverConfig) -> anyhow::Result<()> {
    let runner = ProcessRunner::from_config(&config);
    let mut cache = FileCacheStore::new(config.resolved_cache_path());

    let lines = Normalizer::new(&runner, &mut cache, config.query_timeout)
        .normalize(&args.targets, args.use_cache)?;

    if args.json {
        let targets = lines
            .iter()
            .map(|line| {
                let (target, output) = split_output_line(line);
                NormalizedTarget { target, output }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&NormalizeOutput { targets })?);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}
