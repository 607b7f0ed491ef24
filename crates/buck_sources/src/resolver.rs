//! Source directory resolution
//!
//! Drives scan -> normalize -> build -> rescan until every requested target
//! has a link-tree on disk, with at most one extra build pass when the first
//! pass was not allowed to build.

use crate::builder::Builder;
use crate::cache::CacheStore;
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::normalizer::Normalizer;
use crate::prompt::Confirm;
use crate::scanner::{DirectoryScanner, TargetsMap};
use crate::target::{presumed_target_root, split_output_line};
use crate::tool::ToolRunner;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Build passes allowed after a pass that was not allowed to build.
const MAX_BUILD_RETRIES: usize = 1;

const BUILD_QUESTION: &str = "Build target?";

/// Original target -> (expanded target -> output).
pub type FullTargetsMap = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Build missing targets on the first pass.
    pub build: bool,
    /// Ask before the retry build. Without it the retry happens unasked.
    pub prompt: bool,
    /// Serve normalization from the cache when possible.
    pub use_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            build: false,
            prompt: true,
            use_cache: false,
        }
    }
}

/// Where a resolution currently is. Logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Normalizing,
    Building,
    Rescanning,
    AwaitingPrompt,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Scanning => "scanning",
            Phase::Normalizing => "normalizing",
            Phase::Building => "building",
            Phase::Rescanning => "rescanning",
            Phase::AwaitingPrompt => "awaiting prompt",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct PassOutcome {
    directories: Vec<PathBuf>,
    unbuilt: Vec<String>,
}

pub struct SourceDirectoryResolver<'a> {
    config: ResolverConfig,
    scanner: DirectoryScanner,
    runner: &'a dyn ToolRunner,
    cache: &'a mut dyn CacheStore,
    confirm: &'a mut dyn Confirm,
}

impl<'a> SourceDirectoryResolver<'a> {
    pub fn new(
        config: ResolverConfig,
        runner: &'a dyn ToolRunner,
        cache: &'a mut dyn CacheStore,
        confirm: &'a mut dyn Confirm,
    ) -> Self {
        let scanner = DirectoryScanner::new(&config.project_root, &config.buck_out_gen);
        Self {
            config,
            scanner,
            runner,
            cache,
            confirm,
        }
    }

    /// Link-tree directories for `original_targets`, in discovery order.
    ///
    /// A first pass without `build` that leaves targets unbuilt is followed by
    /// exactly one build pass (after confirmation when `prompt` is set). The
    /// build pass never uses the normalization cache.
    pub fn generate_source_directories(
        &mut self,
        original_targets: &[String],
        options: ResolveOptions,
    ) -> Result<Vec<PathBuf>> {
        let mut pass = options;
        let mut retries_left = MAX_BUILD_RETRIES;

        loop {
            let outcome = self.resolve_pass(original_targets, pass)?;
            if outcome.unbuilt.is_empty() {
                enter(Phase::Succeeded);
                return Ok(outcome.directories);
            }

            if pass.build || retries_left == 0 {
                return Err(self.missing_link_trees(outcome.unbuilt));
            }

            warn!(
                "Could not find link trees for:\n    `{}`.\n   These targets might be unbuilt or only partially built.",
                outcome.unbuilt.join("    \n")
            );
            if pass.prompt {
                enter(Phase::AwaitingPrompt);
                if !self.confirm.confirm(BUILD_QUESTION) {
                    return Err(self.missing_link_trees(outcome.unbuilt));
                }
            }

            retries_left -= 1;
            pass = ResolveOptions {
                build: true,
                prompt: false,
                use_cache: false,
            };
        }
    }

    fn resolve_pass(&mut self, original_targets: &[String], pass: ResolveOptions) -> Result<PassOutcome> {
        enter(Phase::Scanning);
        let originals: TargetsMap = original_targets
            .iter()
            .map(|target| (target.clone(), None))
            .collect();
        let scan = self.scanner.find_source_directories(&originals);
        let mut directories = scan.directories;

        let mut full_targets_map = FullTargetsMap::new();
        if !scan.not_found.is_empty() {
            enter(Phase::Normalizing);
            let lines = Normalizer::new(self.runner, &mut *self.cache, self.config.query_timeout)
                .normalize(&scan.not_found, pass.use_cache)?;
            full_targets_map = partition_targets(&scan.not_found, &lines);
        }

        if pass.build && !full_targets_map.is_empty() {
            let expanded = expanded_targets(&full_targets_map);
            if expanded.is_empty() {
                warn!("None of the requested targets expanded to a buildable target; skipping build.");
            } else {
                enter(Phase::Building);
                Builder::new(self.runner, self.config.build_log_tail).build(&expanded)?;
            }
        }

        enter(Phase::Rescanning);
        let mut unbuilt = Vec::new();
        for (original, expanded) in &full_targets_map {
            let targets: TargetsMap = expanded
                .iter()
                .map(|(target, output)| (target.clone(), Some(output.clone())))
                .collect();
            let rescan = self.scanner.find_source_directories(&targets);
            // Anything unbuilt or only partially built.
            if !rescan.not_found.is_empty() {
                unbuilt.push(original.clone());
            }
            directories.extend(rescan.directories);
        }

        Ok(PassOutcome {
            directories,
            unbuilt,
        })
    }

    fn missing_link_trees(&self, targets: Vec<String>) -> ResolveError {
        enter(Phase::Failed);
        ResolveError::LinkTreesMissingAfterBuild {
            targets,
            help_command: self.config.help_command.clone(),
        }
    }
}

fn enter(phase: Phase) {
    debug!("Resolution phase: {}", phase);
}

/// Group query lines under the original targets whose presumed root prefixes
/// theirs. A line may land under several originals.
pub fn partition_targets(original_targets: &[String], lines: &[String]) -> FullTargetsMap {
    let mut full_targets_map = FullTargetsMap::new();
    for original in original_targets {
        let original_root = presumed_target_root(original);
        let mut expanded = IndexMap::new();
        for line in lines {
            let (target, output) = split_output_line(line);
            if presumed_target_root(&target).starts_with(&original_root) {
                expanded.insert(target, output);
            }
        }
        if expanded.is_empty() {
            warn!("No python_binary or python_test targets found for `{}`", original);
        }
        full_targets_map.insert(original.clone(), expanded);
    }
    full_targets_map
}

/// Every expanded target once, in first-seen order.
pub fn expanded_targets(full_targets_map: &FullTargetsMap) -> Vec<String> {
    let mut seen = IndexMap::new();
    for expanded in full_targets_map.values() {
        for target in expanded.keys() {
            seen.entry(target.clone()).or_insert(());
        }
    }
    seen.into_keys().collect()
}
