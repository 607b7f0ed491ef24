//! buck_sources - Buck target to link-tree resolution
//!
//! Turns a list of Buck targets (wildcards allowed) into the built Python
//! link-tree directories a type checker can analyze, building them with buck
//! when they are missing.

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod prompt;
pub mod resolver;
pub mod scanner;
pub mod target;
pub mod tool;

pub use builder::Builder;
pub use cache::{cache_key, CacheStore, FileCacheStore};
pub use config::ResolverConfig;
pub use error::{CacheError, ResolveError, Result};
pub use normalizer::Normalizer;
pub use prompt::{Confirm, StdinConfirm};
pub use resolver::{FullTargetsMap, Phase, ResolveOptions, SourceDirectoryResolver};
pub use scanner::{DirectoryScanner, ScanResult, TargetsMap};
pub use target::presumed_target_root;
pub use tool::{Invocation, ProcessRunner, ToolOutput, ToolRunner, ToolStatus};
