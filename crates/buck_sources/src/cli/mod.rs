//! CLI module for buck-sources
//!
//! Thin wrappers that turn flags into a [`buck_sources::ResolverConfig`] and
//! print results; all resolution logic lives in the library.

pub mod config;
pub mod error;
pub mod normalize;
pub mod resolve;
