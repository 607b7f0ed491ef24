//! Normalization cache
//!
//! Maps the comma-joined list of unresolved targets to the raw lines
//! `buck targets --show-output` printed for them. The cache is an
//! optimization only: nothing here is allowed to fail a resolution.

use crate::error::CacheError;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Query key for a target list. Order-sensitive on purpose: `a,b` and `b,a`
/// are different entries.
pub fn cache_key(targets: &[String]) -> String {
    targets.join(",")
}

/// Storage backend for normalization results.
pub trait CacheStore {
    /// Refresh from the backing store. A missing or unreadable store leaves
    /// the cache empty.
    fn load(&mut self);

    fn get(&self, key: &str) -> Option<&[String]>;

    fn put(&mut self, key: String, lines: Vec<String>);

    /// Persist every entry, replacing whatever the store held before.
    fn flush(&self) -> Result<(), CacheError>;
}

/// JSON object on disk: `{"<key>": ["<target> <output>", ...]}`.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
    entries: BTreeMap<String, Vec<String>>,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }
}

impl CacheStore for FileCacheStore {
    fn load(&mut self) {
        self.entries = match read_entries(&self.path) {
            Ok(entries) => entries,
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No target cache at {}", self.path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable target cache {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
        };
    }

    fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn put(&mut self, key: String, lines: Vec<String>) {
        self.entries.insert(key, lines);
    }

    fn flush(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, Vec<String>>, CacheError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
