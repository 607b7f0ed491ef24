//! In-memory cache store and scripted operator.

use buck_sources::{CacheError, CacheStore, Confirm};
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::io;

/// Cache that lives only as long as the test.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: HashMap<String, Vec<String>>,
    fail_flush: bool,
    loads: usize,
    flushes: Cell<usize>,
}

impl MemoryCacheStore {
    pub fn with_entry(mut self, key: &str, lines: &[&str]) -> Self {
        self.entries
            .insert(key.to_string(), lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Every flush fails, as if the cache directory were read-only.
    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    pub fn entry(&self, key: &str) -> Option<&Vec<String>> {
        self.entries.get(key)
    }

    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn flushes(&self) -> usize {
        self.flushes.get()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&mut self) {
        self.loads += 1;
    }

    fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn put(&mut self, key: String, lines: Vec<String>) {
        self.entries.insert(key, lines);
    }

    fn flush(&self) -> Result<(), CacheError> {
        self.flushes.set(self.flushes.get() + 1);
        if self.fail_flush {
            return Err(CacheError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only cache",
            )));
        }
        Ok(())
    }
}

/// Operator with canned answers. Records every question asked; answers
/// "no" once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }

    /// For flows that must not prompt; check [`Self::asked`] afterwards.
    pub fn never_asked() -> Self {
        Self::default()
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
