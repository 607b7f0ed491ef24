//! Temporary project root with a `buck-out/gen` tree.

use buck_sources::{CacheStore, Confirm, ResolverConfig, SourceDirectoryResolver, ToolRunner};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct BuckOutFixture {
    root: TempDir,
}

impl BuckOutFixture {
    /// Panics if a temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create temp project root"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// `<root>/buck-out/gen/<relative>`, not created.
    pub fn gen_path(&self, relative: &str) -> PathBuf {
        gen_path(self.root(), relative)
    }

    /// Create a link-tree directory below `buck-out/gen`.
    pub fn link_tree(&self, relative: &str) -> PathBuf {
        create_link_tree(self.root(), relative)
    }

    /// Create an empty output file below `buck-out/gen`.
    pub fn output_file(&self, relative: &str) -> PathBuf {
        let path = self.gen_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create output parent");
        }
        fs::write(&path, b"").expect("write output file");
        path
    }

    pub fn config(&self) -> ResolverConfig {
        ResolverConfig::for_project(self.root())
    }

    pub fn resolver<'a>(
        &self,
        runner: &'a dyn ToolRunner,
        cache: &'a mut dyn CacheStore,
        confirm: &'a mut dyn Confirm,
    ) -> SourceDirectoryResolver<'a> {
        SourceDirectoryResolver::new(self.config(), runner, cache, confirm)
    }
}

impl Default for BuckOutFixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn gen_path(root: &Path, relative: &str) -> PathBuf {
    root.join("buck-out/gen").join(relative)
}

/// Standalone form of [`BuckOutFixture::link_tree`], usable from build
/// effects that only captured the root path.
pub fn create_link_tree(root: &Path, relative: &str) -> PathBuf {
    let path = gen_path(root, relative);
    fs::create_dir_all(&path).expect("create link-tree");
    path
}
