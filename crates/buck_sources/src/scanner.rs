//! Link-tree discovery under buck-out
//!
//! Classifies each target as built or not by looking at what is already on
//! disk. Never invokes buck.

use crate::target::target_path_stem;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Link-tree variants that hold tooling, not importable sources.
pub const NON_SOURCE_SUFFIXES: [&str; 3] = [
    "-vs_debugger#link-tree",
    "-interp#link-tree",
    "-ipython#link-tree",
];

/// Target -> expected output glob.
///
/// `None`: output unknown. `Some("")`: built, no distinct output location.
pub type TargetsMap = IndexMap<String, Option<String>>;

/// Outcome of one scan, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub directories: Vec<PathBuf>,
    /// In map order; each target at most once since map keys are unique.
    pub not_found: Vec<String>,
}

/// Scans `<project_root>/<buck_out_gen>` for link-trees.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    project_root: PathBuf,
    gen_root: PathBuf,
}

impl DirectoryScanner {
    pub fn new(project_root: impl Into<PathBuf>, buck_out_gen: impl AsRef<Path>) -> Self {
        let project_root = project_root.into();
        let buck_out_gen = buck_out_gen.as_ref();
        let gen_root = if buck_out_gen.is_absolute() {
            buck_out_gen.to_path_buf()
        } else {
            project_root.join(buck_out_gen)
        };
        Self {
            project_root,
            gen_root,
        }
    }

    pub fn find_source_directories(&self, targets: &TargetsMap) -> ScanResult {
        let mut result = ScanResult::default();

        for (target, destination) in targets {
            let discovered = self.link_trees_for(target);
            let built = match destination.as_deref() {
                None => false,
                Some("") => true,
                Some(pattern) => self.output_exists(pattern),
            };

            if !built && discovered.is_empty() {
                debug!("No link-tree or output found for {}", target);
                result.not_found.push(target.clone());
            }

            result
                .directories
                .extend(discovered.into_iter().filter(|tree| is_source_tree(tree)));
        }

        result
    }

    fn link_trees_for(&self, target: &str) -> Vec<PathBuf> {
        let pattern = format!(
            "{}/{}#*link-tree",
            glob::Pattern::escape(&self.gen_root.to_string_lossy()),
            glob::Pattern::escape(&target_path_stem(target)),
        );
        glob_paths(&pattern)
    }

    fn output_exists(&self, pattern: &str) -> bool {
        let pattern = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            format!(
                "{}/{}",
                glob::Pattern::escape(&self.project_root.to_string_lossy()),
                pattern
            )
        };
        !glob_paths(&pattern).is_empty()
    }
}

/// False for the debugger / interpreter / notebook link-tree variants.
pub fn is_source_tree(path: &Path) -> bool {
    let name = path.to_string_lossy();
    !NON_SOURCE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn glob_paths(pattern: &str) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("Skipping unreadable glob entry: {}", e);
                    None
                }
            })
            .collect(),
        Err(e) => {
            debug!("Invalid glob pattern {:?}: {}", pattern, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_tree(root: &Path, relative: &str) -> PathBuf {
        let path = root.join("buck-out/gen").join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn targets(entries: &[(&str, Option<&str>)]) -> TargetsMap {
        entries
            .iter()
            .map(|(t, d)| (t.to_string(), d.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_finds_link_tree_for_target() {
        let root = TempDir::new().unwrap();
        let tree = make_tree(root.path(), "a/b/c#link-tree");
        let scanner = DirectoryScanner::new(root.path(), "buck-out/gen");

        let result = scanner.find_source_directories(&targets(&[("//a/b:c", None)]));

        assert_eq!(result.directories, vec![tree]);
        assert!(result.not_found.is_empty());
    }

    #[test]
    fn test_filters_non_source_trees() {
        let root = TempDir::new().unwrap();
        let keep = make_tree(root.path(), "a/b/c#binary,link-tree");
        make_tree(root.path(), "a/b/c#c-vs_debugger#link-tree");
        make_tree(root.path(), "a/b/c#c-interp#link-tree");
        make_tree(root.path(), "a/b/c#c-ipython#link-tree");
        let scanner = DirectoryScanner::new(root.path(), "buck-out/gen");

        let result = scanner.find_source_directories(&targets(&[("//a/b:c", None)]));

        assert_eq!(result.directories, vec![keep]);
        assert!(result.not_found.is_empty());
    }

    #[test]
    fn test_only_non_source_trees_still_counts_as_found() {
        let root = TempDir::new().unwrap();
        make_tree(root.path(), "a/b/c#c-interp#link-tree");
        let scanner = DirectoryScanner::new(root.path(), "buck-out/gen");

        let result = scanner.find_source_directories(&targets(&[("//a/b:c", None)]));

        assert!(result.directories.is_empty());
        assert!(result.not_found.is_empty());
    }

    #[test]
    fn test_missing_targets_keep_order() {
        let root = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(root.path(), "buck-out/gen");
        let mut map = TargetsMap::new();
        map.insert("//z:z".to_string(), None);
        map.insert("//a:a".to_string(), None);

        let result = scanner.find_source_directories(&map);

        assert_eq!(result.not_found, vec!["//z:z", "//a:a"]);
    }

    #[test]
    fn test_empty_output_counts_as_built() {
        let root = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(root.path(), "buck-out/gen");

        let result = scanner.find_source_directories(&targets(&[("//x:lib", Some(""))]));

        assert!(result.not_found.is_empty());
        assert!(result.directories.is_empty());
    }

    #[test]
    fn test_existing_output_counts_as_built() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("buck-out/gen/x/bin.par");
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(&out, b"").unwrap();
        let scanner = DirectoryScanner::new(root.path(), "buck-out/gen");

        let result = scanner.find_source_directories(&targets(&[
            ("//x:bin", Some("buck-out/gen/x/bin.par")),
            ("//x:gone", Some("buck-out/gen/x/gone.par")),
        ]));

        assert_eq!(result.not_found, vec!["//x:gone"]);
    }

    #[test]
    fn test_is_source_tree() {
        assert!(is_source_tree(Path::new("buck-out/gen/a#link-tree")));
        assert!(!is_source_tree(Path::new("buck-out/gen/a#a-ipython#link-tree")));
    }
}
