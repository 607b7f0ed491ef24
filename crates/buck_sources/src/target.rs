//! Target identifier helpers
//!
//! Pure string transforms, no I/O.

/// Recursive wildcard suffix, as in `//foo/...`.
pub const WILDCARD_SUFFIX: &str = "/...";

/// Prefix used to match expanded targets back to the pattern that produced them.
///
/// Leading slashes are stripped, `/...` wildcards removed and anything from
/// the first `:` on is dropped, so `//a/b:c` and `//a/b/...:c` both map to
/// `a/b`.
pub fn presumed_target_root(target: &str) -> String {
    let mut root = target.trim_start_matches('/').to_string();
    // Removing one wildcard can splice together another (`a//......`).
    while root.contains(WILDCARD_SUFFIX) {
        root = root.replace(WILDCARD_SUFFIX, "");
    }
    if let Some(end) = root.find(':') {
        root.truncate(end);
    }
    root
}

/// Path of a target below the generated-output root: `//a/b:c` -> `a/b/c`.
pub fn target_path_stem(target: &str) -> String {
    target.strip_prefix("//").unwrap_or(target).replace(':', "/")
}

/// Split one `buck targets --show-output` line into (target, output).
///
/// Targets without a distinct output are printed without a second field and
/// map to an empty output.
pub fn split_output_line(line: &str) -> (String, String) {
    match line.split_once(' ') {
        Some((target, rest)) => {
            let output = rest.split(' ').next().unwrap_or_default();
            (target.to_string(), output.to_string())
        }
        None => (line.to_string(), String::new()),
    }
}
