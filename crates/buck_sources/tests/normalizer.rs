//! Normalizer and builder behavior against a scripted buck.

use buck_sources::{Builder, Normalizer, ResolveError, ToolOutput, ToolStatus};
use buck_sources_test_utils::{FakeBuck, MemoryCacheStore};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(200);

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// NORMALIZER
// =============================================================================

#[test]
fn test_cache_round_trip_skips_buck() {
    let buck = FakeBuck::new().on_query_lines(&["//t:bin buck-out/gen/t/bin.par"]);
    let mut cache = MemoryCacheStore::default();
    let targets = strings(&["//t/..."]);

    let first = Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&targets, true)
        .unwrap();
    let second = Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&targets, true)
        .unwrap();

    assert_eq!(first, vec!["//t:bin buck-out/gen/t/bin.par"]);
    assert_eq!(second, first);
    assert_eq!(buck.query_count(), 1, "second call must be served from cache");
    assert_eq!(cache.flushes(), 1);
}

#[test]
fn test_cache_ignored_without_use_cache() {
    let buck = FakeBuck::new().on_query_lines(&["//t:new out/new"]);
    let mut cache = MemoryCacheStore::default().with_entry("//t/...", &["//t:old out/old"]);

    let lines = Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&strings(&["//t/..."]), false)
        .unwrap();

    assert_eq!(lines, vec!["//t:new out/new"]);
    assert_eq!(buck.query_count(), 1);
    // The fresh answer replaces the stale one.
    assert_eq!(cache.entry("//t/...").unwrap(), &vec!["//t:new out/new".to_string()]);
}

#[test]
fn test_cache_key_is_order_sensitive() {
    let buck = FakeBuck::new().on_query_lines(&["//a:a", "//b:b"]);
    let mut cache = MemoryCacheStore::default().with_entry("//a:a,//b:b", &["//a:a", "//b:b"]);

    Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&strings(&["//b:b", "//a:a"]), true)
        .unwrap();

    assert_eq!(buck.query_count(), 1);
    assert!(cache.entry("//b:b,//a:a").is_some());
}

#[test]
fn test_query_invocation_and_timeout() {
    let buck = FakeBuck::new().on_query_lines(&["//t:bin out"]);
    let mut cache = MemoryCacheStore::default();

    Normalizer::new(&buck, &mut cache, Duration::from_secs(7))
        .normalize(&strings(&["//t:bin"]), false)
        .unwrap();

    let invocations = buck.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(
        invocations[0].args,
        strings(&[
            "targets",
            "--show-output",
            "//t:bin",
            "--type",
            "python_binary",
            "python_test"
        ])
    );
    assert_eq!(invocations[0].timeout, Some(Duration::from_secs(7)));
}

#[test]
fn test_zero_lines_is_empty_not_error() {
    let buck = FakeBuck::new().on_query(ToolOutput::success("\n"));
    let mut cache = MemoryCacheStore::default();

    let lines = Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&strings(&["//empty/..."]), false)
        .unwrap();

    assert!(lines.is_empty());
    assert!(cache.entry("//empty/...").is_none());
    assert_eq!(cache.flushes(), 0);
}

#[test]
fn test_flush_failure_is_swallowed() {
    let buck = FakeBuck::new().on_query_lines(&["//t:bin out"]);
    let mut cache = MemoryCacheStore::default().failing_flush();

    let lines = Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&strings(&["//t:bin"]), false)
        .unwrap();

    assert_eq!(lines, vec!["//t:bin out"]);
    assert_eq!(cache.flushes(), 1);
}

#[test]
fn test_timeout_is_hung_error() {
    let buck = FakeBuck::new().on_query(ToolOutput::timed_out());
    let mut cache = MemoryCacheStore::default();

    let err = Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&strings(&["//slow:target"]), false)
        .unwrap_err();

    match &err {
        ResolveError::BuildToolHung { command } => {
            assert_eq!(
                command,
                "buck targets --show-output //slow:target --type python_binary python_test"
            );
        }
        other => panic!("expected BuildToolHung, got {other:?}"),
    }
    assert!(err.to_string().contains("buck clean"));
}

#[test]
fn test_nonzero_exit_is_query_failed() {
    let buck = FakeBuck::new().on_query(ToolOutput::failed(1, "No build file at //nope\n"));
    let mut cache = MemoryCacheStore::default();

    let err = Normalizer::new(&buck, &mut cache, TIMEOUT)
        .normalize(&strings(&["//nope:x"]), false)
        .unwrap_err();

    match err {
        ResolveError::BuildToolQueryFailed { diagnostics } => {
            assert_eq!(diagnostics, "No build file at //nope");
        }
        other => panic!("expected BuildToolQueryFailed, got {other:?}"),
    }
    assert!(cache.entry("//nope:x").is_none());
}

// =============================================================================
// BUILDER
// =============================================================================

#[test]
fn test_build_runs_without_timeout() {
    let buck = FakeBuck::new();

    Builder::new(&buck, 20)
        .build(&strings(&["//a:one", "//a:two"]))
        .unwrap();

    let invocations = buck.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].args, strings(&["build", "//a:one", "//a:two"]));
    assert_eq!(invocations[0].timeout, None);
}

#[test]
fn test_build_failure_keeps_last_twenty_lines() {
    let stderr: String = (1..=100).map(|i| format!("stderr line {i}\n")).collect();
    let buck = FakeBuck::new().on_build(ToolOutput {
        stdout: String::new(),
        stderr,
        status: ToolStatus::Failed { code: Some(1) },
    });

    let err = Builder::new(&buck, 20)
        .build(&strings(&["//a:b"]))
        .unwrap_err();

    let ResolveError::BuildToolBuildFailed { diagnostics } = &err else {
        panic!("expected BuildToolBuildFailed, got {err:?}");
    };
    let expected: Vec<String> = (81..=100).map(|i| format!("stderr line {i}")).collect();
    assert_eq!(diagnostics.lines().collect::<Vec<_>>(), expected);

    let message = err.to_string();
    assert!(message.contains("stderr line 81"));
    assert!(message.contains("stderr line 100"));
    assert!(!message.contains("stderr line 80\n"));
    assert!(!message.contains("stderr line 1\n"));
}
