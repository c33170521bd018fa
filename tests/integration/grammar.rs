//! Grammar load check at the assertion boundary
//!
//! Failures keep their cause until here, where they collapse into the one
//! fixed message. The cause itself is logged by `load`.

use std::io::Write;

use sand::grammar::{GrammarError, GrammarSource, LOAD_FAILURE, load};

fn assert_loads(source: GrammarSource) -> Result<usize, String> {
    load(source)
        .map(|grammar| grammar.abi_version())
        .map_err(|_| LOAD_FAILURE.to_string())
}

#[test]
fn test_valid_handle_loads() {
    let version = assert_loads(GrammarSource::Compiled(tree_sitter_json::LANGUAGE));
    assert!(version.is_ok(), "{LOAD_FAILURE}");
}

#[test]
fn test_every_failure_reports_the_same_message() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("libsand.so");
    let garbage = dir.path().join("garbage.so");
    std::fs::File::create(&garbage)
        .unwrap()
        .write_all(b"\x7fELF but not really")
        .unwrap();

    for path in [missing, garbage] {
        let message = assert_loads(GrammarSource::library(&path)).unwrap_err();
        assert_eq!(message, "Error loading Sand grammar");
    }
}

#[test]
fn test_causes_stay_distinct_before_the_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(GrammarSource::library(dir.path().join("libsand.so"))).unwrap_err();
    assert!(matches!(err, GrammarError::NotFound(_)));

    let err = sand::grammar::check_version(usize::MAX).unwrap_err();
    assert!(matches!(
        err,
        GrammarError::IncompatibleVersion { found: usize::MAX, .. }
    ));
}
