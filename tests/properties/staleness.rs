//! Property tests for the up-to-date check.

use std::fs::File;
use std::time::{Duration, SystemTime};

use proptest::prelude::*;
use tempfile::tempdir;

use livebuild::fs::is_up_to_date;

fn touch(path: &std::path::Path, at: SystemTime) {
    let file = File::create(path).unwrap();
    file.set_modified(at).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: A compiled file is up to date exactly when it is not older
    /// than its source.
    #[test]
    fn property_up_to_date_follows_mtimes(source_secs in 0u64..10_000, compiled_secs in 0u64..10_000) {
        let dir = tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let source = dir.path().join("a.coffee");
        let compiled = dir.path().join("a.js");
        touch(&source, base + Duration::from_secs(source_secs));
        touch(&compiled, base + Duration::from_secs(compiled_secs));

        prop_assert_eq!(is_up_to_date(&compiled, &source), compiled_secs >= source_secs);
    }

    /// PROPERTY: Touching the source later always makes the compiled file stale.
    #[test]
    fn property_newer_source_is_stale(gap in 1u64..10_000) {
        let dir = tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let source = dir.path().join("a.sass");
        let compiled = dir.path().join("a.css");
        touch(&compiled, base);
        touch(&source, base + Duration::from_secs(gap));

        prop_assert!(!is_up_to_date(&compiled, &source));
        prop_assert!(is_up_to_date(&source, &compiled));
    }
}

#[test]
fn missing_compiled_file_is_stale() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a.haml");
    std::fs::write(&source, "%p").unwrap();
    assert!(!is_up_to_date(&dir.path().join("a.html"), &source));
}
