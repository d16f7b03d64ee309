use std::path::Path;

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected to find '{needle}' in output, got: {haystack}"
    );
}

pub fn assert_path_exists(path: &Path) {
    assert!(path.exists(), "Expected path to exist: {}", path.display());
}

pub fn assert_empty_file(path: &Path) {
    let len = std::fs::metadata(path)
        .unwrap_or_else(|e| panic!("Expected file {}: {e}", path.display()))
        .len();
    assert_eq!(len, 0, "Expected {} to be empty", path.display());
}
