//! Temp-file helpers for tests.

use std::io::Write;

/// Writes `contents` to a named temp file with the given suffix
/// (e.g. `".yaml"`). The file is removed when the handle is dropped.
pub fn write_temp_file(contents: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("preview_test_")
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temporary file");
    file.write_all(contents)
        .expect("Failed to write temporary file");
    file.flush().expect("Failed to flush temporary file");
    file
}
