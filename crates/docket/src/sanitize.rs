//! Helpers for keeping data out of tracing span attributes.
//!
//! Source spreadsheets often live in directories named after people or
//! cases, so spans only carry file names.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
