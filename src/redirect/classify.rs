//! Static asset versus page classification.

/// A path names a static asset when it contains a `.` anywhere and does
/// not end in `.html`. Extensionless paths and `.html` pages are pages.
///
/// The test runs on the raw (still percent-encoded) path, so `%2E` does
/// not count as a dot.
#[must_use]
pub fn is_static_asset(path: &str) -> bool {
    path.contains('.') && !path.ends_with(".html")
}
