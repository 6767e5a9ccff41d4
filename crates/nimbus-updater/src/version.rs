//! Version string normalization.
//!
//! Release tags may or may not carry a leading `v` depending on where they
//! came from; both sides of a comparison are normalized before equality is
//! checked.

/// Strips an optional leading `v` from a version string.
#[must_use]
pub fn normalize(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Returns whether two version strings name the same release.
#[must_use]
pub fn is_same_version(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
