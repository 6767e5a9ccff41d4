//! Release metadata produced by the update check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an update is applied on a given platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Scripted in-place replacement of the install tree, followed by a
    /// relaunch. Only supported on Windows.
    Automatic,
    /// Send the user to the release page in their browser; no file
    /// replacement is attempted.
    ManualBrowser,
}

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    /// The artifact file name (e.g., "nimbus-2.3.0-win.zip").
    pub name: String,

    /// Direct download URL for this artifact.
    pub url: String,
}

/// Metadata describing the latest known release.
///
/// Produced once per check by [`UpdateChecker`](crate::check::UpdateChecker)
/// and treated as immutable by everything downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// The release version tag (e.g., "v2.3.0").
    pub version: String,

    /// Human-readable summary of the release.
    pub summary: String,

    /// When the release was seen by the checker.
    pub published_at: DateTime<Utc>,

    /// Downloadable artifacts, most relevant first.
    pub artifacts: Vec<ReleaseArtifact>,

    /// Whether the remote version differs from the running version.
    pub has_update: bool,

    /// The update strategy for the configured platform.
    pub strategy: UpdateStrategy,
}

impl ReleaseInfo {
    /// Returns the artifact to download for this platform, if any.
    #[must_use]
    pub fn primary_artifact(&self) -> Option<&ReleaseArtifact> {
        self.artifacts.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_artifact() {
        let release = ReleaseInfo {
            version: "v2.3.0".to_string(),
            summary: "New version 2.3.0 is available".to_string(),
            published_at: Utc::now(),
            artifacts: vec![ReleaseArtifact {
                name: "nimbus-2.3.0-win.zip".to_string(),
                url: "https://example.com/nimbus-2.3.0-win.zip".to_string(),
            }],
            has_update: true,
            strategy: UpdateStrategy::Automatic,
        };

        assert_eq!(
            release.primary_artifact().map(|a| a.name.as_str()),
            Some("nimbus-2.3.0-win.zip")
        );
    }

    #[test]
    fn test_strategy_serializes_snake_case() {
        let json = serde_json::to_string(&UpdateStrategy::ManualBrowser).unwrap();
        assert_eq!(json, "\"manual_browser\"");
    }
}
