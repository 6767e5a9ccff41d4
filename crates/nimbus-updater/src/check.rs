//! Update availability check against the remote version endpoint.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use crate::fetch::Fetch;
use crate::release::{ReleaseArtifact, ReleaseInfo};
use crate::version::{is_same_version, normalize};

/// Response body of the version endpoint.
#[derive(Debug, Deserialize)]
struct VersionResponse {
    /// The latest release version.
    release: String,
}

/// Queries the remote version endpoint and builds a release descriptor.
pub struct UpdateChecker {
    config: UpdaterConfig,
    fetcher: Arc<dyn Fetch>,
}

impl UpdateChecker {
    /// Creates a checker for the given configuration.
    pub fn new(config: UpdaterConfig, fetcher: Arc<dyn Fetch>) -> Self {
        Self { config, fetcher }
    }

    /// Checks the remote endpoint for the latest release.
    ///
    /// The returned descriptor always names the latest release;
    /// [`ReleaseInfo::has_update`] reports whether it differs from the
    /// running version after both sides are normalized.
    pub async fn check_for_update(&self) -> Result<ReleaseInfo> {
        let url = &self.config.version_endpoint;
        tracing::info!("Fetching latest version from {}", url);

        let response = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| UpdateError::Request {
                url: url.clone(),
                source,
            })?;

        if !response.is_success() {
            return Err(UpdateError::Network {
                url: url.clone(),
                status: response.status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| UpdateError::Request {
                url: url.clone(),
                source,
            })?;

        let parsed: VersionResponse =
            serde_json::from_slice(&body).map_err(|source| UpdateError::InvalidResponse {
                url: url.clone(),
                source,
            })?;

        let latest = normalize(&parsed.release).to_string();
        let has_update = !is_same_version(&self.config.current_version, &latest);

        let release = ReleaseInfo {
            version: format!("v{latest}"),
            summary: format!("New version {latest} is available"),
            published_at: Utc::now(),
            artifacts: vec![ReleaseArtifact {
                name: self.config.artifact_name(&latest),
                url: self.config.artifact_url(&latest),
            }],
            has_update,
            strategy: self.config.platform.strategy(),
        };

        tracing::info!(
            "Current version: {}, latest: {}, has update: {}",
            self.config.current_version,
            latest,
            release.has_update
        );

        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use crate::fetch::testing::StaticFetch;
    use crate::release::UpdateStrategy;

    fn checker(current: &str, platform: Platform, fetcher: StaticFetch) -> UpdateChecker {
        let config = UpdaterConfig::new(current, platform, "/data/nimbus", "/opt/nimbus/resources");
        UpdateChecker::new(config, Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_newer_remote_version() {
        let checker = checker(
            "2.2.9",
            Platform::Windows,
            StaticFetch::ok(br#"{"release": "2.3.0"}"#),
        );

        let release = checker.check_for_update().await.unwrap();
        assert!(release.has_update);
        assert_eq!(release.version, "v2.3.0");
        assert_eq!(release.strategy, UpdateStrategy::Automatic);
        assert_eq!(
            release.primary_artifact().map(|a| a.name.as_str()),
            Some("nimbus-2.3.0-win.zip")
        );
    }

    #[tokio::test]
    async fn test_same_version_with_prefix_mismatch() {
        // Remote reports with a leading "v"; normalization makes the
        // comparison symmetric.
        let checker = checker(
            "1.2.0",
            Platform::Windows,
            StaticFetch::ok(br#"{"release": "v1.2.0"}"#),
        );

        let release = checker.check_for_update().await.unwrap();
        assert!(!release.has_update);
    }

    #[tokio::test]
    async fn test_manual_strategy_off_windows() {
        let checker = checker(
            "2.2.9",
            Platform::Linux,
            StaticFetch::ok(br#"{"release": "2.3.0"}"#),
        );

        let release = checker.check_for_update().await.unwrap();
        assert_eq!(release.strategy, UpdateStrategy::ManualBrowser);
    }

    #[tokio::test]
    async fn test_non_success_response() {
        let checker = checker("2.2.9", Platform::Windows, StaticFetch::status(500));

        let err = checker.check_for_update().await.unwrap_err();
        assert!(matches!(err, UpdateError::Network { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let checker = checker("2.2.9", Platform::Windows, StaticFetch::ok(b"not json"));

        let err = checker.check_for_update().await.unwrap_err();
        assert!(matches!(err, UpdateError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_artifact_url_embeds_version() {
        let checker = checker(
            "2.2.9",
            Platform::Windows,
            StaticFetch::ok(br#"{"release": "v2.3.0"}"#),
        );

        let release = checker.check_for_update().await.unwrap();
        let artifact = release.primary_artifact().unwrap();
        assert!(artifact.url.ends_with("/v2.3.0/nimbus-2.3.0-win.zip"));
    }
}
