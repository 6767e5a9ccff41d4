//! Updater configuration.
//!
//! Everything the subsystem needs to know about its environment is carried
//! in an explicit [`UpdaterConfig`] value handed to the checker and the
//! orchestrator at construction. There are no ambient platform or version
//! singletons, which keeps simulated-platform tests deterministic.

use std::path::PathBuf;

use crate::release::UpdateStrategy;

/// Default version endpoint queried by the update check.
pub const VERSION_ENDPOINT: &str = "https://api.nimbuslauncher.app/launcher/version";

/// Release page shown to users on platforms without automatic updates.
pub const RELEASE_PAGE_URL: &str = "https://github.com/nimbus-launcher/launcher/releases";

/// Base URL under which release artifacts are published.
pub const DOWNLOAD_BASE_URL: &str =
    "https://github.com/nimbus-launcher/launcher/releases/download";

/// File name of the downloaded artifact awaiting installation.
pub const PENDING_UPDATE_FILE: &str = "pending_update.zip";

/// Host platform the updater is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows.
    Windows,
    /// macOS.
    MacOs,
    /// Linux and everything else.
    Linux,
}

impl Platform {
    /// Detects the platform of the running process.
    #[must_use]
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            _ => Self::Linux,
        }
    }

    /// The update strategy this platform supports.
    ///
    /// Only Windows supports scripted in-place self-replacement; everywhere
    /// else the user is sent to the release page.
    #[must_use]
    pub fn strategy(self) -> UpdateStrategy {
        match self {
            Self::Windows => UpdateStrategy::Automatic,
            Self::MacOs | Self::Linux => UpdateStrategy::ManualBrowser,
        }
    }
}

/// Explicit configuration for the update subsystem.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Short application name used in artifact file names.
    pub app_name: String,

    /// Version of the running application.
    pub current_version: String,

    /// Platform the application is running on.
    pub platform: Platform,

    /// Endpoint reporting the latest release version.
    pub version_endpoint: String,

    /// Release page for manual downloads.
    pub release_page_url: String,

    /// Base URL for release artifact downloads.
    pub download_base_url: String,

    /// Application data directory; downloads, the install script and the
    /// elevation helper all live here.
    pub data_dir: PathBuf,

    /// Directory holding bundled resources shipped with the application.
    pub resources_dir: PathBuf,

    /// Whether the application runs in a development environment. Updates
    /// are never installed in dev mode.
    pub dev_mode: bool,

    /// Whether the install script must run with elevated privileges.
    pub requires_elevation: bool,
}

impl UpdaterConfig {
    /// Creates a production configuration for the given environment.
    pub fn new(
        current_version: impl Into<String>,
        platform: Platform,
        data_dir: impl Into<PathBuf>,
        resources_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            app_name: "nimbus".to_string(),
            current_version: current_version.into(),
            platform,
            version_endpoint: VERSION_ENDPOINT.to_string(),
            release_page_url: RELEASE_PAGE_URL.to_string(),
            download_base_url: DOWNLOAD_BASE_URL.to_string(),
            data_dir: data_dir.into(),
            resources_dir: resources_dir.into(),
            dev_mode: false,
            requires_elevation: platform == Platform::Windows,
        }
    }

    /// Well-known path of the downloaded artifact awaiting installation.
    ///
    /// Overwritten by each new download; a single pending update per
    /// application instance.
    #[must_use]
    pub fn pending_artifact_path(&self) -> PathBuf {
        self.data_dir.join(PENDING_UPDATE_FILE)
    }

    /// Staging directory the install script extracts the archive into.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir.join("update_extracted")
    }

    /// Path of the generated install script.
    #[must_use]
    pub fn script_path(&self) -> PathBuf {
        self.data_dir.join("AutoUpdate.bat")
    }

    /// Artifact file name for a normalized version.
    #[must_use]
    pub fn artifact_name(&self, version: &str) -> String {
        format!("{}-{}-win.zip", self.app_name, version)
    }

    /// Download URL for a normalized version.
    #[must_use]
    pub fn artifact_url(&self, version: &str) -> String {
        format!(
            "{}/v{}/{}",
            self.download_base_url,
            version,
            self.artifact_name(version)
        )
    }
}
