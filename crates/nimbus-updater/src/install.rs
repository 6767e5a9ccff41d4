//! Install orchestration.
//!
//! Coordinates the final stretch of an update: validate the downloaded
//! artifact, obtain elevation when needed, generate the install script,
//! hand it to a detached process, and only then ask the host to exit. The
//! host never terminates unless the detached installer was confirmed
//! spawned, so a failed attempt leaves the running application intact.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::UpdaterConfig;
use crate::elevate::ensure_elevation_helper;
use crate::error::{Result, UpdateError};
use crate::host::HostControl;
use crate::release::{ReleaseInfo, UpdateStrategy};
use crate::script::{self, InstallRequest};

/// Top-level coordinator for applying a downloaded update.
pub struct InstallOrchestrator {
    config: UpdaterConfig,
    host: Arc<dyn HostControl>,
}

impl InstallOrchestrator {
    /// Creates an orchestrator for the given configuration.
    pub fn new(config: UpdaterConfig, host: Arc<dyn HostControl>) -> Self {
        Self { config, host }
    }

    /// Installs the pending update and restarts the application.
    ///
    /// On the automatic strategy this spawns a detached installer process
    /// and requests host termination; on the manual strategy it opens the
    /// release page instead. Any failure before the spawn aborts the whole
    /// attempt and surfaces to the caller.
    pub fn install_and_restart(&self, release: &ReleaseInfo) -> Result<()> {
        if self.config.dev_mode {
            tracing::info!("Development environment, skipping update installation");
            return Ok(());
        }

        if release.strategy == UpdateStrategy::ManualBrowser {
            tracing::info!(
                "No automatic updater on this platform, opening {}",
                self.config.release_page_url
            );
            return self.host.open_external(&self.config.release_page_url);
        }

        let artifact_path = self.config.pending_artifact_path();
        if !artifact_path.exists() {
            return Err(UpdateError::MissingArtifact(artifact_path));
        }

        tracing::info!("Installing update from {}", artifact_path.display());

        let (program, script_args) = if self.config.requires_elevation {
            let elevate =
                ensure_elevation_helper(&self.config.resources_dir, &self.config.data_dir)?;
            (elevate, Vec::new())
        } else {
            (PathBuf::from("cmd.exe"), vec!["/c".to_string()])
        };

        let request = InstallRequest::capture(artifact_path, self.config.staging_dir())?;
        let script_path = script::write_script(&request, &self.config.script_path())?;

        let mut args = script_args;
        args.push(script_path.display().to_string());

        tracing::info!("Spawning installer: {} {}", program.display(), args.join(" "));
        self.host
            .spawn_detached(&program, &args, &self.config.data_dir)?;

        // Spawn is acknowledged; only now may the host go away.
        self.host.request_exit();
        Ok(())
    }
}
