//! Host-process capabilities consumed by the orchestrator.
//!
//! The orchestrator is written against this seam so its sequencing rules
//! (spawn before exit, no exit on failure) can be exercised with recording
//! fakes instead of real processes.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Result, UpdateError};

/// Process-level capabilities of the host application.
pub trait HostControl: Send + Sync {
    /// Spawns `program` with `args` as a detached process.
    ///
    /// The child gets disconnected standard streams and survives host
    /// termination. Returning `Ok` means the spawn was acknowledged; only
    /// then may the host be asked to exit.
    fn spawn_detached(&self, program: &Path, args: &[String], working_dir: &Path) -> Result<()>;

    /// Opens a URL in the user's default browser.
    fn open_external(&self, url: &str) -> Result<()>;

    /// Asks the host application to terminate.
    fn request_exit(&self);
}

/// Production implementation backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostControl for SystemHost {
    fn spawn_detached(&self, program: &Path, args: &[String], working_dir: &Path) -> Result<()> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            // DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP
            command.creation_flags(0x0000_0008 | 0x0000_0200);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|e| {
            UpdateError::Installation(format!("failed to spawn {}: {e}", program.display()))
        })?;

        // Fire-and-forget: dropping the handle without waiting lets the
        // child outlive the host.
        drop(child);
        Ok(())
    }

    fn open_external(&self, url: &str) -> Result<()> {
        tracing::info!("Opening {} in the default browser", url);

        #[cfg(target_os = "windows")]
        let mut command = {
            let mut command = Command::new("cmd");
            command.args(["/c", "start", "", url]);
            command
        };
        #[cfg(target_os = "macos")]
        let mut command = {
            let mut command = Command::new("open");
            command.arg(url);
            command
        };
        #[cfg(all(unix, not(target_os = "macos")))]
        let mut command = {
            let mut command = Command::new("xdg-open");
            command.arg(url);
            command
        };

        command
            .spawn()
            .map(|_| ())
            .map_err(|e| UpdateError::Installation(format!("failed to open {url}: {e}")))
    }

    fn request_exit(&self) {
        tracing::info!("Host exit requested");
        std::process::exit(0);
    }
}
