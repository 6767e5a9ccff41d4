//! Install script generation.
//!
//! A running executable cannot safely overwrite its own open files, so the
//! actual replacement is delegated to a short-lived script that runs after
//! the launcher exits. The sequence is modelled as a declarative list of
//! deferred OS actions; translating it to the Windows batch dialect happens
//! at a single boundary in [`render_batch`], keeping everything upstream
//! platform-neutral.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, UpdateError};

/// Seconds the script waits for the exiting launcher to release its file
/// handles before touching anything.
const HANDLE_RELEASE_WAIT_SECS: u32 = 2;

/// Values captured from the running process for one install attempt.
///
/// Built fresh every time: the executable path, argv and working directory
/// belong to the current run and must never be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// The downloaded archive to install.
    pub artifact_path: PathBuf,

    /// Directory the application is installed in.
    pub install_root: PathBuf,

    /// Directory the archive is extracted into before the overlay copy.
    pub staging_dir: PathBuf,

    /// Path of the currently running executable.
    pub exe_path: PathBuf,

    /// Arguments the application was originally started with, including
    /// argv[0].
    pub argv: Vec<String>,

    /// Working directory the application was started from.
    pub working_dir: PathBuf,
}

impl InstallRequest {
    /// Captures the current process context for an install attempt.
    ///
    /// The install root is the directory containing the running executable.
    pub fn capture(artifact_path: PathBuf, staging_dir: PathBuf) -> Result<Self> {
        let exe_path = env::current_exe().map_err(|e| {
            UpdateError::Installation(format!("failed to resolve current executable: {e}"))
        })?;
        let install_root = exe_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                UpdateError::Installation(format!(
                    "executable {} has no parent directory",
                    exe_path.display()
                ))
            })?;
        let working_dir = env::current_dir().map_err(|e| {
            UpdateError::Installation(format!("failed to resolve working directory: {e}"))
        })?;

        Ok(Self {
            artifact_path,
            install_root,
            staging_dir,
            exe_path,
            argv: env::args().collect(),
            working_dir,
        })
    }
}

/// One deferred OS action performed by the generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    /// Pause to let the exiting launcher release open file handles.
    Wait {
        /// Seconds to wait.
        seconds: u32,
    },
    /// Kill any process still running the given executable image.
    ///
    /// Matching by image name can hit unrelated processes sharing the name;
    /// the launcher has already been asked to exit when the script runs, so
    /// this only mops up stragglers.
    KillProcess {
        /// Executable image name (e.g. "nimbus-launcher.exe").
        image_name: String,
    },
    /// Extract the downloaded archive into the staging directory.
    ExtractArchive {
        /// The archive to extract.
        archive: PathBuf,
        /// Where the contents land.
        destination: PathBuf,
    },
    /// Recursively overwrite the install root with the staged files.
    CopyTree {
        /// Source tree.
        from: PathBuf,
        /// Destination tree.
        to: PathBuf,
    },
    /// Restart the launcher with its original argv and working directory.
    Relaunch {
        /// Working directory to start in.
        working_dir: PathBuf,
        /// Full argv, including argv[0].
        argv: Vec<String>,
    },
}

/// Builds the deferred action sequence for an install attempt.
///
/// The order is load-bearing: wait, kill, extract, overlay, relaunch.
#[must_use]
pub fn plan(request: &InstallRequest) -> Vec<InstallAction> {
    let image_name = request
        .exe_path
        .file_name()
        .unwrap_or(request.exe_path.as_os_str())
        .to_string_lossy()
        .into_owned();

    vec![
        InstallAction::Wait {
            seconds: HANDLE_RELEASE_WAIT_SECS,
        },
        InstallAction::KillProcess { image_name },
        InstallAction::ExtractArchive {
            archive: request.artifact_path.clone(),
            destination: request.staging_dir.clone(),
        },
        InstallAction::CopyTree {
            from: request.staging_dir.clone(),
            to: request.install_root.clone(),
        },
        InstallAction::Relaunch {
            working_dir: request.working_dir.clone(),
            argv: request.argv.clone(),
        },
    ]
}

/// Renders an action sequence to the Windows batch dialect.
#[must_use]
pub fn render_batch(actions: &[InstallAction]) -> String {
    let mut lines = vec!["@echo off".to_string(), "chcp 65001".to_string()];

    for action in actions {
        lines.push(match action {
            InstallAction::Wait { seconds } => {
                format!("%WinDir%\\System32\\timeout.exe {seconds}")
            }
            InstallAction::KillProcess { image_name } => {
                format!("taskkill /f /im \"{image_name}\"")
            }
            InstallAction::ExtractArchive {
                archive,
                destination,
            } => format!(
                "powershell -Command \"Expand-Archive -Force -Path '{}' -DestinationPath '{}'\"",
                archive.display(),
                destination.display()
            ),
            InstallAction::CopyTree { from, to } => format!(
                "xcopy /E /Y /I \"{}\\*\" \"{}\\\"",
                from.display(),
                to.display()
            ),
            InstallAction::Relaunch { working_dir, argv } => {
                let quoted: Vec<String> = argv.iter().map(|arg| format!("\"{arg}\"")).collect();
                format!(
                    "start /b \"\" /d \"{}\" {}",
                    working_dir.display(),
                    quoted.join(" ")
                )
            }
        });
    }

    lines.join("\r\n")
}

/// Writes the rendered script for `request` to `script_path`.
///
/// Regenerated on every attempt; the script embeds per-run values and is
/// never reused across runs.
pub fn write_script(request: &InstallRequest, script_path: &Path) -> Result<PathBuf> {
    let rendered = render_batch(&plan(request));
    fs::write(script_path, &rendered).map_err(|e| {
        UpdateError::Installation(format!(
            "failed to write install script {}: {e}",
            script_path.display()
        ))
    })?;

    tracing::info!("Install script written to {}", script_path.display());
    Ok(script_path.to_path_buf())
}
