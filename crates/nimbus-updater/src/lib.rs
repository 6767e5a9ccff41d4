//! Self-update subsystem for Nimbus Launcher.
//!
//! This crate covers the full update path of the launcher: checking a remote
//! version endpoint for a newer release, streaming the release artifact to
//! disk with progress and cooperative cancellation, and handing the actual
//! file replacement to a detached installer process that runs after the
//! launcher exits.
//!
//! # Architecture
//!
//! The pieces compose leaf-first:
//!
//! - [`UpdateChecker`] queries the version endpoint and produces an immutable
//!   [`ReleaseInfo`] descriptor.
//! - [`DownloadTask`] streams the artifact to the well-known pending path,
//!   publishing [`DownloadState`] through a watch subscription.
//! - [`InstallOrchestrator`] validates the artifact, provisions the elevation
//!   helper when needed, generates the install script, spawns it detached,
//!   and asks the host to exit — in that order, and never the exit without a
//!   confirmed spawn.
//!
//! The host application supplies its process-level capabilities through the
//! [`HostControl`] and [`Fetch`] seams; nothing in here owns a task
//! scheduler, a UI, or a logging subscriber.
//!
//! A running executable cannot overwrite its own open files, so the install
//! script waits for the launcher to exit, kills stragglers, extracts the
//! archive, overlays the install root and relaunches — see [`script`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use nimbus_updater::{
//!     DownloadTask, HttpFetcher, InstallOrchestrator, Platform, SystemHost, UpdateChecker,
//!     UpdaterConfig,
//! };
//!
//! async fn update_flow() -> nimbus_updater::Result<()> {
//!     let config = UpdaterConfig::new(
//!         "2.2.9",
//!         Platform::current(),
//!         "/data/nimbus",
//!         "/opt/nimbus/resources",
//!     );
//!     let fetcher = Arc::new(HttpFetcher::new());
//!
//!     let checker = UpdateChecker::new(config.clone(), fetcher.clone());
//!     let release = checker.check_for_update().await?;
//!     if !release.has_update {
//!         return Ok(());
//!     }
//!
//!     if let Some(artifact) = release.primary_artifact() {
//!         let task = DownloadTask::new(
//!             fetcher,
//!             artifact.url.clone(),
//!             config.pending_artifact_path(),
//!         );
//!         // task.cancel() from another handle aborts this cooperatively.
//!         task.start().await?;
//!     }
//!
//!     InstallOrchestrator::new(config, Arc::new(SystemHost)).install_and_restart(&release)
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod config;
pub mod download;
pub mod elevate;
pub mod error;
pub mod fetch;
pub mod host;
pub mod install;
pub mod release;
pub mod script;
pub mod version;

pub use check::UpdateChecker;
pub use config::{Platform, UpdaterConfig};
pub use download::{DownloadOutcome, DownloadState, DownloadTask};
pub use error::{Result, UpdateError};
pub use fetch::{Fetch, FetchResponse, HttpFetcher};
pub use host::{HostControl, SystemHost};
pub use install::InstallOrchestrator;
pub use release::{ReleaseArtifact, ReleaseInfo, UpdateStrategy};
