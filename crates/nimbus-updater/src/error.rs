//! Error types for the self-update subsystem.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during the update process.
///
/// A cancelled download is deliberately not represented here: cancellation is
/// a normal outcome reported through
/// [`DownloadOutcome`](crate::download::DownloadOutcome), never an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpdateError {
    /// An update endpoint answered with a non-success status.
    #[error("{url} returned status {status}")]
    Network {
        /// The URL that was queried.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },

    /// The request could not be completed at the transport level.
    #[error("request to {url} failed: {source}")]
    Request {
        /// The URL that was queried.
        url: String,
        /// The underlying transport error.
        source: io::Error,
    },

    /// The version endpoint returned a body we could not interpret.
    #[error("invalid version response from {url}: {source}")]
    InvalidResponse {
        /// The URL that was queried.
        url: String,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// Streaming the artifact to local storage failed.
    #[error("download from {url} to {} failed: {source}", .destination.display())]
    Download {
        /// The artifact URL.
        url: String,
        /// The local file being written.
        destination: PathBuf,
        /// The underlying stream or disk error.
        source: io::Error,
    },

    /// The elevation helper could not be installed.
    #[error("failed to provision elevation helper at {}: {source}", .path.display())]
    Provisioning {
        /// Where the helper was supposed to end up.
        path: PathBuf,
        /// The underlying filesystem error.
        source: io::Error,
    },

    /// An install was attempted with no prior successful download.
    #[error("no downloaded update found at {}", .0.display())]
    MissingArtifact(PathBuf),

    /// Generating the install script or spawning the installer failed.
    #[error("installation error: {0}")]
    Installation(String),
}

impl UpdateError {
    /// Returns a user-friendly error message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network { .. } | Self::Request { .. } => {
                "Could not reach the update server. Please check your internet connection."
            }
            Self::InvalidResponse { .. } => "The update server returned an unexpected response.",
            Self::Download { .. } => "The update could not be downloaded. Please try again.",
            Self::Provisioning { .. } => "Could not prepare the update installer.",
            Self::MissingArtifact(_) => "No downloaded update was found.",
            Self::Installation(_) => "Could not install the update. Please try again.",
        }
    }

    /// Returns whether this error is potentially recoverable with a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Request { .. } | Self::Download { .. }
        )
    }
}

/// Result type alias for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;
