//! Elevation helper provisioning.
//!
//! Replacing files under a machine-wide install directory may need elevated
//! privileges. The launcher ships a small `elevate.exe` with its bundled
//! resources; the first install attempt copies it into the application data
//! directory so the generated script can be launched through it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, UpdateError};

/// File name of the elevation helper executable.
pub const ELEVATE_HELPER_NAME: &str = "elevate.exe";

/// Ensures the elevation helper exists under `data_dir`.
///
/// Returns the helper path, provisioning it from `resources_dir` when it is
/// missing. Idempotent across repeated calls.
pub fn ensure_elevation_helper(resources_dir: &Path, data_dir: &Path) -> Result<PathBuf> {
    let helper_path = data_dir.join(ELEVATE_HELPER_NAME);
    if helper_path.exists() {
        tracing::debug!("Elevation helper present at {}", helper_path.display());
        return Ok(helper_path);
    }

    let bundled = resources_dir.join(ELEVATE_HELPER_NAME);
    tracing::info!(
        "Provisioning elevation helper: {} -> {}",
        bundled.display(),
        helper_path.display()
    );

    fs::create_dir_all(data_dir).map_err(|source| UpdateError::Provisioning {
        path: helper_path.clone(),
        source,
    })?;
    fs::copy(&bundled, &helper_path).map_err(|source| UpdateError::Provisioning {
        path: helper_path.clone(),
        source,
    })?;

    Ok(helper_path)
}
