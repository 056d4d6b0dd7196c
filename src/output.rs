//! Persistence and logging of run artifacts.
//!
//! Files are written in place with no temp-file swap, so a run interrupted
//! between levels leaves a mix of old and new artifacts.

use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, RollupError};

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serializes `value` as two-space indented JSON and writes it to `path`,
/// creating parent directories as needed.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RollupError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, &body).map_err(|source| RollupError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = body.len(), "Wrote JSON artifact");
    Ok(())
}
