//! Write functions - persist snapshots to the data directory

use crate::collect::types::Snapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write a snapshot as `<data_dir>/<date>.csv`, creating the directory
/// if absent
///
/// Overwrites any existing file for the same date, which makes a re-run
/// for the same day idempotent.
pub fn write_snapshot(data_dir: &Path, snapshot: &Snapshot) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {:?}", data_dir))?;

    let path = data_dir.join(snapshot.file_name());
    fs::write(&path, &snapshot.content)
        .with_context(|| format!("failed to write snapshot {:?}", path))?;

    info!("Wrote {} bytes to {:?}", snapshot.content.len(), path);
    Ok(path)
}
