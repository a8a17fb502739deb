//! Index functions - rebuild the JSON manifest of collected dates

use crate::collect::types::SnapshotIndex;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const INDEX_FILE: &str = "index.json";

/// Length of a `YYYY-MM-DD` file stem
const DATE_STEM_LEN: usize = 10;

/// Scan the data directory and build the index of snapshot dates
///
/// A snapshot is any `.csv` file whose stem is exactly 10 characters, the
/// shape of an ISO date. No stricter calendar validation is done; the
/// directory is the source of truth and the index is just a view of it.
pub fn build_index(data_dir: &Path) -> Result<SnapshotIndex> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("failed to read data directory {:?}", data_dir))?;

    let mut dates = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if stem.len() == DATE_STEM_LEN {
                dates.push(stem.to_string());
            }
        }
    }

    // Lexicographic order is chronological for ISO dates
    dates.sort();
    Ok(SnapshotIndex { dates })
}

/// Write the index as pretty-printed JSON with a trailing newline,
/// replacing any previous index
pub fn write_index(data_dir: &Path, index: &SnapshotIndex) -> Result<PathBuf> {
    let path = data_dir.join(INDEX_FILE);
    let mut json = serde_json::to_string_pretty(index)?;
    json.push('\n');

    fs::write(&path, json).with_context(|| format!("failed to write index {:?}", path))?;
    info!("Indexed {} snapshots in {:?}", index.dates.len(), path);
    Ok(path)
}
