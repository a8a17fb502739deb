//! Collection pipeline - fetch, extract, persist and index daily exports

pub mod diff;
pub mod extract;
pub mod fetch;
pub mod index;
pub mod types;
pub mod write;

pub use types::*;

use anyhow::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Run one collection: fetch the export, extract its text and persist it
/// as the snapshot for `date`
///
/// Failures before the write step leave the data directory untouched.
pub async fn collect_snapshot(url: &str, data_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    let raw = fetch::fetch_export(url).await?;
    let content = extract::extract_text(&raw)?;
    let snapshot = Snapshot { date, content };
    write::write_snapshot(data_dir, &snapshot)
}
