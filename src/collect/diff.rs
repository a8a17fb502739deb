//! Diff functions - compare two snapshots module by module

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const UTF8_BOM: &str = "\u{feff}";

/// Per-module counters carried by an export row
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModuleStats {
    pub line_count: i64,
    pub package_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Deleted,
    Modified,
    Unchanged,
}

/// One output row of the snapshot comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub name: String,
    pub status: DiffStatus,
    pub line_count_diff: i64,
    pub package_count_diff: i64,
    pub old_line_count: i64,
    pub old_package_count: i64,
    pub new_line_count: i64,
    pub new_package_count: i64,
}

/// Parse an export into per-module stats keyed by module name
///
/// Reads leniently the way the export itself is produced: rows with an
/// empty name are skipped, missing or non-numeric counters read as 0,
/// extra columns are ignored.
pub fn parse_stats(text: &str) -> Result<BTreeMap<String, ModuleStats>> {
    let text = text.trim_start_matches(UTF8_BOM);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let name_col = headers
        .iter()
        .position(|h| h == "name")
        .context("export has no `name` column")?;
    let line_col = headers.iter().position(|h| h == "line_count");
    let package_col = headers.iter().position(|h| h == "package_count");

    let mut stats = BTreeMap::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let name = record.get(name_col).unwrap_or("").trim();
        if name.is_empty() {
            skipped += 1;
            continue;
        }
        stats.insert(
            name.to_string(),
            ModuleStats {
                line_count: parse_count(line_col.and_then(|i| record.get(i))),
                package_count: parse_count(package_col.and_then(|i| record.get(i))),
            },
        );
    }

    if skipped > 0 {
        warn!("Skipped {} rows with no module name", skipped);
    }
    Ok(stats)
}

fn parse_count(field: Option<&str>) -> i64 {
    field.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Join two snapshots on module name and classify every module
pub fn compare(
    old: &BTreeMap<String, ModuleStats>,
    new: &BTreeMap<String, ModuleStats>,
) -> Vec<DiffRow> {
    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    names
        .into_iter()
        .map(|name| {
            let old_stats = old.get(name).copied();
            let new_stats = new.get(name).copied();
            diff_row(name, old_stats, new_stats)
        })
        .collect()
}

fn diff_row(name: &str, old: Option<ModuleStats>, new: Option<ModuleStats>) -> DiffRow {
    let o = old.unwrap_or_default();
    let n = new.unwrap_or_default();

    let status = match (old, new) {
        (None, Some(_)) => DiffStatus::Added,
        (Some(_), None) => DiffStatus::Deleted,
        _ if o == n => DiffStatus::Unchanged,
        _ => DiffStatus::Modified,
    };

    DiffRow {
        name: name.to_string(),
        status,
        line_count_diff: n.line_count - o.line_count,
        package_count_diff: n.package_count - o.package_count,
        old_line_count: o.line_count,
        old_package_count: o.package_count,
        new_line_count: n.line_count,
        new_package_count: n.package_count,
    }
}

/// Write diff rows as CSV prefixed with a UTF-8 BOM
///
/// The BOM keeps spreadsheet imports from mangling module names.
pub fn write_diff(rows: &[DiffRow], out_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush diff csv: {}", e))?;

    let mut out = Vec::with_capacity(UTF8_BOM.len() + body.len());
    out.extend_from_slice(UTF8_BOM.as_bytes());
    out.extend_from_slice(&body);

    fs::write(out_path, out).with_context(|| format!("failed to write diff {:?}", out_path))?;
    Ok(())
}

/// Compare two snapshot files and write the diff, returning the row count
pub fn diff_files(old_path: &Path, new_path: &Path, out_path: &Path) -> Result<usize> {
    let old_text = fs::read_to_string(old_path)
        .with_context(|| format!("failed to read snapshot {:?}", old_path))?;
    let new_text = fs::read_to_string(new_path)
        .with_context(|| format!("failed to read snapshot {:?}", new_path))?;

    let old = parse_stats(&old_text)?;
    let new = parse_stats(&new_text)?;
    info!(
        "Comparing {} modules against {} modules",
        old.len(),
        new.len()
    );

    let rows = compare(&old, &new);
    write_diff(&rows, out_path)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn stats(pairs: &[(&str, i64, i64)]) -> BTreeMap<String, ModuleStats> {
        pairs
            .iter()
            .map(|&(name, line_count, package_count)| {
                (
                    name.to_string(),
                    ModuleStats {
                        line_count,
                        package_count,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_basic_export() {
        let parsed = parse_stats("name,line_count,package_count\nfoo,10,1\nbar,5,2\n").unwrap();
        assert_eq!(parsed, stats(&[("foo", 10, 1), ("bar", 5, 2)]));
    }

    #[test]
    fn test_parse_tolerates_missing_and_bad_counters() {
        let parsed = parse_stats("name,line_count\nfoo,x\nbar,\nbaz\n").unwrap();
        assert_eq!(parsed, stats(&[("foo", 0, 0), ("bar", 0, 0), ("baz", 0, 0)]));
    }

    #[test]
    fn test_parse_skips_empty_names_and_strips_bom() {
        let parsed =
            parse_stats("\u{feff}name,line_count,package_count\n,10,1\nfoo,3,1\n").unwrap();
        assert_eq!(parsed, stats(&[("foo", 3, 1)]));
    }

    #[test]
    fn test_parse_requires_name_column() {
        assert!(parse_stats("module,line_count\nfoo,1\n").is_err());
    }

    #[test]
    fn test_compare_classifies_modules() {
        let old = stats(&[("a", 10, 1), ("gone", 7, 3)]);
        let new = stats(&[("a", 12, 1), ("b", 5, 2)]);

        let rows = compare(&old, &new);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "gone"]); // sorted by name

        assert_eq!(rows[0].status, DiffStatus::Modified);
        assert_eq!(rows[0].line_count_diff, 2);
        assert_eq!(rows[0].package_count_diff, 0);

        assert_eq!(rows[1].status, DiffStatus::Added);
        assert_eq!(rows[1].line_count_diff, 5);
        assert_eq!(rows[1].new_package_count, 2);

        assert_eq!(rows[2].status, DiffStatus::Deleted);
        assert_eq!(rows[2].line_count_diff, -7);
        assert_eq!(rows[2].package_count_diff, -3);
        assert_eq!(rows[2].new_line_count, 0);
    }

    #[test]
    fn test_compare_marks_identical_modules_unchanged() {
        let old = stats(&[("a", 10, 1)]);
        let rows = compare(&old, &old);
        assert_eq!(rows[0].status, DiffStatus::Unchanged);
        assert_eq!(rows[0].line_count_diff, 0);
    }

    #[test]
    fn test_diff_files_end_to_end() {
        let temp = tempdir().unwrap();
        let old_path = temp.path().join("2024-01-01.csv");
        let new_path = temp.path().join("2024-01-02.csv");
        let out_path = temp.path().join("diff.csv");

        fs::write(&old_path, "name,line_count,package_count\na,10,1\n").unwrap();
        fs::write(
            &new_path,
            "name,line_count,package_count\na,12,1\nb,5,2\n",
        )
        .unwrap();

        let count = diff_files(&old_path, &new_path, &out_path).unwrap();
        assert_eq!(count, 2);

        let written = fs::read_to_string(&out_path).unwrap();
        assert!(written.starts_with('\u{feff}'));

        let mut lines = written.trim_start_matches('\u{feff}').lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,status,line_count_diff,package_count_diff,\
             old_line_count,old_package_count,new_line_count,new_package_count"
        );
        assert_eq!(lines.next().unwrap(), "a,modified,2,0,10,1,12,1");
        assert_eq!(lines.next().unwrap(), "b,added,5,2,0,0,5,2");
    }
}
