//! Core data types for the collection pipeline
//! Pure data structures with no behavior

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw HTTP response body plus the header needed to decode it later
#[derive(Debug, Clone)]
pub struct RawExport {
    pub body: Bytes,
    pub content_type: Option<String>,
}

impl RawExport {
    /// True when the body is a ZIP archive, by magic number or Content-Type
    pub fn is_zip(&self) -> bool {
        self.body.starts_with(b"PK\x03\x04")
            || self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.contains("zip"))
    }

    /// Charset declared in the Content-Type header, if any
    pub fn charset(&self) -> Option<&str> {
        let content_type = self.content_type.as_deref()?;
        content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.trim().split_once('=')?;
            if key.eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches('"'))
            } else {
                None
            }
        })
    }
}

/// One day's export: normalized text keyed by its calendar date
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub content: String,
}

impl Snapshot {
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.date.format("%Y-%m-%d"))
    }
}

/// Manifest of all snapshot dates present on disk, ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    pub dates: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export(body: &'static [u8], content_type: Option<&str>) -> RawExport {
        RawExport {
            body: Bytes::from_static(body),
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn test_zip_detection_by_magic() {
        assert!(export(b"PK\x03\x04rest", None).is_zip());
        assert!(!export(b"a,b\n1,2\n", None).is_zip());
    }

    #[test]
    fn test_zip_detection_by_content_type() {
        assert!(export(b"", Some("application/zip")).is_zip());
        assert!(!export(b"", Some("text/csv")).is_zip());
    }

    #[test]
    fn test_charset_parsing() {
        assert_eq!(
            export(b"", Some("text/csv; charset=windows-1252")).charset(),
            Some("windows-1252")
        );
        assert_eq!(
            export(b"", Some("text/csv; Charset=\"UTF-8\"")).charset(),
            Some("UTF-8")
        );
        assert_eq!(export(b"", Some("text/csv")).charset(), None);
        assert_eq!(export(b"", None).charset(), None);
    }

    #[test]
    fn test_snapshot_file_name() {
        let snapshot = Snapshot {
            date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            content: String::new(),
        };
        assert_eq!(snapshot.file_name(), "2024-03-07.csv");
    }
}
