//! Extract functions - turn a raw response body into normalized UTF-8 text

use crate::collect::types::RawExport;
use encoding_rs::{Encoding, UTF_8};
use std::io::{Cursor, Read};
use thiserror::Error;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

/// Name of the one member the archived export is expected to carry
pub const ARCHIVE_MEMBER: &str = "statistics.csv";

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read zip archive: {0}")]
    Archive(#[from] ZipError),

    #[error("zip archive has no `{0}` member")]
    MissingMember(&'static str),

    #[error("failed to read `{0}` member: {1}")]
    MemberRead(&'static str, #[source] std::io::Error),

    #[error("`{0}` member is not valid utf-8")]
    MemberEncoding(&'static str),
}

/// Produce the day's text from a raw export
///
/// ZIP bodies yield their `statistics.csv` member decoded as UTF-8 (a
/// leading BOM is allowed and stripped). Anything else is decoded with the
/// declared charset, a BOM-sniffed encoding, or UTF-8 in that order. Line
/// endings are normalized to `\n` either way.
pub fn extract_text(raw: &RawExport) -> Result<String, ExtractError> {
    let text = if raw.is_zip() {
        info!("Response is a zip archive, extracting {}", ARCHIVE_MEMBER);
        unzip_member(&raw.body, ARCHIVE_MEMBER)?
    } else {
        decode_text(&raw.body, raw.charset())
    };

    Ok(normalize_newlines(&text))
}

/// Extract a single named member from an in-memory ZIP archive
fn unzip_member(body: &[u8], name: &'static str) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(body))?;
    let mut member = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => ExtractError::MissingMember(name),
        other => ExtractError::Archive(other),
    })?;

    let mut bytes = Vec::with_capacity(member.size() as usize);
    member
        .read_to_end(&mut bytes)
        .map_err(|e| ExtractError::MemberRead(name, e))?;
    debug!("Extracted {} bytes from {}", bytes.len(), name);

    let bytes = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };
    String::from_utf8(bytes).map_err(|_| ExtractError::MemberEncoding(name))
}

/// Decode body bytes using the declared charset when recognized
///
/// `Encoding::decode` sniffs a BOM first, so a mislabeled body with a BOM
/// still decodes correctly. Unknown labels and missing charsets fall back
/// to UTF-8 with lossy replacement.
fn decode_text(body: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    debug!("Decoding body as {}", encoding.name());

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

/// Replace `\r\n` and lone `\r` with `\n`
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Build an in-memory ZIP fixture, for tests
#[cfg(test)]
pub(crate) fn zip_with_member(name: &str, content: &[u8]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::FileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(name, FileOptions::default()).unwrap();
    writer.write_all(content).unwrap();
    writer.finish().unwrap().into_inner()
}
