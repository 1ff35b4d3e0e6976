//! Shared file reading for the parsers
//!
//! Dataset files are nominally UTF-8 but older periods contain Latin-1
//! fragments. Invalid sequences are replaced rather than failing the file.

use std::path::Path;

use crate::error::{ExtractError, Result};

/// Read a whole text file, replacing invalid UTF-8.
///
/// A missing file is reported as [`ExtractError::MissingCompanionFile`] so
/// callers can tell "absent" from "present but unreadable".
pub fn read_text(path: &Path) -> Result<String> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractError::MissingCompanionFile {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(ExtractError::FileRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Iterate the lines of `content` without trailing `\r`.
pub fn lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().map(|l| l.strip_suffix('\r').unwrap_or(l))
}
