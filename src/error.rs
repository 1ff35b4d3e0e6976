//! Error types for dataset extraction
//!
//! Every variant maps onto one entry of the extraction error taxonomy
//! ([`ErrorKind`]). Parsers return these errors for failures that stop the
//! current file; failures that only affect one field are recorded as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s instead.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::metrics::MetricsGroup;

/// Taxonomy of recoverable extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A directory is missing or unreadable; its subtree is skipped.
    DirectoryAccess,
    /// A file or folder name that should be a bare integer id is not.
    MalformedIdentifier,
    /// A single field failed type conversion.
    FieldParse,
    /// A paired file (codemirror log, source file, profile) is absent.
    MissingCompanionFile,
    /// One metrics group could not be computed for a source file.
    MetricsExtraction,
    /// A file exists but could not be read.
    FileRead,
    /// Writing the output tables failed.
    Output,
}

impl ErrorKind {
    /// All kinds, in report order.
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::DirectoryAccess,
        ErrorKind::MalformedIdentifier,
        ErrorKind::FieldParse,
        ErrorKind::MissingCompanionFile,
        ErrorKind::MetricsExtraction,
        ErrorKind::FileRead,
        ErrorKind::Output,
    ];
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DirectoryAccess => "directory access",
            Self::MalformedIdentifier => "malformed identifier",
            Self::FieldParse => "field parse",
            Self::MissingCompanionFile => "missing companion file",
            Self::MetricsExtraction => "metrics extraction",
            Self::FileRead => "file read",
            Self::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised while walking and parsing a dataset.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot access directory '{}': {source}", .path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("expected a numeric id in '{}', found {name:?}", .path.display())]
    MalformedIdentifier { path: PathBuf, name: String },

    #[error("invalid {field} value {value:?}: {reason}")]
    FieldParse {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("companion file not found: '{}'", .path.display())]
    MissingCompanionFile { path: PathBuf },

    #[error("{group} metrics unavailable: {reason}")]
    MetricsExtraction { group: MetricsGroup, reason: String },

    #[error("cannot read '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ExtractError {
    /// The taxonomy entry this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DirectoryAccess { .. } => ErrorKind::DirectoryAccess,
            Self::MalformedIdentifier { .. } => ErrorKind::MalformedIdentifier,
            Self::FieldParse { .. } => ErrorKind::FieldParse,
            Self::MissingCompanionFile { .. } => ErrorKind::MissingCompanionFile,
            Self::MetricsExtraction { .. } => ErrorKind::MetricsExtraction,
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::Csv(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Output,
        }
    }

    /// Name of the field involved, for field-level failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::FieldParse { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`ExtractError`].
pub type Result<T> = std::result::Result<T, ExtractError>;
