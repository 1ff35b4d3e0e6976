//! Field-level diagnostics collected alongside parsed records
//!
//! Parsers never abort a record because one field is malformed. Instead they
//! return a [`Parsed`] value: the best-effort record plus the list of
//! recovered failures that happened while building it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorKind, ExtractError, Result};

/// A recovered failure, kept for the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, path: &Path, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            field: None,
            message: message.into(),
        }
    }

    /// Build a diagnostic from an error raised while processing `path`.
    pub fn from_error(err: &ExtractError, path: &Path) -> Self {
        Self {
            kind: err.kind(),
            path: path.to_path_buf(),
            field: err.field(),
            message: err.to_string(),
        }
    }
}

/// Keep the value of a field-level result, or record the failure in `sink`
/// and leave the field unset.
pub fn recover<T>(result: Result<T>, path: &Path, sink: &mut Vec<Diagnostic>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "recovered field error");
            sink.push(Diagnostic::from_error(&e, path));
            None
        }
    }
}

/// A best-effort value with its sidecar diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Parsed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// True when nothing had to be recovered.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics of one kind.
    pub fn diagnostics_of(&self, kind: ErrorKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Move the diagnostics into `sink` and return the value.
    pub fn drain_into(self, sink: &mut Vec<Diagnostic>) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_keeps_field() {
        let err = ExtractError::FieldParse {
            field: "weight",
            value: "x".to_string(),
            reason: "invalid float literal".to_string(),
        };
        let diag = Diagnostic::from_error(&err, Path::new("a/1.data"));
        assert_eq!(diag.kind, ErrorKind::FieldParse);
        assert_eq!(diag.field, Some("weight"));
        assert_eq!(diag.path, PathBuf::from("a/1.data"));
    }

    #[test]
    fn test_recover() {
        let mut sink = Vec::new();
        assert_eq!(recover(Ok(4), Path::new("a"), &mut sink), Some(4));
        assert!(sink.is_empty());

        let err = ExtractError::MissingCompanionFile {
            path: PathBuf::from("b"),
        };
        assert_eq!(recover::<u32>(Err(err), Path::new("b"), &mut sink), None);
        assert_eq!(sink[0].kind, ErrorKind::MissingCompanionFile);
    }

    #[test]
    fn test_drain_into_moves_diagnostics() {
        let parsed = Parsed::with_diagnostics(
            3,
            vec![Diagnostic::new(ErrorKind::FileRead, Path::new("x"), "boom")],
        );
        assert!(!parsed.is_clean());

        let mut sink = Vec::new();
        let value = parsed.map(|v| v * 2).drain_into(&mut sink);
        assert_eq!(value, 6);
        assert_eq!(sink.len(), 1);
    }
}
