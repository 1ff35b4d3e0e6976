//! Static code metrics for submitted and reference solutions
//!
//! Three independent groups are computed from source text: cyclomatic
//! complexity, raw line counts, and Halstead metrics. A failure in one group
//! does not prevent the others; each failed group is recorded as a
//! [`Diagnostic`] and left empty.

pub mod complexity;
pub mod halstead;
pub mod raw;
pub mod tokens;

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::diagnostics::{Diagnostic, Parsed};
use crate::error::ExtractError;

pub use tokens::SourceError;

/// One independently computed metrics group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsGroup {
    Complexity,
    Raw,
    Halstead,
}

impl fmt::Display for MetricsGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Complexity => "complexity",
            Self::Raw => "raw",
            Self::Halstead => "halstead",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ComplexityMetrics {
    pub complexity: u32,
    pub n_functions: u32,
    pub n_classes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RawMetrics {
    pub loc: u32,
    /// Logical lines (statements).
    pub lloc: u32,
    /// Physical lines holding code.
    pub sloc: u32,
    /// Comment tokens, including trailing comments on code lines.
    pub comments: u32,
    /// Lines inside standalone multi-line strings.
    pub multi: u32,
    /// Comment-only lines.
    pub single_comments: u32,
    pub blank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HalsteadMetrics {
    pub h1: u32,
    pub h2: u32,
    #[serde(rename = "N1")]
    pub n1: u32,
    #[serde(rename = "N2")]
    pub n2: u32,
    pub vocabulary: u32,
    pub length: u32,
    pub calculated_length: f64,
    pub volume: f64,
    pub difficulty: f64,
    pub effort: f64,
    pub bugs: f64,
    pub time: f64,
}

/// Metrics for one source file; a `None` group failed to compute.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CodeMetrics {
    pub complexity: Option<ComplexityMetrics>,
    pub raw: Option<RawMetrics>,
    pub halstead: Option<HalsteadMetrics>,
}

impl CodeMetrics {
    /// True when no group is available.
    pub fn is_empty(&self) -> bool {
        self.complexity.is_none() && self.raw.is_none() && self.halstead.is_none()
    }
}

/// Computes the three metrics groups for one language.
pub trait MetricsProvider {
    fn complexity(&self, source: &str) -> Result<ComplexityMetrics, SourceError>;
    fn raw(&self, source: &str) -> Result<RawMetrics, SourceError>;
    fn halstead(&self, source: &str) -> Result<HalsteadMetrics, SourceError>;
}

/// Metrics for Python 3 source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonMetrics;

impl MetricsProvider for PythonMetrics {
    fn complexity(&self, source: &str) -> Result<ComplexityMetrics, SourceError> {
        complexity::complexity_metrics(source)
    }

    fn raw(&self, source: &str) -> Result<RawMetrics, SourceError> {
        raw::raw_metrics(source)
    }

    fn halstead(&self, source: &str) -> Result<HalsteadMetrics, SourceError> {
        halstead::halstead_metrics(source)
    }
}

/// Compute every metrics group for `source`, read from `path`.
pub fn code_metrics<P>(provider: &P, source: &str, path: &Path) -> Parsed<CodeMetrics>
where
    P: MetricsProvider + ?Sized,
{
    let mut diagnostics = Vec::new();
    let metrics = CodeMetrics {
        complexity: keep(
            MetricsGroup::Complexity,
            provider.complexity(source),
            path,
            &mut diagnostics,
        ),
        raw: keep(MetricsGroup::Raw, provider.raw(source), path, &mut diagnostics),
        halstead: keep(
            MetricsGroup::Halstead,
            provider.halstead(source),
            path,
            &mut diagnostics,
        ),
    };
    Parsed::with_diagnostics(metrics, diagnostics)
}

fn keep<T>(
    group: MetricsGroup,
    result: Result<T, SourceError>,
    path: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), %group, error = %e, "metrics group failed");
            let err = ExtractError::MetricsExtraction {
                group,
                reason: e.to_string(),
            };
            diagnostics.push(Diagnostic::from_error(&err, path));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct RawOnly;

    impl MetricsProvider for RawOnly {
        fn complexity(&self, _: &str) -> Result<ComplexityMetrics, SourceError> {
            Err(SourceError::UnexpectedIndent { line: 1 })
        }
        fn raw(&self, source: &str) -> Result<RawMetrics, SourceError> {
            raw::raw_metrics(source)
        }
        fn halstead(&self, _: &str) -> Result<HalsteadMetrics, SourceError> {
            Err(SourceError::UnexpectedIndent { line: 1 })
        }
    }

    #[test]
    fn test_code_metrics_all_groups() {
        let parsed = code_metrics(&PythonMetrics, "x = a + 1\n", Path::new("1.code"));
        assert!(parsed.is_clean());
        assert_eq!(parsed.value.complexity.unwrap().complexity, 1);
        assert_eq!(parsed.value.raw.unwrap().loc, 1);
        assert_eq!(parsed.value.halstead.unwrap().n1, 1);
    }

    #[test]
    fn test_failed_groups_are_independent() {
        let parsed = code_metrics(&RawOnly, "x = 1\n", Path::new("1.code"));
        assert!(parsed.value.complexity.is_none());
        assert!(parsed.value.halstead.is_none());
        assert_eq!(parsed.value.raw.unwrap().sloc, 1);
        assert_eq!(parsed.diagnostics_of(ErrorKind::MetricsExtraction).count(), 2);
        assert!(parsed.diagnostics[0].message.starts_with("complexity metrics unavailable"));
    }

    #[test]
    fn test_indentation_error_keeps_raw_counts() {
        let source = "def f():\nreturn 1\n";
        let parsed = code_metrics(&PythonMetrics, source, Path::new("bad.py"));
        assert!(parsed.value.complexity.is_none());
        assert!(parsed.value.halstead.is_none());
        assert_eq!(parsed.value.raw.unwrap().loc, 2);
        assert!(!parsed.value.is_empty());
    }

    #[test]
    fn test_halstead_serializes_uppercase_totals() {
        let json = serde_json::to_value(HalsteadMetrics::from_counts(1, 2, 1, 2)).unwrap();
        assert_eq!(json["N1"], 1);
        assert_eq!(json["N2"], 2);
        assert!(json.get("n1").is_none());
    }
}
