//! Reference solutions: metrics per `<exercise_id>.code` file, and splitting
//! of instructor solution bundles into those files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, Parsed};
use crate::error::Result;
use crate::file_utils::{lines, read_text};
use crate::metrics::{CodeMetrics, MetricsProvider, PythonMetrics, code_metrics};
use crate::walker::{list_entries, parse_id};

pub const SOLUTION_SUFFIX: &str = ".code";

/// Suffix of the header line that opens each solution in a bundle.
const BUNDLE_HEADER_SUFFIX: &str = " == SOLUCAO DO PROFESSOR ==>";

/// Metrics of one reference solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub exercise_id: u32,
    pub metrics: CodeMetrics,
}

/// Computes code metrics for reference solution files.
#[derive(Debug, Clone, Default)]
pub struct SolutionMetricsExtractor<P = PythonMetrics> {
    provider: P,
}

impl SolutionMetricsExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: MetricsProvider> SolutionMetricsExtractor<P> {
    pub fn with_provider(provider: P) -> Self {
        Self { provider }
    }

    /// Metrics for one source file. Each metrics group that fails is left
    /// unset and reported as a diagnostic.
    pub fn extract(&self, path: &Path) -> Result<Parsed<CodeMetrics>> {
        debug!(path = %path.display(), "computing solution metrics");
        let source = read_text(path)?;
        Ok(code_metrics(&self.provider, &source, path))
    }

    /// Metrics for every `<exercise_id>.code` file in `dir`, ordered by id.
    ///
    /// Files with a non-numeric name or that cannot be read are skipped and
    /// reported. Fails only when `dir` itself cannot be listed.
    pub fn extract_dir(&self, dir: &Path) -> Result<Parsed<Vec<Solution>>> {
        let mut solutions = Vec::new();
        let mut diagnostics = Vec::new();

        for entry in list_entries(dir)? {
            if !entry.has_suffix(SOLUTION_SUFFIX) {
                continue;
            }
            let outcome = entry
                .id_before_suffix(SOLUTION_SUFFIX)
                .and_then(|id| Ok((id, self.extract(&entry.path)?)));
            match outcome {
                Ok((exercise_id, parsed)) => solutions.push(Solution {
                    exercise_id,
                    metrics: parsed.drain_into(&mut diagnostics),
                }),
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "skipping solution");
                    diagnostics.push(Diagnostic::from_error(&e, &entry.path));
                }
            }
        }

        solutions.sort_by_key(|s| s.exercise_id);
        Ok(Parsed::with_diagnostics(solutions, diagnostics))
    }
}

/// Split a solution bundle into `<out_dir>/<exercise_id>.code` files.
///
/// Each solution starts at a line `<exercise_id> == SOLUCAO DO PROFESSOR ==>`;
/// the lines up to the next header are its source. Lines before the first
/// header, and sections whose header id is not numeric, are dropped.
/// Returns the written paths in bundle order.
pub fn split_bundle(bundle: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let content = read_text(bundle)?;
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::new();
    let mut current: Option<(PathBuf, String)> = None;
    let mut orphan_lines = 0usize;

    for line in lines(&content) {
        if let Some(header) = line.trim().strip_suffix(BUNDLE_HEADER_SUFFIX) {
            if let Some((path, source)) = current.take() {
                fs::write(&path, source)?;
                written.push(path);
            }
            let id = header.split(" == ").next().unwrap_or(header);
            match parse_id(id, bundle) {
                Ok(id) => {
                    current = Some((out_dir.join(format!("{id}{SOLUTION_SUFFIX}")), String::new()))
                }
                Err(e) => warn!(error = %e, "skipping bundle section"),
            }
            continue;
        }
        match current.as_mut() {
            Some((_, source)) => {
                source.push_str(line);
                source.push('\n');
            }
            None => orphan_lines += 1,
        }
    }
    if let Some((path, source)) = current.take() {
        fs::write(&path, source)?;
        written.push(path);
    }

    if orphan_lines > 0 {
        warn!(
            path = %bundle.display(),
            lines = orphan_lines,
            "ignored lines outside any solution"
        );
    }
    Ok(written)
}
