//! Configuration for dataset extraction

use chrono::TimeDelta;

/// Gaps between interaction events at or above this are treated as the
/// student stepping away.
pub const DEFAULT_INACTIVITY_SECONDS: i64 = 5 * 60;

/// How student profile fields are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileScanMode {
    /// A field is read only when its line index and its prefix both match.
    #[default]
    Strict,
    /// Like `Strict`, but when no field matches fall back to prefix-only
    /// matching (for files whose layout drifted by a line or two).
    PrefixFallback,
}

/// How raised error types are tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorScopeMode {
    /// One process-wide `(type, count)` tally.
    #[default]
    Global,
    /// One row per type per (period, turma, activity, student, exercise).
    PerExecution,
}

/// Configuration for [`DatasetExtractor`](crate::dataset::DatasetExtractor).
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub inactivity_threshold: TimeDelta,
    pub profile_scan_mode: ProfileScanMode,
    pub error_scope: ErrorScopeMode,
    /// Compute code metrics for each execution's final source.
    pub compute_metrics: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold: TimeDelta::seconds(DEFAULT_INACTIVITY_SECONDS),
            profile_scan_mode: ProfileScanMode::Strict,
            error_scope: ErrorScopeMode::Global,
            compute_metrics: true,
        }
    }
}
