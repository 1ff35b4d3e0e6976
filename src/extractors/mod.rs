//! Record parsers for the dataset's text formats
//!
//! # Architecture
//!
//! - **RecordParser trait**: common interface for the per-file parsers
//!   (activity descriptors, student profiles, execution logs)
//! - **Interaction times**: computed from a codemirror log against an activity
//!   window, so it has its own entry point
//! - **Solutions**: reference solution files and solution bundles
//!
//! Every parser returns a best-effort record wrapped in [`Parsed`]; only
//! failures that make the whole file unusable are returned as errors.

pub mod activity;
pub mod execution;
pub mod interaction;
pub mod solution;
pub mod student;

use std::path::Path;

use crate::diagnostics::Parsed;
use crate::error::Result;

pub use activity::ActivityParser;
pub use execution::{ExecutionLog, ExecutionLogParser};
pub use interaction::{InteractionTimeExtractor, InteractionTimes};
pub use solution::{Solution, SolutionMetricsExtractor, split_bundle};
pub use student::StudentProfileParser;

/// Base trait for the per-file record parsers.
pub trait RecordParser {
    /// The record type produced by this parser.
    type Output;

    /// Parse the file at `path`.
    ///
    /// Returns `Err` only when the file as a whole is unusable (unreadable,
    /// or named with a malformed id). Field-level failures are reported in
    /// the returned diagnostics.
    fn parse(&self, path: &Path) -> Result<Parsed<Self::Output>>;

    /// Get a descriptive name for this parser (e.g. "activity").
    fn name(&self) -> &'static str;
}
