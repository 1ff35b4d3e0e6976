//! Codebench ETL - turns a Codebench dataset dump into analysis-ready CSV tables

pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod extractors;
pub mod fields;
pub mod file_utils;
pub mod metrics;
pub mod model;
pub mod output;
pub mod report;
pub mod taxonomy;
pub mod walker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ErrorScopeMode, ExtractorConfig, ProfileScanMode};
pub use dataset::{Dataset, DatasetExtractor};
pub use diagnostics::{Diagnostic, Parsed};
pub use error::{ErrorKind, ExtractError, Result};
pub use extractors::{
    ActivityParser, ExecutionLog, ExecutionLogParser, InteractionTimeExtractor, InteractionTimes,
    RecordParser, Solution, SolutionMetricsExtractor, StudentProfileParser,
};
pub use metrics::{CodeMetrics, MetricsProvider, PythonMetrics};
pub use model::{Activity, ExerciseBlock, Execution, Period, Student, StudentProfile, Turma};
pub use output::{CsvOutput, write_report};
pub use report::{RunReport, print_report, print_report_json};
pub use taxonomy::{ErrorOccurrence, ErrorScope, ErrorTaxonomyAggregator};
