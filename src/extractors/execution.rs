//! Execution log parsing (`executions/<activity>_<exercise>.log`)
//!
//! A log is a sequence of blocks opened by `== SUBMISSION` or `== TEST` and
//! closed by `*-*`. Inside a block, `-- ` marker lines introduce sections:
//! `-- CODE` (source lines until the next marker), `-- GRADE` (the next line
//! is a percentage such as `87.5%`), `-- ERROR` (one failed run, followed by
//! the interpreter output).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::RecordParser;
use crate::diagnostics::{Diagnostic, Parsed};
use crate::error::{ExtractError, Result};
use crate::file_utils::{lines, read_text};
use crate::model::is_passing;
use crate::walker::{Entry, parse_id};

pub const LOG_SUFFIX: &str = ".log";

const SUBMISSION_MARKER: &str = "== S";
const TEST_MARKER: &str = "== T";
const BLOCK_PREFIX: &str = "== ";
const BLOCK_END: &str = "*-*";
const SECTION_PREFIX: &str = "-- ";
const CODE_MARKER: &str = "-- CODE";
const GRADE_MARKER: &str = "-- GRADE";
const ERROR_MARKER: &str = "-- ERROR";

/// An error type name at the start of a line (`NameError`,
/// `json.decoder.JSONDecodeError`).
static ERROR_TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.]+Error").expect("ERROR_TYPE_PATTERN regex is invalid")
});

/// Aggregates of one execution log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionLog {
    pub submission_count: u32,
    pub test_count: u32,
    pub error_count: u32,
    /// Grade of the first passing submission, else of the last graded one.
    pub final_grade: Option<f64>,
    pub passed: bool,
    /// Raised error type names, in log order.
    pub error_types: Vec<String>,
    /// Source of the submission that passed.
    pub passing_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Outside,
    Submission,
    Test,
}

/// Single-pass scanner state.
struct Scan<'a> {
    log: ExecutionLog,
    block: Block,
    in_code: bool,
    grade_next: bool,
    code: Vec<&'a str>,
    /// The current submission produced the latching grade.
    latched_here: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Scan<'a> {
    fn new() -> Self {
        Self {
            log: ExecutionLog::default(),
            block: Block::Outside,
            in_code: false,
            grade_next: false,
            code: Vec::new(),
            latched_here: false,
            diagnostics: Vec::new(),
        }
    }

    fn line(&mut self, line: &'a str, path: &Path) {
        if self.in_code {
            if line.starts_with(SECTION_PREFIX)
                || line.starts_with(BLOCK_END)
                || line.starts_with(BLOCK_PREFIX)
            {
                self.in_code = false;
            } else {
                self.code.push(line);
                return;
            }
        }

        if self.grade_next {
            self.grade_next = false;
            self.grade(line, path);
            return;
        }

        if line.starts_with(SUBMISSION_MARKER) {
            self.close_block();
            self.block = Block::Submission;
            self.log.submission_count += 1;
        } else if line.starts_with(TEST_MARKER) {
            self.close_block();
            self.block = Block::Test;
            self.log.test_count += 1;
        } else if line.starts_with(BLOCK_END) {
            self.close_block();
        } else if line.starts_with(CODE_MARKER) {
            self.code.clear();
            self.in_code = true;
        } else if line.starts_with(GRADE_MARKER) {
            self.grade_next = self.block == Block::Submission;
        } else if line.starts_with(ERROR_MARKER) {
            self.log.error_count += 1;
        } else if let Some(m) = ERROR_TYPE_PATTERN.find(line) {
            self.log.error_types.push(m.as_str().to_string());
        }
    }

    fn grade(&mut self, line: &str, path: &Path) {
        let raw = line.trim().trim_end_matches('%').trim_end();
        let grade = match raw.parse::<f64>() {
            Ok(g) => g,
            Err(e) => {
                let err = ExtractError::FieldParse {
                    field: "grade",
                    value: line.trim().to_string(),
                    reason: e.to_string(),
                };
                self.diagnostics.push(Diagnostic::from_error(&err, path));
                return;
            }
        };
        if self.log.passed {
            return;
        }
        self.log.final_grade = Some(grade);
        if is_passing(grade) {
            self.log.passed = true;
            self.latched_here = true;
        }
    }

    fn close_block(&mut self) {
        if self.latched_here && self.log.passing_code.is_none() && !self.code.is_empty() {
            let mut source = self.code.join("\n");
            source.push('\n');
            self.log.passing_code = Some(source);
        }
        self.latched_here = false;
        self.in_code = false;
        self.grade_next = false;
        self.code.clear();
        self.block = Block::Outside;
    }

    fn finish(mut self) -> Parsed<ExecutionLog> {
        self.close_block();
        Parsed::with_diagnostics(self.log, self.diagnostics)
    }
}

/// Parser for execution logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionLogParser;

impl ExecutionLogParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse log text already in memory; `path` is only used for diagnostics.
    pub fn parse_str(&self, content: &str, path: &Path) -> Parsed<ExecutionLog> {
        let mut scan = Scan::new();
        for line in lines(content) {
            scan.line(line, path);
        }
        scan.finish()
    }
}

impl RecordParser for ExecutionLogParser {
    type Output = ExecutionLog;

    fn parse(&self, path: &Path) -> Result<Parsed<ExecutionLog>> {
        debug!(path = %path.display(), "parsing execution log");
        let content = read_text(path)?;
        Ok(self.parse_str(&content, path))
    }

    fn name(&self) -> &'static str {
        "execution"
    }
}

/// Split an execution log name `<activity>_<exercise>.log` into its ids.
/// Extra `_`-separated parts after the exercise id are ignored.
pub fn split_log_name(entry: &Entry) -> Result<(u32, u32)> {
    let stem = entry.name.strip_suffix(LOG_SUFFIX).unwrap_or(&entry.name);
    let mut parts = stem.split('_');
    match (parts.next(), parts.next()) {
        (Some(activity), Some(exercise)) => Ok((
            parse_id(activity, &entry.path)?,
            parse_id(exercise, &entry.path)?,
        )),
        _ => Err(ExtractError::MalformedIdentifier {
            path: entry.path.clone(),
            name: entry.name.clone(),
        }),
    }
}
