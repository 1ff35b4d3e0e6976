//! Run summary: entity counts and recovered failures by kind
//!
//! The report is printed after every run (console or JSON) and written next
//! to the CSV tables as `report.json`.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::dataset::Dataset;
use crate::diagnostics::Diagnostic;
use crate::error::ErrorKind;

/// Counts collected from one extraction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub periods: usize,
    pub turmas: usize,
    pub activities: usize,
    pub students: usize,
    pub executions: usize,
    pub passed_executions: usize,
    /// Reference solutions processed, when a solutions folder was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solutions: Option<usize>,
    /// Total registered error occurrences
    pub error_occurrences: u64,
    pub distinct_error_types: usize,
    /// Recovered failures by kind; every kind is present
    pub diagnostics: BTreeMap<ErrorKind, usize>,
}

impl RunReport {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut report = Self {
            periods: dataset.periods.len(),
            turmas: dataset.turmas().count(),
            activities: dataset.activities().count(),
            students: dataset.students().count(),
            executions: dataset.executions().count(),
            passed_executions: dataset.executions().filter(|(.., e)| e.passed).count(),
            solutions: None,
            error_occurrences: dataset.errors.total(),
            distinct_error_types: dataset.errors.snapshot().len(),
            diagnostics: ErrorKind::ALL.iter().map(|k| (*k, 0)).collect(),
        };
        report.record_diagnostics(&dataset.diagnostics);
        report
    }

    /// Add the outcome of the reference-solution pass.
    pub fn with_solutions(mut self, count: usize, diagnostics: &[Diagnostic]) -> Self {
        self.solutions = Some(count);
        self.record_diagnostics(diagnostics);
        self
    }

    fn record_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        for d in diagnostics {
            *self.diagnostics.entry(d.kind).or_insert(0) += 1;
        }
    }

    pub fn total_diagnostics(&self) -> usize {
        self.diagnostics.values().sum()
    }
}

/// Print the report to stdout with optional color.
pub fn print_report(report: &RunReport, use_color: bool) -> io::Result<()> {
    let color_choice = if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(color_choice);

    let mut bold = ColorSpec::new();
    bold.set_bold(true);
    stdout.set_color(&bold)?;
    writeln!(stdout, "Extraction Summary")?;
    stdout.reset()?;
    writeln!(stdout, "──────────────────")?;

    writeln!(stdout, "Periods:      {}", format_number(report.periods))?;
    writeln!(stdout, "Turmas:       {}", format_number(report.turmas))?;
    writeln!(stdout, "Activities:   {}", format_number(report.activities))?;
    writeln!(stdout, "Students:     {}", format_number(report.students))?;
    writeln!(
        stdout,
        "Executions:   {} ({} passed)",
        format_number(report.executions),
        format_number(report.passed_executions)
    )?;
    if let Some(solutions) = report.solutions {
        writeln!(stdout, "Solutions:    {}", format_number(solutions))?;
    }
    writeln!(
        stdout,
        "Errors:       {} occurrences of {} types",
        format_number(report.error_occurrences as usize),
        report.distinct_error_types
    )?;
    writeln!(stdout)?;

    let total = report.total_diagnostics();
    stdout.set_color(&bold)?;
    write!(stdout, "Recovered failures: ")?;
    stdout.reset()?;
    writeln!(stdout, "{}", format_number(total))?;

    if total > 0 {
        let mut kind_color = ColorSpec::new();
        kind_color.set_fg(Some(Color::Yellow));

        for (kind, count) in report.diagnostics.iter().filter(|(_, c)| **c > 0) {
            write!(stdout, "  ")?;
            stdout.set_color(&kind_color)?;
            write!(stdout, "{:<24}", kind.to_string())?;
            stdout.reset()?;
            writeln!(stdout, "{:>8}", format_number(*count))?;
        }
    }

    Ok(())
}

/// Format a number with thousand separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }

    result
}

/// Print the report as JSON.
pub fn print_report_json(report: &RunReport) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
