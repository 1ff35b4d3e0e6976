//! CSV tables, one file per entity
//!
//! Unset values are written as empty cells. Floats keep a decimal point
//! (`100.0`), durations are seconds with millisecond precision.

use std::fmt::Display;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeDelta};
use tracing::info;

use crate::config::ErrorScopeMode;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::extractors::Solution;
use crate::metrics::CodeMetrics;

pub const PERIODS_FILE: &str = "periods.csv";
pub const TURMAS_FILE: &str = "turmas.csv";
pub const ACTIVITIES_FILE: &str = "activities.csv";
pub const STUDENTS_FILE: &str = "students.csv";
pub const EXECUTIONS_FILE: &str = "executions.csv";
pub const SOLUTIONS_FILE: &str = "solutions.csv";
pub const ERRORS_FILE: &str = "errors.csv";

pub const METRICS_COLUMNS: [&str; 22] = [
    "complexity",
    "n_functions",
    "n_classes",
    "loc",
    "lloc",
    "sloc",
    "comments",
    "multi",
    "single_comments",
    "blank",
    "h1",
    "h2",
    "N1",
    "N2",
    "vocabulary",
    "length",
    "calculated_length",
    "volume",
    "difficulty",
    "effort",
    "bugs",
    "time",
];

const ACTIVITY_COLUMNS: &[&str] = &[
    "period",
    "turma_id",
    "activity_id",
    "title",
    "start",
    "end",
    "language",
    "kind",
    "weight",
    "exercise_block_count",
    "exercise_blocks",
];

const STUDENT_COLUMNS: &[&str] = &[
    "period",
    "turma_id",
    "student_id",
    "course_id",
    "course_name",
    "institution_id",
    "institution_name",
    "high_school_name",
    "high_school_type",
    "high_school_shift",
    "high_school_grad_year",
    "sex",
    "birth_year",
    "marital_status",
    "has_children",
];

const EXECUTION_COLUMNS: &[&str] = &[
    "period",
    "turma_id",
    "student_id",
    "activity_id",
    "exercise_id",
    "block_index",
    "submission_count",
    "test_count",
    "error_count",
    "final_grade",
    "passed",
    "implementation_time",
    "interaction_time",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes the CSV tables into one output directory.
#[derive(Debug, Clone)]
pub struct CsvOutput {
    dir: PathBuf,
}

impl CsvOutput {
    /// Use `dir` for output, creating it if missing.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every dataset table. Returns the written paths.
    pub fn write_dataset(&self, dataset: &Dataset, scope: ErrorScopeMode) -> Result<Vec<PathBuf>> {
        let periods = dataset
            .periods
            .iter()
            .map(|p| vec![p.description.clone()]);

        let turmas = dataset.turmas().map(|(p, t)| {
            vec![
                p.description.clone(),
                t.id.to_string(),
                cell(t.description.as_ref()),
            ]
        });

        let mut activities = Vec::new();
        for (p, t, a) in dataset.activities() {
            activities.push(vec![
                p.description.clone(),
                t.id.to_string(),
                a.id.to_string(),
                cell(a.title.as_ref()),
                cell(a.start.map(timestamp)),
                cell(a.end.map(timestamp)),
                cell(a.language.as_ref()),
                cell(a.kind.as_ref()),
                cell(a.weight.map(float)),
                cell(a.exercise_block_count),
                serde_json::to_string(&a.exercise_blocks)?,
            ]);
        }

        let students = dataset.students().map(|(p, t, s)| {
            let profile = &s.profile;
            vec![
                p.description.clone(),
                t.id.to_string(),
                s.id.to_string(),
                cell(profile.course_id),
                cell(profile.course_name.as_ref()),
                cell(profile.institution_id),
                cell(profile.institution_name.as_ref()),
                cell(profile.high_school_name.as_ref()),
                cell(profile.high_school_type.as_ref()),
                cell(profile.high_school_shift.as_ref()),
                cell(profile.high_school_grad_year),
                cell(profile.sex.as_ref()),
                cell(profile.birth_year),
                cell(profile.marital_status.as_ref()),
                cell(profile.has_children),
            ]
        });

        let executions = dataset.executions().map(|(p, t, s, e)| {
            let mut row = vec![
                p.description.clone(),
                t.id.to_string(),
                s.id.to_string(),
                e.activity_id.to_string(),
                e.exercise_id.to_string(),
                cell(e.block_index),
                e.submission_count.to_string(),
                e.test_count.to_string(),
                e.error_count.to_string(),
                cell(e.final_grade.map(float)),
                e.passed.to_string(),
                cell(e.implementation_time.map(seconds)),
                cell(e.interaction_time.map(seconds)),
            ];
            row.extend(metrics_cells(&e.metrics));
            row
        });

        let mut written = vec![
            self.table(PERIODS_FILE, &["period"], periods)?,
            self.table(
                TURMAS_FILE,
                &["period", "turma_id", "turma_description"],
                turmas,
            )?,
            self.table(ACTIVITIES_FILE, ACTIVITY_COLUMNS, activities)?,
            self.table(STUDENTS_FILE, STUDENT_COLUMNS, students)?,
            self.table(
                EXECUTIONS_FILE,
                &with_metrics(EXECUTION_COLUMNS),
                executions,
            )?,
        ];
        written.push(self.write_errors(dataset, scope)?);

        Ok(written)
    }

    fn write_errors(&self, dataset: &Dataset, scope: ErrorScopeMode) -> Result<PathBuf> {
        match scope {
            ErrorScopeMode::Global => self.table(
                ERRORS_FILE,
                &["type", "count"],
                dataset
                    .errors
                    .snapshot()
                    .into_iter()
                    .map(|(name, count)| vec![name, count.to_string()]),
            ),
            ErrorScopeMode::PerExecution => self.table(
                ERRORS_FILE,
                &[
                    "period",
                    "turma_id",
                    "activity_id",
                    "student_id",
                    "exercise_id",
                    "type",
                    "count",
                ],
                dataset.errors.scoped_rows().iter().map(|row| {
                    vec![
                        row.scope.period.clone(),
                        row.scope.turma_id.to_string(),
                        row.scope.activity_id.to_string(),
                        row.scope.student_id.to_string(),
                        row.scope.exercise_id.to_string(),
                        row.error_type.clone(),
                        row.count.to_string(),
                    ]
                }),
            ),
        }
    }

    /// Write the reference-solution table.
    pub fn write_solutions(&self, solutions: &[Solution]) -> Result<PathBuf> {
        let rows = solutions.iter().map(|s| {
            let mut row = vec![s.exercise_id.to_string()];
            row.extend(metrics_cells(&s.metrics));
            row
        });
        self.table(SOLUTIONS_FILE, &with_metrics(&["exercise_id"]), rows)
    }

    fn table<I>(&self, name: &str, header: &[&str], rows: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let path = self.dir.join(name);
        let mut writer = csv::Writer::<File>::from_path(&path)?;
        writer.write_record(header)?;
        let mut count = 0usize;
        for row in rows {
            writer.write_record(&row)?;
            count += 1;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = count, "wrote table");
        Ok(path)
    }
}

fn with_metrics(columns: &[&'static str]) -> Vec<&'static str> {
    columns.iter().copied().chain(METRICS_COLUMNS).collect()
}

/// One cell per metrics column.
fn metrics_cells(metrics: &CodeMetrics) -> Vec<String> {
    let mut cells = Vec::with_capacity(METRICS_COLUMNS.len());

    let c = metrics.complexity;
    cells.extend([
        cell(c.map(|c| c.complexity)),
        cell(c.map(|c| c.n_functions)),
        cell(c.map(|c| c.n_classes)),
    ]);

    let r = metrics.raw;
    cells.extend([
        cell(r.map(|r| r.loc)),
        cell(r.map(|r| r.lloc)),
        cell(r.map(|r| r.sloc)),
        cell(r.map(|r| r.comments)),
        cell(r.map(|r| r.multi)),
        cell(r.map(|r| r.single_comments)),
        cell(r.map(|r| r.blank)),
    ]);

    let h = metrics.halstead;
    cells.extend([
        cell(h.map(|h| h.h1)),
        cell(h.map(|h| h.h2)),
        cell(h.map(|h| h.n1)),
        cell(h.map(|h| h.n2)),
        cell(h.map(|h| h.vocabulary)),
        cell(h.map(|h| h.length)),
        cell(h.map(|h| float(h.calculated_length))),
        cell(h.map(|h| float(h.volume))),
        cell(h.map(|h| float(h.difficulty))),
        cell(h.map(|h| float(h.effort))),
        cell(h.map(|h| float(h.bugs))),
        cell(h.map(|h| float(h.time))),
    ]);

    cells
}

fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn float(value: f64) -> String {
    format!("{value:?}")
}

fn seconds(delta: TimeDelta) -> String {
    format!("{:.3}", delta.num_milliseconds() as f64 / 1000.0)
}

fn timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{HalsteadMetrics, RawMetrics};
    use tempfile::TempDir;

    #[test]
    fn test_cells() {
        assert_eq!(cell::<u32>(None), "");
        assert_eq!(cell(Some(3)), "3");
        assert_eq!(float(100.0), "100.0");
        assert_eq!(float(2.5), "2.5");
        assert_eq!(seconds(TimeDelta::milliseconds(90_500)), "90.500");
    }

    #[test]
    fn test_metrics_cells_align_with_columns() {
        let metrics = CodeMetrics {
            complexity: None,
            raw: Some(RawMetrics {
                loc: 4,
                ..Default::default()
            }),
            halstead: Some(HalsteadMetrics::from_counts(1, 2, 1, 2)),
        };
        let cells = metrics_cells(&metrics);
        assert_eq!(cells.len(), METRICS_COLUMNS.len());
        assert_eq!(cells[0], "");
        assert_eq!(cells[3], "4");
        assert_eq!(cells[12], "1");
        assert_eq!(cells[13], "2");
    }

    #[test]
    fn test_empty_dataset_writes_headers() {
        let dir = TempDir::new().unwrap();
        let out = CsvOutput::create(&dir.path().join("out")).unwrap();
        let written = out
            .write_dataset(&Dataset::default(), ErrorScopeMode::Global)
            .unwrap();
        assert_eq!(written.len(), 6);

        let errors = fs::read_to_string(out.dir().join(ERRORS_FILE)).unwrap();
        assert_eq!(errors, "type,count\n");
        let executions = fs::read_to_string(out.dir().join(EXECUTIONS_FILE)).unwrap();
        assert!(executions.starts_with("period,turma_id,student_id,activity_id"));
        assert!(executions.trim_end().ends_with("effort,bugs,time"));
    }

    #[test]
    fn test_scoped_errors_header() {
        let dir = TempDir::new().unwrap();
        let out = CsvOutput::create(dir.path()).unwrap();
        out.write_dataset(&Dataset::default(), ErrorScopeMode::PerExecution)
            .unwrap();
        let errors = fs::read_to_string(dir.path().join(ERRORS_FILE)).unwrap();
        assert_eq!(
            errors,
            "period,turma_id,activity_id,student_id,exercise_id,type,count\n"
        );
    }

    #[test]
    fn test_write_solutions() {
        let dir = TempDir::new().unwrap();
        let out = CsvOutput::create(dir.path()).unwrap();
        let path = out
            .write_solutions(&[Solution {
                exercise_id: 9,
                metrics: CodeMetrics::default(),
            }])
            .unwrap();
        let text = fs::read_to_string(path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("exercise_id,complexity,"));
        assert_eq!(lines.next().unwrap(), format!("9{}", ",".repeat(22)));
    }
}
