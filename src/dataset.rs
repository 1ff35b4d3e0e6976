//! Dataset traversal: period / turma / {activity, student / execution}
//!
//! The traversal is sequential. A turma's activities are fully parsed before
//! its students, since executions look up their activity for the time
//! window and exercise-block position. Every failure below the dataset root
//! is recovered: the affected entity or field is skipped, a `warn!` event is
//! emitted and a [`Diagnostic`] is kept for the run report.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{ErrorScopeMode, ExtractorConfig};
use crate::diagnostics::{Diagnostic, Parsed};
use crate::error::{ErrorKind, ExtractError, Result};
use crate::extractors::activity::ACTIVITY_SUFFIX;
use crate::extractors::execution::{LOG_SUFFIX, split_log_name};
use crate::extractors::student::PROFILE_FILE;
use crate::extractors::{
    ActivityParser, ExecutionLog, ExecutionLogParser, InteractionTimeExtractor, InteractionTimes,
    RecordParser, StudentProfileParser,
};
use crate::file_utils::read_text;
use crate::metrics::{CodeMetrics, MetricsProvider, PythonMetrics, code_metrics};
use crate::model::{Activity, Execution, Period, Student, Turma};
use crate::taxonomy::{ErrorScope, ErrorTaxonomyAggregator};
use crate::walker::{Entry, list_entries};

const ASSESSMENTS_DIR: &str = "assessments";
const USERS_DIR: &str = "users";
const EXECUTIONS_DIR: &str = "executions";
const CODEMIRROR_DIR: &str = "codemirror";
const CODES_DIR: &str = "codes";
const CODE_SUFFIX: &str = ".py";

/// The full record graph of one run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub periods: Vec<Period>,
    pub errors: ErrorTaxonomyAggregator,
    /// Recovered failures, in traversal order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Dataset {
    pub fn turmas(&self) -> impl Iterator<Item = (&Period, &Turma)> {
        self.periods
            .iter()
            .flat_map(|p| p.turmas.iter().map(move |t| (p, t)))
    }

    pub fn activities(&self) -> impl Iterator<Item = (&Period, &Turma, &Activity)> {
        self.turmas()
            .flat_map(|(p, t)| t.activities.iter().map(move |a| (p, t, a)))
    }

    pub fn students(&self) -> impl Iterator<Item = (&Period, &Turma, &Student)> {
        self.turmas()
            .flat_map(|(p, t)| t.students.iter().map(move |s| (p, t, s)))
    }

    pub fn executions(&self) -> impl Iterator<Item = (&Period, &Turma, &Student, &Execution)> {
        self.students()
            .flat_map(|(p, t, s)| s.executions.iter().map(move |e| (p, t, s, e)))
    }
}

/// Mutable state threaded through one traversal.
#[derive(Default)]
struct Run {
    errors: ErrorTaxonomyAggregator,
    diagnostics: Vec<Diagnostic>,
}

impl Run {
    /// Record an error that made an entity or file unusable.
    fn skip(&mut self, err: &ExtractError, path: &Path) {
        warn!(path = %path.display(), error = %err, "skipping");
        self.diagnostics.push(Diagnostic::from_error(err, path));
    }

    fn note(&mut self, diagnostic: Diagnostic) {
        warn!(path = %diagnostic.path.display(), kind = %diagnostic.kind, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Parse one record file. An unusable file is skipped and recorded.
    fn record<R: RecordParser>(&mut self, parser: &R, path: &Path) -> Option<R::Output> {
        match parser.parse(path) {
            Ok(parsed) => Some(self.absorb(parsed)),
            Err(e) => {
                warn!(parser = parser.name(), path = %path.display(), error = %e, "skipping record");
                self.diagnostics.push(Diagnostic::from_error(&e, path));
                None
            }
        }
    }

    /// Keep a parsed value, logging and recording its diagnostics.
    fn absorb<T>(&mut self, parsed: Parsed<T>) -> T {
        let Parsed { value, diagnostics } = parsed;
        for diagnostic in diagnostics {
            self.note(diagnostic);
        }
        value
    }
}

/// Identifies the turma being traversed.
struct TurmaScope<'a> {
    period: &'a str,
    turma_id: u32,
    activities: &'a [Activity],
}

/// Walks a dataset root and assembles the record graph.
pub struct DatasetExtractor<P = PythonMetrics> {
    config: ExtractorConfig,
    provider: P,
    activity: ActivityParser,
    student: StudentProfileParser,
    execution: ExecutionLogParser,
    interaction: InteractionTimeExtractor,
}

impl DatasetExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_provider(config, PythonMetrics)
    }
}

impl Default for DatasetExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl<P: MetricsProvider> DatasetExtractor<P> {
    pub fn with_provider(config: ExtractorConfig, provider: P) -> Self {
        Self {
            activity: ActivityParser::new(),
            student: StudentProfileParser::new(config.profile_scan_mode),
            execution: ExecutionLogParser::new(),
            interaction: InteractionTimeExtractor::new(config.inactivity_threshold),
            config,
            provider,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Walk the dataset rooted at `root`.
    ///
    /// Fails only when `root` itself cannot be listed. Every subdirectory of
    /// the root is a period.
    pub fn extract(&self, root: &Path) -> Result<Dataset> {
        info!(root = %root.display(), "extracting dataset");
        let entries = list_entries(root)?;

        let mut run = Run::default();
        let periods = entries
            .iter()
            .filter(|e| e.is_dir)
            .map(|e| self.period(e, &mut run))
            .collect();

        Ok(Dataset {
            periods,
            errors: run.errors,
            diagnostics: run.diagnostics,
        })
    }

    fn period(&self, entry: &Entry, run: &mut Run) -> Period {
        debug!(period = %entry.name, "visiting period");
        let mut turmas = Vec::new();
        match list_entries(&entry.path) {
            Ok(children) => {
                for child in children.iter().filter(|c| c.is_dir) {
                    match child.id() {
                        Ok(id) => turmas.push(self.turma(&entry.name, id, child, run)),
                        Err(e) => run.skip(&e, &child.path),
                    }
                }
            }
            Err(e) => run.skip(&e, &entry.path),
        }
        turmas.sort_by_key(|t| t.id);

        Period {
            description: entry.name.clone(),
            path: entry.path.clone(),
            turmas,
        }
    }

    fn turma(&self, period: &str, id: u32, entry: &Entry, run: &mut Run) -> Turma {
        debug!(period, turma = id, "visiting turma");
        let (activities, description) = self.activities(&entry.path.join(ASSESSMENTS_DIR), run);

        let scope = TurmaScope {
            period,
            turma_id: id,
            activities: &activities,
        };
        let students = self.students(&scope, &entry.path.join(USERS_DIR), run);

        Turma {
            id,
            description,
            path: entry.path.clone(),
            activities,
            students,
        }
    }

    /// Parse every activity of a turma, sorted by id. Also returns the class
    /// name of the first descriptor listed, used as the turma description.
    /// Later descriptors are never consulted for it.
    fn activities(&self, dir: &Path, run: &mut Run) -> (Vec<Activity>, Option<String>) {
        let entries = match list_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                run.skip(&e, dir);
                return (Vec::new(), None);
            }
        };

        let mut activities = Vec::new();
        let mut description = None;
        for (position, entry) in entries
            .iter()
            .filter(|e| e.has_suffix(ACTIVITY_SUFFIX))
            .enumerate()
        {
            if let Some(activity) = run.record(&self.activity, &entry.path) {
                if position == 0 {
                    description = activity.class_name.clone();
                }
                activities.push(activity);
            }
        }
        activities.sort_by_key(|a| a.id);

        (activities, description)
    }

    fn students(&self, scope: &TurmaScope<'_>, dir: &Path, run: &mut Run) -> Vec<Student> {
        let entries = match list_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                run.skip(&e, dir);
                return Vec::new();
            }
        };

        let mut students: Vec<Student> = entries
            .iter()
            .filter(|e| e.is_dir)
            .filter_map(|entry| match entry.id() {
                Ok(id) => Some(self.student(scope, id, entry, run)),
                Err(e) => {
                    run.skip(&e, &entry.path);
                    None
                }
            })
            .collect();
        students.sort_by_key(|s| s.id);

        students
    }

    fn student(&self, scope: &TurmaScope<'_>, id: u32, entry: &Entry, run: &mut Run) -> Student {
        debug!(student = id, "visiting student");
        let profile_path = entry.path.join(PROFILE_FILE);
        // a student without a readable profile is kept with an empty one
        let profile = run
            .record(&self.student, &profile_path)
            .unwrap_or_default();

        let executions_dir = entry.path.join(EXECUTIONS_DIR);
        let mut executions = Vec::new();
        match list_entries(&executions_dir) {
            Ok(logs) => {
                for log in logs.iter().filter(|e| e.has_suffix(LOG_SUFFIX)) {
                    match split_log_name(log) {
                        Ok(ids) => executions.push(self.execution(scope, id, entry, log, ids, run)),
                        Err(e) => run.skip(&e, &log.path),
                    }
                }
            }
            Err(e) => run.skip(&e, &executions_dir),
        }
        executions.sort_by_key(|e| (e.activity_id, e.exercise_id));

        Student {
            id,
            path: entry.path.clone(),
            profile,
            executions,
        }
    }

    fn execution(
        &self,
        scope: &TurmaScope<'_>,
        student_id: u32,
        student_dir: &Entry,
        log_entry: &Entry,
        (activity_id, exercise_id): (u32, u32),
        run: &mut Run,
    ) -> Execution {
        let log = run
            .record(&self.execution, &log_entry.path)
            .unwrap_or_default();

        let error_scope = ErrorScope {
            period: scope.period.to_string(),
            turma_id: scope.turma_id,
            activity_id,
            student_id,
            exercise_id,
        };
        let scoped = self.config.error_scope == ErrorScopeMode::PerExecution;
        run.errors
            .register(&log.error_types, scoped.then_some(&error_scope));

        let activity = scope.activities.iter().find(|a| a.id == activity_id);
        let times = self.times(activity, &student_dir.path, log_entry, run);
        let metrics = if self.config.compute_metrics {
            self.metrics(&log, &student_dir.path, (activity_id, exercise_id), run)
        } else {
            CodeMetrics::default()
        };

        Execution {
            student_id,
            activity_id,
            exercise_id,
            block_index: activity.and_then(|a| a.block_index(exercise_id)),
            submission_count: log.submission_count,
            test_count: log.test_count,
            error_count: log.error_count,
            final_grade: log.final_grade,
            passed: log.passed,
            implementation_time: times.map(|t| t.implementation),
            interaction_time: times.map(|t| t.interaction),
            metrics,
        }
    }

    fn times(
        &self,
        activity: Option<&Activity>,
        student_dir: &Path,
        log_entry: &Entry,
        run: &mut Run,
    ) -> Option<InteractionTimes> {
        let companion = student_dir.join(CODEMIRROR_DIR).join(&log_entry.name);
        let Some(window) = activity.and_then(Activity::window) else {
            run.note(Diagnostic::new(
                ErrorKind::MissingCompanionFile,
                &log_entry.path,
                "no activity window for this execution; times unavailable",
            ));
            return None;
        };

        match self.interaction.extract(&companion, &window) {
            Ok(parsed) => Some(run.absorb(parsed)),
            Err(e) => {
                run.skip(&e, &companion);
                None
            }
        }
    }

    /// Metrics of the passing submission's code, or of the `codes/` file
    /// when the log has none.
    fn metrics(
        &self,
        log: &ExecutionLog,
        student_dir: &Path,
        (activity_id, exercise_id): (u32, u32),
        run: &mut Run,
    ) -> CodeMetrics {
        let code_path = student_dir
            .join(CODES_DIR)
            .join(format!("{activity_id}_{exercise_id}{CODE_SUFFIX}"));

        let source = match &log.passing_code {
            Some(code) => code.clone(),
            None => match read_text(&code_path) {
                Ok(source) => source,
                Err(e) => {
                    run.skip(&e, &code_path);
                    return CodeMetrics::default();
                }
            },
        };

        run.absorb(code_metrics(&self.provider, &source, &code_path))
    }
}
