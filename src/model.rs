//! Record types produced by the extraction pass
//!
//! The record graph mirrors the dataset layout: a [`Period`] owns its
//! [`Turma`]s, a turma owns its [`Activity`] descriptors and [`Student`]s, and
//! a student owns one [`Execution`] per attempted exercise. Nothing is
//! mutated once the traversal that built it returns.

use std::path::PathBuf;

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::metrics::CodeMetrics;

/// Grades strictly above this count as a pass. Grades are percentages
/// computed by the platform, so an exact `== 100.0` check would miss
/// rounding noise.
pub const PASS_THRESHOLD: f64 = 99.99;

/// Whether a final grade counts as a pass.
pub fn is_passing(grade: f64) -> bool {
    grade > PASS_THRESHOLD
}

/// An academic term folder.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub description: String,
    pub path: PathBuf,
    pub turmas: Vec<Turma>,
}

/// A class (section) within a period.
#[derive(Debug, Clone, PartialEq)]
pub struct Turma {
    pub id: u32,
    /// Class name read from the first activity file listed in the turma.
    pub description: Option<String>,
    pub path: PathBuf,
    pub activities: Vec<Activity>,
    pub students: Vec<Student>,
}

/// Closed interval of naive timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t <= self.end
    }
}

/// One entry of an activity's exercise list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExerciseBlock {
    Single(u32),
    /// Mutually substitutable exercises, ascending and unique.
    Alternatives(Vec<u32>),
}

impl ExerciseBlock {
    pub fn ids(&self) -> &[u32] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Alternatives(ids) => ids,
        }
    }

    pub fn contains(&self, exercise_id: u32) -> bool {
        self.ids().contains(&exercise_id)
    }
}

/// A graded assignment descriptor (`assessments/<id>.data`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Activity {
    pub id: u32,
    pub title: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub language: Option<String>,
    pub kind: Option<String>,
    pub weight: Option<f64>,
    pub exercise_block_count: Option<u32>,
    /// In file order; block positions line up with the exercise logs.
    pub exercise_blocks: Vec<ExerciseBlock>,
    pub class_number: Option<u32>,
    pub class_name: Option<String>,
}

impl Activity {
    /// The activity window, when both ends parsed.
    pub fn window(&self) -> Option<TimeWindow> {
        Some(TimeWindow::new(self.start?, self.end?))
    }

    /// Position of the block that lists `exercise_id`.
    pub fn block_index(&self, exercise_id: u32) -> Option<usize> {
        self.exercise_blocks
            .iter()
            .position(|b| b.contains(exercise_id))
    }
}

/// Which matching strategy produced a student profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMatch {
    /// Fields matched by line index and prefix.
    LineIndex,
    /// Fields matched by prefix only (fallback mode).
    PrefixScan,
    /// No field matched.
    #[default]
    Unmatched,
}

/// Demographic snapshot from `users/<id>/user.data`. Source files are often
/// incomplete, so every field is optional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudentProfile {
    pub course_id: Option<u32>,
    pub course_name: Option<String>,
    pub institution_id: Option<u32>,
    pub institution_name: Option<String>,
    pub high_school_name: Option<String>,
    pub high_school_type: Option<String>,
    pub high_school_shift: Option<String>,
    pub high_school_grad_year: Option<i32>,
    pub sex: Option<String>,
    pub birth_year: Option<i32>,
    pub marital_status: Option<String>,
    pub has_children: Option<bool>,
    pub matched_by: ProfileMatch,
}

impl StudentProfile {
    /// Number of populated fields.
    pub fn populated_fields(&self) -> usize {
        [
            self.course_id.is_some(),
            self.course_name.is_some(),
            self.institution_id.is_some(),
            self.institution_name.is_some(),
            self.high_school_name.is_some(),
            self.high_school_type.is_some(),
            self.high_school_shift.is_some(),
            self.high_school_grad_year.is_some(),
            self.sex.is_some(),
            self.birth_year.is_some(),
            self.marital_status.is_some(),
            self.has_children.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// A student folder: profile plus one execution per attempted exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: u32,
    pub path: PathBuf,
    pub profile: StudentProfile,
    pub executions: Vec<Execution>,
}

/// One student's attempt history for one exercise of one activity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Execution {
    pub student_id: u32,
    pub activity_id: u32,
    pub exercise_id: u32,
    pub block_index: Option<usize>,
    pub submission_count: u32,
    pub test_count: u32,
    pub error_count: u32,
    pub final_grade: Option<f64>,
    pub passed: bool,
    /// Focused editing time, long gaps excluded. `None` when the interaction
    /// log or the activity window is unavailable.
    pub implementation_time: Option<TimeDelta>,
    /// Focused time including long gaps.
    pub interaction_time: Option<TimeDelta>,
    pub metrics: CodeMetrics,
}
