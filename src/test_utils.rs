//! Test utilities for building synthetic Codebench datasets.
//!
//! This module is only compiled for tests and benchmarks.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary dataset root.
///
/// Provides methods for writing the files of the period / turma / student
/// hierarchy. The dataset is automatically cleaned up when dropped.
pub struct DatasetBuilder {
    dir: TempDir,
}

impl DatasetBuilder {
    /// Create a new empty dataset root.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self { dir }
    }

    /// Get the path to the dataset root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file (and parent directories) relative to the root.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Create a directory relative to the root.
    pub fn add_dir(&self, path: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        fs::create_dir_all(&full_path).expect("Failed to create dir");
        full_path
    }

    /// Write `<period>/<turma>/assessments/<activity>.data`.
    pub fn activity(&self, period: &str, turma: u32, activity: u32, content: &str) -> PathBuf {
        self.add_file(
            &format!("{period}/{turma}/assessments/{activity}.data"),
            content,
        )
    }

    /// Write `<period>/<turma>/users/<student>/user.data` and create the
    /// student's `executions/` folder.
    pub fn student(&self, period: &str, turma: u32, student: u32, profile: &str) -> PathBuf {
        let base = format!("{period}/{turma}/users/{student}");
        self.add_dir(&format!("{base}/executions"));
        self.add_file(&format!("{base}/user.data"), profile)
    }

    /// Write an execution log for `<activity>_<exercise>`.
    pub fn execution(
        &self,
        period: &str,
        turma: u32,
        student: u32,
        (activity, exercise): (u32, u32),
        log: &str,
    ) -> PathBuf {
        self.add_file(
            &format!("{period}/{turma}/users/{student}/executions/{activity}_{exercise}.log"),
            log,
        )
    }

    /// Write a codemirror interaction log for `<activity>_<exercise>`.
    pub fn codemirror(
        &self,
        period: &str,
        turma: u32,
        student: u32,
        (activity, exercise): (u32, u32),
        log: &str,
    ) -> PathBuf {
        self.add_file(
            &format!("{period}/{turma}/users/{student}/codemirror/{activity}_{exercise}.log"),
            log,
        )
    }

    /// Write the final source file for `<activity>_<exercise>`.
    pub fn code(
        &self,
        period: &str,
        turma: u32,
        student: u32,
        (activity, exercise): (u32, u32),
        source: &str,
    ) -> PathBuf {
        self.add_file(
            &format!("{period}/{turma}/users/{student}/codes/{activity}_{exercise}.py"),
            source,
        )
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Activity descriptor text with the given window and exercise lines.
pub fn activity_text(class_name: &str, start: &str, end: &str, blocks: &[&str]) -> String {
    let mut text = format!(
        "---- assessment title: Lista 1\n\
         ---- class number: 1\n\
         ---- class name: {class_name}\n\
         ---- start: {start}\n\
         ---- end: {end}\n\
         ---- language: python\n\
         ---- type: homework\n\
         ---- weight: 1.0\n\
         ---- total questions: {}\n",
        blocks.len()
    );
    for (i, block) in blocks.iter().enumerate() {
        text.push_str(&format!("---- exercise #{}: {}\n", i + 1, block));
    }
    text
}

/// A complete profile with every field at its expected line.
pub fn profile_text() -> String {
    [
        "---- user profile",
        "---- course id: 12",
        "---- course name: Computer Science",
        "---- institution id: 3",
        "---- institution name: UFAM: Campus Manaus",
        "---- high school name: Escola Estadual",
        "---- school type: public",
        "---- shift: morning",
        "---- graduation year: 2015",
        "---- sex: female",
        "---- year of birth: 1998",
        "---- civil status: single",
        "---- have children: YES",
    ]
    .join("\n")
        + "\n"
}

/// Builder for execution log text.
#[derive(Debug, Default)]
pub struct LogBuilder {
    text: String,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a graded submission. Each entry of `errors` becomes an
    /// `-- ERROR` section with that interpreter output.
    pub fn submission(mut self, code: &str, grade: f64, errors: &[&str]) -> Self {
        self.text.push_str("== SUBMISSION\n-- CODE\n");
        self.text.push_str(code);
        self.text.push_str("\n-- EXECUTION TIME\n0.01\n");
        self.text.push_str(&format!("-- GRADE\n{grade}%\n"));
        self.errors(errors);
        self.text.push_str("*-*\n");
        self
    }

    /// Append an ungraded test run.
    pub fn test(mut self, errors: &[&str]) -> Self {
        self.text.push_str("== TEST\n-- CODE\nprint('test')\n");
        self.errors(errors);
        self.text.push_str("*-*\n");
        self
    }

    fn errors(&mut self, errors: &[&str]) {
        for error in errors {
            self.text.push_str("-- ERROR\n");
            self.text.push_str(error);
            self.text.push('\n');
        }
    }

    pub fn build(self) -> String {
        self.text
    }
}
