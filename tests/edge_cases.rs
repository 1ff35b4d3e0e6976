//! Edge case and error handling tests for codebench-etl


use std::fs;

use codebench_etl::test_utils::{DatasetBuilder, LogBuilder, activity_text, profile_text};
use codebench_etl::{DatasetExtractor, ErrorKind, ExtractorConfig, ProfileScanMode};
use harness::{WINDOW, read_csv, run_etl};
use tempfile::TempDir;

fn count(dataset: &codebench_etl::Dataset, kind: ErrorKind) -> usize {
    dataset.diagnostics.iter().filter(|d| d.kind == kind).count()
}

// ============================================================================
// Fatal failures
// ============================================================================

#[test]
fn test_missing_dataset_root() {
    let dir = TempDir::new().unwrap();
    let (_stdout, stderr, success) = run_etl(dir.path(), &["extract", "does-not-exist"]);
    assert!(!success, "a missing root must fail");
    assert!(
        stderr.contains("codebench-etl: cannot access 'does-not-exist'"),
        "{}",
        stderr
    );
}

#[test]
fn test_output_path_is_a_file() {
    let ds = DatasetBuilder::new();
    ds.add_file("out", "not a directory");

    let (_stdout, stderr, success) = run_etl(ds.path(), &["extract", ".", "-o", "out"]);
    assert!(!success);
    assert!(stderr.contains("cannot write 'out'"), "{}", stderr);
}

#[test]
fn test_invalid_inactivity_duration() {
    let ds = DatasetBuilder::new();
    let (_stdout, stderr, success) =
        run_etl(ds.path(), &["extract", ".", "--inactivity", "a while"]);
    assert!(!success);
    assert!(stderr.contains("invalid --inactivity duration"), "{}", stderr);
}

#[test]
fn test_split_missing_bundle() {
    let dir = TempDir::new().unwrap();
    let (_stdout, stderr, success) = run_etl(dir.path(), &["split-solutions", "nope.txt", "out"]);
    assert!(!success);
    assert!(stderr.contains("cannot split 'nope.txt'"), "{}", stderr);
}

// ============================================================================
// Empty and sparse datasets
// ============================================================================

#[test]
fn test_empty_dataset_writes_header_only_tables() {
    let ds = DatasetBuilder::new();
    let out = TempDir::new().unwrap();
    let (_stdout, stderr, success) =
        run_etl(ds.path(), &["extract", ".", "-o", out.path().to_str().unwrap()]);
    assert!(success, "{}", stderr);

    assert_eq!(
        fs::read_to_string(out.path().join("periods.csv")).unwrap(),
        "period\n"
    );
    assert!(read_csv(&out.path().join("executions.csv")).is_empty());
}

#[test]
fn test_period_without_turmas() {
    let ds = DatasetBuilder::new();
    ds.add_dir("2019-2");
    ds.add_file("README.txt", "top-level files are not periods");

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    assert_eq!(dataset.periods.len(), 1);
    assert!(dataset.periods[0].turmas.is_empty());
    assert!(dataset.diagnostics.is_empty());
}

#[test]
fn test_turma_without_assessments_folder() {
    let ds = DatasetBuilder::new();
    ds.student("p", 3, 1, &profile_text());

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let turma = &dataset.periods[0].turmas[0];
    assert!(turma.activities.is_empty());
    assert_eq!(turma.students.len(), 1);
    assert_eq!(count(&dataset, ErrorKind::DirectoryAccess), 1);
}

// ============================================================================
// Student profiles
// ============================================================================

#[test]
fn test_missing_profile_keeps_student() {
    let ds = DatasetBuilder::new();
    ds.add_dir("p/1/users/5/executions");

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let (_, _, student) = dataset.students().next().unwrap();
    assert_eq!(student.id, 5);
    assert_eq!(student.profile.populated_fields(), 0);
    assert_eq!(count(&dataset, ErrorKind::MissingCompanionFile), 1);
}

#[test]
fn test_shifted_profile_is_not_misread() {
    let ds = DatasetBuilder::new();
    let shifted = format!("---- exported by codebench\n{}", profile_text());
    ds.student("p", 1, 5, &shifted);

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let (_, _, student) = dataset.students().next().unwrap();
    assert_eq!(student.profile.populated_fields(), 0);
}

#[test]
fn test_shifted_profile_with_prefix_fallback() {
    let ds = DatasetBuilder::new();
    let shifted = format!("---- exported by codebench\n{}", profile_text());
    ds.student("p", 1, 5, &shifted);

    let config = ExtractorConfig {
        profile_scan_mode: ProfileScanMode::PrefixFallback,
        ..Default::default()
    };
    let dataset = DatasetExtractor::new(config).extract(ds.path()).unwrap();
    let (_, _, student) = dataset.students().next().unwrap();
    assert_eq!(student.profile.course_id, Some(12));
    assert_eq!(student.profile.has_children, Some(true));
}

// ============================================================================
// Execution logs
// ============================================================================

#[test]
fn test_crlf_and_invalid_utf8_log() {
    let ds = DatasetBuilder::new();
    ds.activity("p", 1, 2, &activity_text("A", WINDOW.0, WINDOW.1, &["3"]));
    ds.student("p", 1, 5, &profile_text());
    let log = LogBuilder::new()
        .submission("print('ol\u{e1}')", 100.0, &[])
        .build()
        .replace('\n', "\r\n");
    let path = ds.execution("p", 1, 5, (2, 3), &log);
    let mut bytes = fs::read(&path).unwrap();
    bytes.extend_from_slice(b"# \xff\xfe\r\n");
    fs::write(&path, bytes).unwrap();

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let (_, _, _, exec) = dataset.executions().next().unwrap();
    assert_eq!(exec.submission_count, 1);
    assert_eq!(exec.final_grade, Some(100.0));
    assert!(exec.passed);
}

#[test]
fn test_log_without_grades() {
    let ds = DatasetBuilder::new();
    ds.activity("p", 1, 2, &activity_text("A", WINDOW.0, WINDOW.1, &["3"]));
    ds.student("p", 1, 5, &profile_text());
    ds.execution("p", 1, 5, (2, 3), &LogBuilder::new().test(&[]).test(&[]).build());
    ds.codemirror("p", 1, 5, (2, 3), "");
    ds.code("p", 1, 5, (2, 3), "print(1)\n");

    let out = TempDir::new().unwrap();
    let (_stdout, stderr, success) =
        run_etl(ds.path(), &["extract", ".", "-o", out.path().to_str().unwrap()]);
    assert!(success, "{}", stderr);

    let rows = read_csv(&out.path().join("executions.csv"));
    assert_eq!(rows[0]["submission_count"], "0");
    assert_eq!(rows[0]["test_count"], "2");
    assert_eq!(rows[0]["final_grade"], "");
    assert_eq!(rows[0]["passed"], "false");
    assert_eq!(rows[0]["interaction_time"], "0.000");
}

#[test]
fn test_exercise_outside_activity_blocks() {
    let ds = DatasetBuilder::new();
    ds.activity("p", 1, 2, &activity_text("A", WINDOW.0, WINDOW.1, &["3"]));
    ds.student("p", 1, 5, &profile_text());
    ds.execution("p", 1, 5, (2, 99), &LogBuilder::new().test(&[]).build());
    ds.codemirror("p", 1, 5, (2, 99), "");
    ds.code("p", 1, 5, (2, 99), "x = 1\n");

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let (_, _, _, exec) = dataset.executions().next().unwrap();
    assert_eq!(exec.block_index, None);
    assert!(exec.interaction_time.is_some());
}

#[test]
fn test_code_with_syntax_error_keeps_raw_metrics() {
    let ds = DatasetBuilder::new();
    ds.activity("p", 1, 2, &activity_text("A", WINDOW.0, WINDOW.1, &["3"]));
    ds.student("p", 1, 5, &profile_text());
    ds.execution("p", 1, 5, (2, 3), &LogBuilder::new().test(&[]).build());
    ds.codemirror("p", 1, 5, (2, 3), "");
    ds.code("p", 1, 5, (2, 3), "print('unterminated)\n");

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let (_, _, _, exec) = dataset.executions().next().unwrap();
    assert!(exec.metrics.complexity.is_none());
    assert!(exec.metrics.halstead.is_none());
    assert!(count(&dataset, ErrorKind::MetricsExtraction) >= 2);
}

// ============================================================================
// Activities and interaction windows
// ============================================================================

#[test]
fn test_unparseable_window_leaves_times_unset() {
    let ds = DatasetBuilder::new();
    ds.activity("p", 1, 2, &activity_text("A", "yesterday", WINDOW.1, &["3"]));
    ds.student("p", 1, 5, &profile_text());
    ds.execution("p", 1, 5, (2, 3), &LogBuilder::new().test(&[]).build());
    ds.codemirror("p", 1, 5, (2, 3), "2020-03-02 10:00:00.000#focus#\n");
    ds.code("p", 1, 5, (2, 3), "x = 1\n");

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let (_, _, _, exec) = dataset.executions().next().unwrap();
    assert_eq!(exec.interaction_time, None);
    assert_eq!(exec.implementation_time, None);
    assert!(
        dataset
            .diagnostics
            .iter()
            .any(|d| d.kind == ErrorKind::FieldParse && d.field == Some("start"))
    );
}

#[test]
fn test_events_outside_window_are_ignored() {
    let ds = DatasetBuilder::new();
    ds.activity("p", 1, 2, &activity_text("A", WINDOW.0, WINDOW.1, &["3"]));
    ds.student("p", 1, 5, &profile_text());
    ds.execution("p", 1, 5, (2, 3), &LogBuilder::new().test(&[]).build());
    ds.codemirror(
        "p",
        1,
        5,
        (2, 3),
        "2020-02-28 10:00:00.000#focus#\n\
         2020-02-28 10:01:00.000#change#\n\
         2020-03-02 10:00:00.000#focus#\n\
         2020-03-02 10:00:40.000#change#\n\
         not an event\n\
         2020-03-09 10:00:00.000#change#\n",
    );
    ds.code("p", 1, 5, (2, 3), "x = 1\n");

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let (_, _, _, exec) = dataset.executions().next().unwrap();
    assert_eq!(exec.interaction_time, Some(chrono::TimeDelta::seconds(40)));
    assert_eq!(count(&dataset, ErrorKind::FieldParse), 1);
}

#[test]
fn test_activity_with_malformed_name_is_skipped() {
    let ds = DatasetBuilder::new();
    ds.add_file(
        "p/1/assessments/draft.data",
        &activity_text("A", WINDOW.0, WINDOW.1, &["3"]),
    );
    ds.activity("p", 1, 2, &activity_text("B", WINDOW.0, WINDOW.1, &["3"]));

    let dataset = DatasetExtractor::default().extract(ds.path()).unwrap();
    let turma = &dataset.periods[0].turmas[0];
    assert_eq!(turma.activities.len(), 1);
    assert_eq!(turma.activities[0].id, 2);
    assert_eq!(count(&dataset, ErrorKind::MalformedIdentifier), 1);
}
