//! Performance benchmarks for codebench-etl

use std::path::Path;

use chrono::NaiveDate;
use codebench_etl::metrics::code_metrics;
use codebench_etl::model::TimeWindow;
use codebench_etl::test_utils::{DatasetBuilder, LogBuilder, activity_text, profile_text};
use codebench_etl::{DatasetExtractor, ExecutionLogParser, InteractionTimeExtractor, PythonMetrics};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

const PYTHON_SOURCE: &str = r#"# reads a list and prints the largest even value
def largest_even(values):
    best = None
    for v in values:
        if v % 2 == 0 and (best is None or v > best):
            best = v
    return best

class Reader:
    """Reads whitespace separated integers."""

    def read(self):
        return [int(x) for x in input().split()]

nums = Reader().read()
print(largest_even(nums) if nums else "empty")
"#;

fn build_log(submissions: usize) -> String {
    let mut log = LogBuilder::new();
    for i in 0..submissions {
        let grade = if i + 1 == submissions { 100.0 } else { 40.0 };
        log = log
            .test(&["Traceback (most recent call last):\nValueError: invalid literal"])
            .submission(PYTHON_SOURCE, grade, &[]);
    }
    log.build()
}

fn build_events(count: usize) -> String {
    let mut events = String::from("2020-03-02 10:00:00.000#focus#\n");
    for i in 1..count {
        let kind = if i % 50 == 0 { "blur" } else { "change" };
        events.push_str(&format!(
            "2020-03-02 {:02}:{:02}:{:02}.000#{}#\n",
            10 + i / 3600,
            (i / 60) % 60,
            i % 60,
            kind
        ));
    }
    events
}

fn bench_execution_log(c: &mut Criterion) {
    let parser = ExecutionLogParser::new();
    let path = Path::new("10_5.log");
    let mut group = c.benchmark_group("execution_log");

    for submissions in [5, 50] {
        let log = build_log(submissions);
        group.bench_function(format!("{submissions}_submissions"), |b| {
            b.iter(|| parser.parse_str(black_box(&log), path))
        });
    }

    group.finish();
}

fn bench_interaction_times(c: &mut Criterion) {
    let extractor = InteractionTimeExtractor::default();
    let day = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
    let window = TimeWindow::new(
        day.and_hms_opt(0, 0, 0).unwrap(),
        day.and_hms_opt(23, 59, 59).unwrap(),
    );
    let path = Path::new("10_5.log");
    let mut group = c.benchmark_group("interaction_times");

    for count in [100, 5000] {
        let events = build_events(count);
        group.bench_function(format!("{count}_events"), |b| {
            b.iter(|| extractor.extract_str(black_box(&events), &window, path))
        });
    }

    group.finish();
}

fn bench_code_metrics(c: &mut Criterion) {
    let path = Path::new("solution.py");
    let large = PYTHON_SOURCE.repeat(20);
    let mut group = c.benchmark_group("code_metrics");

    group.bench_function("small_program", |b| {
        b.iter(|| code_metrics(&PythonMetrics, black_box(PYTHON_SOURCE), path))
    });

    group.bench_function("large_program", |b| {
        b.iter(|| code_metrics(&PythonMetrics, black_box(&large), path))
    });

    group.finish();
}

fn bench_dataset_walk(c: &mut Criterion) {
    let ds = DatasetBuilder::new();
    ds.activity(
        "2020-1",
        1,
        10,
        &activity_text("Turma A", "2020-03-01 00:00", "2020-03-08 00:00", &["5", "6"]),
    );
    let log = build_log(3);
    let events = build_events(200);
    for student in 0..20 {
        ds.student("2020-1", 1, student, &profile_text());
        for exercise in [5, 6] {
            ds.execution("2020-1", 1, student, (10, exercise), &log);
            ds.codemirror("2020-1", 1, student, (10, exercise), &events);
        }
    }

    let extractor = DatasetExtractor::default();
    c.bench_function("dataset_walk_20_students", |b| {
        b.iter(|| extractor.extract(black_box(ds.path())))
    });
}

criterion_group!(
    benches,
    bench_execution_log,
    bench_interaction_times,
    bench_code_metrics,
    bench_dataset_walk,
);
criterion_main!(benches);
