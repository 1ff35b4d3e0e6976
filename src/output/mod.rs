//! Output writers: CSV tables and the JSON run report

pub mod csv;
pub mod json;

pub use csv::{
    ACTIVITIES_FILE, CsvOutput, ERRORS_FILE, EXECUTIONS_FILE, METRICS_COLUMNS, PERIODS_FILE,
    SOLUTIONS_FILE, STUDENTS_FILE, TURMAS_FILE,
};
pub use json::{REPORT_FILE, write_report};
