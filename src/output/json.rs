//! JSON run report

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::report::RunReport;

pub const REPORT_FILE: &str = "report.json";

/// Write `report` as pretty-printed JSON to `<dir>/report.json`.
pub fn write_report(dir: &Path, report: &RunReport) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE);
    let mut out = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    out.flush()?;
    info!(path = %path.display(), "wrote report");
    Ok(path)
}
