//! Implementation and interaction time from codemirror logs
//!
//! A codemirror log (`codemirror/<activity>_<exercise>.log`) records one
//! editor event per line as `timestamp#event#message`. Time is accumulated
//! between consecutive in-window events while the editor has focus; each
//! event becomes the reference point for the next interval.

use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::config::DEFAULT_INACTIVITY_SECONDS;
use crate::diagnostics::{Diagnostic, Parsed};
use crate::error::{ErrorKind, Result};
use crate::file_utils::{lines, read_text};
use crate::model::TimeWindow;

const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const FOCUS_EVENT: &str = "focus";
const BLUR_EVENT: &str = "blur";
const SUBMIT_EVENT: &str = "submit";
/// Message prefix of a submission the platform accepted.
const SUCCESS_PREFIX: &str = "Congrat";

/// Durations accumulated from one codemirror log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionTimes {
    /// Sum of the intervals shorter than the inactivity threshold.
    pub implementation: TimeDelta,
    /// Sum of all intervals.
    pub interaction: TimeDelta,
}

impl Default for InteractionTimes {
    fn default() -> Self {
        Self {
            implementation: TimeDelta::zero(),
            interaction: TimeDelta::zero(),
        }
    }
}

/// Computes [`InteractionTimes`] bounded by an activity window.
#[derive(Debug, Clone, Copy)]
pub struct InteractionTimeExtractor {
    threshold: TimeDelta,
}

impl Default for InteractionTimeExtractor {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_INACTIVITY_SECONDS))
    }
}

impl InteractionTimeExtractor {
    pub fn new(threshold: TimeDelta) -> Self {
        Self { threshold }
    }

    /// Read and scan the log at `path`.
    ///
    /// A missing log is returned as
    /// [`ExtractError::MissingCompanionFile`](crate::error::ExtractError::MissingCompanionFile)
    /// so callers can report both durations as unavailable rather than zero.
    pub fn extract(&self, path: &Path, window: &TimeWindow) -> Result<Parsed<InteractionTimes>> {
        debug!(path = %path.display(), "scanning interaction log");
        let content = read_text(path)?;
        Ok(self.extract_str(&content, window, path))
    }

    /// Scan log text already in memory; `path` is only used for diagnostics.
    pub fn extract_str(
        &self,
        content: &str,
        window: &TimeWindow,
        path: &Path,
    ) -> Parsed<InteractionTimes> {
        let mut times = InteractionTimes::default();
        let mut reference: Option<NaiveDateTime> = None;
        let mut skipped = 0usize;

        for line in lines(content) {
            if line.trim().is_empty() {
                continue;
            }
            let Some((at, event, message)) = split_event(line) else {
                skipped += 1;
                continue;
            };
            if !window.contains(at) {
                // events are chronological: past the end nothing else counts
                if at > window.end {
                    break;
                }
                continue;
            }

            match event {
                BLUR_EVENT => reference = None,
                FOCUS_EVENT => reference = Some(at),
                _ => {
                    if let Some(last) = reference {
                        let delta = at - last;
                        // out-of-order events add nothing but still move the reference
                        if delta > TimeDelta::zero() {
                            times.interaction += delta;
                            if delta < self.threshold {
                                times.implementation += delta;
                            }
                        }
                        reference = Some(at);
                    }
                    if event == SUBMIT_EVENT && message.starts_with(SUCCESS_PREFIX) {
                        break;
                    }
                }
            }
        }

        let mut diagnostics = Vec::new();
        if skipped > 0 {
            diagnostics.push(Diagnostic {
                field: Some("event"),
                ..Diagnostic::new(
                    ErrorKind::FieldParse,
                    path,
                    format!("skipped {skipped} malformed event line(s)"),
                )
            });
        }
        Parsed::with_diagnostics(times, diagnostics)
    }
}

/// Split `timestamp#event#message`. The message may contain `#`.
fn split_event(line: &str) -> Option<(NaiveDateTime, &str, &str)> {
    let (timestamp, rest) = line.split_once('#')?;
    let (event, message) = rest.split_once('#').unwrap_or((rest, ""));
    let at = NaiveDateTime::parse_from_str(timestamp.trim(), EVENT_TIME_FORMAT).ok()?;
    Some((at, event.trim(), message))
}
