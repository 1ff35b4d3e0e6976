//! Activity descriptor parsing (`assessments/<id>.data`)
//!
//! Each line starts with a fixed key. Titles and class names may contain
//! colons, so every value is cut right after its key instead of being split
//! on `:`.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::RecordParser;
use crate::diagnostics::{Diagnostic, Parsed, recover};
use crate::error::Result;
use crate::fields::{parse_activity_time, parse_field, value_after_any_key, value_after_key};
use crate::file_utils::{lines, read_text};
use crate::model::{Activity, ExerciseBlock};
use crate::walker::parse_id;

pub const ACTIVITY_SUFFIX: &str = ".data";

const TITLE_KEYS: &[&str] = &["---- assessment title:", "---- assessment name:"];
const CLASS_NUMBER_KEY: &str = "---- class number:";
const CLASS_NAME_KEY: &str = "---- class name:";
const START_KEY: &str = "---- start:";
const END_KEY: &str = "---- end:";
const LANGUAGE_KEY: &str = "---- language:";
const TYPE_KEY: &str = "---- type:";
const WEIGHT_KEY: &str = "---- weight:";
const TOTAL_KEYS: &[&str] = &["---- total questions:", "---- total exercises:"];

/// Separator between substitutable exercises in one block.
const ALTERNATIVE_SEPARATOR: &str = " or ";

/// `---- exercise #3: 10 or 3 or 7` (the `#` is optional).
static EXERCISE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^----\s+exercise\s*#?\s*\d+\s*:(.*)$").expect("EXERCISE_PATTERN regex is invalid")
});

/// Parser for activity descriptor files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityParser;

impl ActivityParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse descriptor text for the activity `id`.
    pub fn parse_str(&self, id: u32, content: &str, path: &Path) -> Parsed<Activity> {
        let mut activity = Activity {
            id,
            ..Default::default()
        };
        let mut diagnostics = Vec::new();

        for line in lines(content) {
            if let Some(v) = value_after_any_key(line, TITLE_KEYS) {
                activity.title = non_empty(v);
            } else if let Some(v) = value_after_key(line, CLASS_NUMBER_KEY) {
                activity.class_number =
                    parsed(v, |v| parse_field("class number", v), path, &mut diagnostics);
            } else if let Some(v) = value_after_key(line, CLASS_NAME_KEY) {
                activity.class_name = non_empty(v);
            } else if let Some(v) = value_after_key(line, START_KEY) {
                activity.start =
                    parsed(v, |v| parse_activity_time("start", v), path, &mut diagnostics);
            } else if let Some(v) = value_after_key(line, END_KEY) {
                activity.end =
                    parsed(v, |v| parse_activity_time("end", v), path, &mut diagnostics);
            } else if let Some(v) = value_after_key(line, LANGUAGE_KEY) {
                activity.language = non_empty(v);
            } else if let Some(v) = value_after_key(line, TYPE_KEY) {
                activity.kind = non_empty(v);
            } else if let Some(v) = value_after_key(line, WEIGHT_KEY) {
                activity.weight =
                    parsed(v, |v| parse_field("weight", v), path, &mut diagnostics);
            } else if let Some(v) = value_after_any_key(line, TOTAL_KEYS) {
                activity.exercise_block_count =
                    parsed(v, |v| parse_field("total questions", v), path, &mut diagnostics);
            } else if let Some(caps) = EXERCISE_PATTERN.captures(line) {
                let raw = caps.get(1).map_or("", |m| m.as_str());
                match recover(parse_block(raw), path, &mut diagnostics) {
                    Some(Some(block)) => activity.exercise_blocks.push(block),
                    Some(None) => debug!(path = %path.display(), "skipping empty exercise line"),
                    None => {}
                }
            }
        }

        Parsed::with_diagnostics(activity, diagnostics)
    }
}

impl RecordParser for ActivityParser {
    type Output = Activity;

    fn parse(&self, path: &Path) -> Result<Parsed<Activity>> {
        debug!(path = %path.display(), "parsing activity");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let id = parse_id(name.strip_suffix(ACTIVITY_SUFFIX).unwrap_or(&name), path)?;
        let content = read_text(path)?;
        Ok(self.parse_str(id, &content, path))
    }

    fn name(&self) -> &'static str {
        "activity"
    }
}

/// Parse one exercise-block value.
///
/// Returns `Ok(None)` for an empty value. Alternatives are returned sorted
/// and without duplicates.
pub fn parse_block(raw: &str) -> Result<Option<ExerciseBlock>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.contains(ALTERNATIVE_SEPARATOR) {
        let mut ids = raw
            .split(ALTERNATIVE_SEPARATOR)
            .map(|token| parse_field::<u32>("exercise", token))
            .collect::<Result<Vec<_>>>()?;
        ids.sort_unstable();
        ids.dedup();
        return Ok(Some(ExerciseBlock::Alternatives(ids)));
    }
    parse_field("exercise", raw).map(|id| Some(ExerciseBlock::Single(id)))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse a non-empty value, recording a failure as a diagnostic.
fn parsed<T>(
    value: &str,
    parse: impl FnOnce(&str) -> Result<T>,
    path: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<T> {
    if value.is_empty() {
        return None;
    }
    recover(parse(value), path, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = "\
---- assessment title: Lists: part 2
---- class number: 321
---- class name: Algoritmos: Turma A
---- start: 2020-01-01 00:00
---- end: 2020-01-02 00:00
---- language: python
---- type: exam
---- weight: 2.5
---- total questions: 3
---- exercise #1: 5
---- exercise #2: 10 or 3 or 7
---- exercise #3:
";

    fn parse(content: &str) -> Parsed<Activity> {
        ActivityParser::new().parse_str(42, content, Path::new("42.data"))
    }

    #[test]
    fn test_parse_all_fields() {
        let parsed = parse(DESCRIPTOR);
        assert!(parsed.is_clean());
        let a = parsed.value;
        assert_eq!(a.id, 42);
        assert_eq!(a.title.as_deref(), Some("Lists: part 2"));
        assert_eq!(a.class_number, Some(321));
        assert_eq!(a.class_name.as_deref(), Some("Algoritmos: Turma A"));
        assert_eq!(a.start.unwrap().to_string(), "2020-01-01 00:00:00");
        assert_eq!(a.end.unwrap().to_string(), "2020-01-02 00:00:00");
        assert_eq!(a.language.as_deref(), Some("python"));
        assert_eq!(a.kind.as_deref(), Some("exam"));
        assert_eq!(a.weight, Some(2.5));
        assert_eq!(a.exercise_block_count, Some(3));
    }

    #[test]
    fn test_blocks_skip_empty_lines_and_keep_file_order() {
        let a = parse(DESCRIPTOR).value;
        assert_eq!(
            a.exercise_blocks,
            vec![
                ExerciseBlock::Single(5),
                ExerciseBlock::Alternatives(vec![3, 7, 10]),
            ]
        );
    }

    #[test]
    fn test_parse_block_sorts_alternatives() {
        assert_eq!(
            parse_block("10 or 3 or 7").unwrap(),
            Some(ExerciseBlock::Alternatives(vec![3, 7, 10]))
        );
        assert_eq!(
            parse_block(" 4 or 4 ").unwrap(),
            Some(ExerciseBlock::Alternatives(vec![4]))
        );
        assert_eq!(parse_block("  ").unwrap(), None);
        assert_eq!(parse_block("12").unwrap(), Some(ExerciseBlock::Single(12)));
    }

    #[test]
    fn test_bad_block_token_is_diagnosed_and_skipped() {
        let parsed = parse("---- exercise #1: 3 or x\n---- exercise #2: 8\n");
        assert_eq!(parsed.value.exercise_blocks, vec![ExerciseBlock::Single(8)]);
        assert_eq!(parsed.diagnostics_of(ErrorKind::FieldParse).count(), 1);
    }

    #[test]
    fn test_malformed_weight_keeps_other_fields() {
        let parsed = parse("---- weight: heavy\n---- total questions: 2\n");
        assert_eq!(parsed.value.weight, None);
        assert_eq!(parsed.value.exercise_block_count, Some(2));
        let diags: Vec<_> = parsed.diagnostics_of(ErrorKind::FieldParse).collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].field, Some("weight"));
    }

    #[test]
    fn test_bad_start_leaves_window_unset() {
        let parsed = parse("---- start: soon\n---- end: 2020-01-02 00:00\n");
        assert!(parsed.value.window().is_none());
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn test_assessment_name_key() {
        let a = parse("---- assessment name: Lista 1\n").value;
        assert_eq!(a.title.as_deref(), Some("Lista 1"));
    }

    #[test]
    fn test_parse_reads_id_from_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1042.data");
        fs::write(&path, DESCRIPTOR).unwrap();
        let parsed = ActivityParser::new().parse(&path).unwrap();
        assert_eq!(parsed.value.id, 1042);
    }

    #[test]
    fn test_parse_rejects_non_numeric_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.data");
        fs::write(&path, DESCRIPTOR).unwrap();
        let err = ActivityParser::new().parse(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedIdentifier);
    }
}
