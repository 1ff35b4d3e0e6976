//! Value extraction from fixed-prefix and key:value lines.
//!
//! Dataset descriptor lines look like `---- start: 2020-01-01 00:00`. Values
//! may themselves contain colons (titles, class names), so values are cut at
//! a fixed column right after the literal key rather than split on `:`.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::{ExtractError, Result};

/// Timestamp formats accepted for activity windows.
const ACTIVITY_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Slice `line` from a fixed byte column, trimmed.
///
/// Returns `None` when the line is shorter than the column.
pub fn value_at_column(line: &str, column: usize) -> Option<&str> {
    line.get(column..).map(str::trim)
}

/// If `line` starts with `key`, return the trimmed text after it.
///
/// ```
/// use codebench_etl::fields::value_after_key;
///
/// let line = "---- assessment title: Lists: part 2";
/// assert_eq!(value_after_key(line, "---- assessment title:"), Some("Lists: part 2"));
/// assert_eq!(value_after_key(line, "---- start:"), None);
/// ```
pub fn value_after_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    if line.starts_with(key) {
        value_at_column(line, key.len())
    } else {
        None
    }
}

/// Try each key in order and return the value after the first one that matches.
pub fn value_after_any_key<'a>(line: &'a str, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| value_after_key(line, key))
}

/// Value of a `key: value` line: the text starting two characters after the
/// first `:` (skipping `": "`). `None` when the line has no colon.
pub fn key_value(line: &str) -> Option<&str> {
    let idx = line.find(':')?;
    let mut rest = line[idx + 1..].chars();
    rest.next();
    Some(rest.as_str())
}

/// Parse a field value, naming the field in the error.
pub fn parse_field<T>(field: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ExtractError::FieldParse {
            field,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Parse an activity window timestamp (`YYYY-MM-DD HH:MM`, seconds optional).
pub fn parse_activity_time(field: &'static str, raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    ACTIVITY_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ExtractError::FieldParse {
            field,
            value: raw.to_string(),
            reason: "expected YYYY-MM-DD HH:MM".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_value_at_column() {
        assert_eq!(value_at_column("---- weight: 2.5 ", 12), Some("2.5"));
        assert_eq!(value_at_column("short", 12), None);
    }

    #[test]
    fn test_value_after_key_keeps_colons() {
        let line = "---- class name: Algoritmos: Turma A";
        assert_eq!(
            value_after_key(line, "---- class name:"),
            Some("Algoritmos: Turma A")
        );
    }

    #[test]
    fn test_value_after_any_key_order() {
        const KEYS: &[&str] = &["---- assessment title:", "---- assessment name:"];
        assert_eq!(
            value_after_any_key("---- assessment name: Lista 1", KEYS),
            Some("Lista 1")
        );
        assert_eq!(value_after_any_key("---- language: python", KEYS), None);
    }

    #[test]
    fn test_key_value() {
        assert_eq!(key_value("---- sex: female"), Some("female"));
        assert_eq!(key_value("---- high school name: Escola: Centro"), Some("Escola: Centro"));
        assert_eq!(key_value("---- sex:"), Some(""));
        assert_eq!(key_value("no colon here"), None);
    }

    #[test]
    fn test_parse_field_error_names_field() {
        let err = parse_field::<f64>("weight", "abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldParse);
        assert_eq!(err.field(), Some("weight"));
        assert_eq!(parse_field::<u32>("total", " 4 ").unwrap(), 4);
    }

    #[test]
    fn test_parse_activity_time() {
        let t = parse_activity_time("start", "2020-01-01 08:30").unwrap();
        assert_eq!(t.to_string(), "2020-01-01 08:30:00");
        let t = parse_activity_time("end", "2020-01-02 00:00:15").unwrap();
        assert_eq!(t.to_string(), "2020-01-02 00:00:15");
        assert!(parse_activity_time("start", "yesterday").is_err());
    }
}
