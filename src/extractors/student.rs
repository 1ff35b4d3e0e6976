//! Student profile parsing (`users/<id>/user.data`)
//!
//! The file has a header line followed by one `---- key: value` line per
//! field at a fixed position. In strict mode a field is read only when both
//! its line index and its prefix match, so a file whose layout drifted by a
//! single line yields an empty profile rather than shifted values.

use std::path::Path;

use tracing::debug;

use super::RecordParser;
use crate::config::ProfileScanMode;
use crate::diagnostics::{Diagnostic, Parsed, recover};
use crate::error::Result;
use crate::fields::{key_value, parse_field};
use crate::file_utils::{lines, read_text};
use crate::model::{ProfileMatch, StudentProfile};

pub const PROFILE_FILE: &str = "user.data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    CourseId,
    CourseName,
    InstitutionId,
    InstitutionName,
    HighSchoolName,
    HighSchoolType,
    HighSchoolShift,
    HighSchoolGradYear,
    Sex,
    BirthYear,
    MaritalStatus,
    HasChildren,
}

/// `(line index, prefix, field)` for every profile field.
const LAYOUT: [(usize, &str, Field); 12] = [
    (1, "---- course id", Field::CourseId),
    (2, "---- course name", Field::CourseName),
    (3, "---- institution id", Field::InstitutionId),
    (4, "---- institution name", Field::InstitutionName),
    (5, "---- high school", Field::HighSchoolName),
    (6, "---- school type", Field::HighSchoolType),
    (7, "---- shift", Field::HighSchoolShift),
    (8, "---- graduation", Field::HighSchoolGradYear),
    (9, "---- sex", Field::Sex),
    (10, "---- year of birth", Field::BirthYear),
    (11, "---- civil", Field::MaritalStatus),
    (12, "---- have children", Field::HasChildren),
];

/// Parser for student profile files.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentProfileParser {
    mode: ProfileScanMode,
}

impl StudentProfileParser {
    pub fn new(mode: ProfileScanMode) -> Self {
        Self { mode }
    }

    pub fn parse_str(&self, content: &str, path: &Path) -> Parsed<StudentProfile> {
        let lines: Vec<&str> = lines(content).map(str::trim).collect();
        let mut profile = StudentProfile::default();
        let mut diagnostics = Vec::new();

        let mut matched = 0;
        for (index, line) in lines.iter().enumerate() {
            if let Some(&(_, _, field)) = LAYOUT
                .iter()
                .find(|(i, prefix, _)| *i == index && line.starts_with(prefix))
            {
                assign(&mut profile, field, line, path, &mut diagnostics);
                matched += 1;
            }
        }

        if matched > 0 {
            profile.matched_by = ProfileMatch::LineIndex;
        } else if self.mode == ProfileScanMode::PrefixFallback {
            let mut assigned = [false; LAYOUT.len()];
            for line in &lines {
                let slot = LAYOUT
                    .iter()
                    .enumerate()
                    .find(|(slot, (_, prefix, _))| !assigned[*slot] && line.starts_with(prefix));
                if let Some((slot, &(_, _, field))) = slot {
                    assigned[slot] = true;
                    assign(&mut profile, field, line, path, &mut diagnostics);
                    matched += 1;
                }
            }
            if matched > 0 {
                debug!(path = %path.display(), matched, "profile matched by prefix only");
                profile.matched_by = ProfileMatch::PrefixScan;
            }
        }

        Parsed::with_diagnostics(profile, diagnostics)
    }
}

impl RecordParser for StudentProfileParser {
    type Output = StudentProfile;

    fn parse(&self, path: &Path) -> Result<Parsed<StudentProfile>> {
        debug!(path = %path.display(), "parsing student profile");
        let content = read_text(path)?;
        Ok(self.parse_str(&content, path))
    }

    fn name(&self) -> &'static str {
        "student"
    }
}

fn assign(
    profile: &mut StudentProfile,
    field: Field,
    line: &str,
    path: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(value) = key_value(line).map(str::trim) else {
        return;
    };
    // a present children line with any value other than "yes" is false
    if value.is_empty() && field != Field::HasChildren {
        return;
    }
    let text = || Some(value.to_string());
    match field {
        Field::CourseId => {
            profile.course_id = recover(parse_field("course id", value), path, diagnostics)
        }
        Field::CourseName => profile.course_name = text(),
        Field::InstitutionId => {
            profile.institution_id =
                recover(parse_field("institution id", value), path, diagnostics)
        }
        Field::InstitutionName => profile.institution_name = text(),
        Field::HighSchoolName => profile.high_school_name = text(),
        Field::HighSchoolType => profile.high_school_type = text(),
        Field::HighSchoolShift => profile.high_school_shift = text(),
        Field::HighSchoolGradYear => {
            profile.high_school_grad_year =
                recover(parse_field("graduation year", value), path, diagnostics)
        }
        Field::Sex => profile.sex = text(),
        Field::BirthYear => {
            profile.birth_year = recover(parse_field("year of birth", value), path, diagnostics)
        }
        Field::MaritalStatus => profile.marital_status = text(),
        Field::HasChildren => profile.has_children = Some(value.eq_ignore_ascii_case("yes")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::profile_text;

    fn strict(content: &str) -> Parsed<StudentProfile> {
        StudentProfileParser::default().parse_str(content, Path::new("user.data"))
    }

    #[test]
    fn test_all_fields_at_expected_lines() {
        let parsed = strict(&profile_text());
        assert!(parsed.is_clean());
        let p = parsed.value;
        assert_eq!(p.course_id, Some(12));
        assert_eq!(p.course_name.as_deref(), Some("Computer Science"));
        assert_eq!(p.institution_id, Some(3));
        assert_eq!(p.institution_name.as_deref(), Some("UFAM: Campus Manaus"));
        assert_eq!(p.high_school_name.as_deref(), Some("Escola Estadual"));
        assert_eq!(p.high_school_type.as_deref(), Some("public"));
        assert_eq!(p.high_school_shift.as_deref(), Some("morning"));
        assert_eq!(p.high_school_grad_year, Some(2015));
        assert_eq!(p.sex.as_deref(), Some("female"));
        assert_eq!(p.birth_year, Some(1998));
        assert_eq!(p.marital_status.as_deref(), Some("single"));
        assert_eq!(p.has_children, Some(true));
        assert_eq!(p.matched_by, ProfileMatch::LineIndex);
        assert_eq!(p.populated_fields(), 12);
    }

    #[test]
    fn test_shifted_layout_yields_empty_profile() {
        let shifted = format!("\n{}", profile_text());
        let parsed = strict(&shifted);
        assert!(parsed.is_clean());
        assert_eq!(parsed.value.populated_fields(), 0);
        assert_eq!(parsed.value.matched_by, ProfileMatch::Unmatched);
    }

    #[test]
    fn test_prefix_fallback_recovers_shifted_layout() {
        let shifted = format!("\n{}", profile_text());
        let parsed = StudentProfileParser::new(ProfileScanMode::PrefixFallback)
            .parse_str(&shifted, Path::new("user.data"));
        assert_eq!(parsed.value.populated_fields(), 12);
        assert_eq!(parsed.value.matched_by, ProfileMatch::PrefixScan);
    }

    #[test]
    fn test_has_children_is_case_insensitive_yes() {
        let text = profile_text().replace("have children: YES", "have children: Yes");
        assert_eq!(strict(&text).value.has_children, Some(true));
        let text = profile_text().replace("have children: YES", "have children: no");
        assert_eq!(strict(&text).value.has_children, Some(false));
    }

    #[test]
    fn test_empty_has_children_is_false() {
        let text = profile_text().replace("---- have children: YES", "---- have children:");
        let parsed = strict(&text);
        assert!(parsed.is_clean());
        assert_eq!(parsed.value.has_children, Some(false));
        assert_eq!(parsed.value.populated_fields(), 12);
    }

    #[test]
    fn test_bad_number_keeps_remaining_fields() {
        let text = profile_text().replace("year of birth: 1998", "year of birth: 19x8");
        let parsed = strict(&text);
        assert_eq!(parsed.value.birth_year, None);
        assert_eq!(parsed.value.marital_status.as_deref(), Some("single"));
        assert_eq!(parsed.value.populated_fields(), 11);
        let diags: Vec<_> = parsed.diagnostics_of(ErrorKind::FieldParse).collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].field, Some("year of birth"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let text = profile_text().replace("---- sex: female", "---- sex:");
        let parsed = strict(&text);
        assert!(parsed.is_clean());
        assert_eq!(parsed.value.sex, None);
    }

    #[test]
    fn test_wrong_prefix_at_right_index_is_skipped() {
        let text = profile_text().replace("---- course id:", "---- program id:");
        assert_eq!(strict(&text).value.course_id, None);
    }
}
