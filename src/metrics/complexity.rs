//! Cyclomatic complexity summed over the whole file

use super::ComplexityMetrics;
use super::tokens::{SourceError, TokenKind, check_structure, logical_lines, tokenize};

/// Keywords that each add one independent path.
const DECISION_KEYWORDS: &[&str] = &["if", "elif", "for", "while", "except", "and", "or", "assert"];

/// Module complexity: 1 for the module body, plus 1 per function, plus 1 per
/// decision point. Source with unbalanced brackets or broken indentation is
/// rejected.
pub fn complexity_metrics(source: &str) -> Result<ComplexityMetrics, SourceError> {
    let tokens = tokenize(source)?;
    check_structure(&tokens)?;

    let mut metrics = ComplexityMetrics::default();
    let mut decisions = 0;
    for tok in tokens.iter().filter(|t| t.kind == TokenKind::Keyword) {
        match tok.text {
            "def" => metrics.n_functions += 1,
            "class" => metrics.n_classes += 1,
            kw if DECISION_KEYWORDS.contains(&kw) => decisions += 1,
            _ => {}
        }
    }

    // `case` is a soft keyword: only counts when it opens a block
    decisions += logical_lines(&tokens)
        .iter()
        .filter(|line| {
            matches!(
                (line.first(), line.last()),
                (Some(first), Some(last))
                    if first.kind == TokenKind::Name && first.text == "case" && last.is_op(":")
            )
        })
        .count() as u32;

    metrics.complexity = 1 + metrics.n_functions + decisions;
    Ok(metrics)
}
