//! Raw line counts
//!
//! Every physical line falls in exactly one of four buckets (source, standalone
//! multi-line string, comment-only, blank), so
//! `sloc + multi + single_comments + blank == loc` always holds.

use super::RawMetrics;
use super::tokens::{SourceError, TokenKind, logical_lines, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Blank,
    Code,
    Multi,
    Unclassified,
}

pub fn raw_metrics(source: &str) -> Result<RawMetrics, SourceError> {
    let tokens = tokenize(source)?;

    let mut classes: Vec<LineClass> = source
        .lines()
        .map(|l| {
            if l.trim().is_empty() {
                LineClass::Blank
            } else {
                LineClass::Unclassified
            }
        })
        .collect();

    let logical = logical_lines(&tokens);
    let mut lloc = 0;
    for line in &logical {
        match line.as_slice() {
            [only] if only.kind == TokenKind::String && only.end_line > only.line => {
                mark(&mut classes, only.line, only.end_line, LineClass::Multi);
            }
            toks => {
                for tok in toks {
                    mark(&mut classes, tok.line, tok.end_line, LineClass::Code);
                }
            }
        }
        // `a = 1; b = 2` is two statements
        let separators = line
            .iter()
            .enumerate()
            .filter(|(i, t)| t.is_op(";") && *i + 1 < line.len())
            .count();
        lloc += 1 + separators;
    }

    let comment_lines: Vec<usize> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .map(|t| t.line)
        .collect();

    let mut metrics = RawMetrics {
        loc: classes.len() as u32,
        lloc: lloc as u32,
        comments: comment_lines.len() as u32,
        ..Default::default()
    };
    for (idx, class) in classes.iter().enumerate() {
        match class {
            LineClass::Blank => metrics.blank += 1,
            LineClass::Code => metrics.sloc += 1,
            LineClass::Multi => metrics.multi += 1,
            LineClass::Unclassified if comment_lines.contains(&(idx + 1)) => {
                metrics.single_comments += 1
            }
            // e.g. a lone line-continuation backslash
            LineClass::Unclassified => metrics.sloc += 1,
        }
    }

    Ok(metrics)
}

fn mark(classes: &mut [LineClass], from: usize, to: usize, class: LineClass) {
    for line in from..=to {
        if let Some(slot) = line.checked_sub(1).and_then(|i| classes.get_mut(i)) {
            *slot = class;
        }
    }
}
