//! Halstead software-science metrics
//!
//! Operators are the arithmetic, bitwise, comparison and augmented-assignment
//! symbols plus the boolean/membership keywords. Operands are the names and
//! literals that sit directly next to an operator, each occurrence counted
//! once even when it touches two operators.

use std::collections::{BTreeSet, HashSet};

use super::HalsteadMetrics;
use super::tokens::{SourceError, Token, TokenKind, check_structure, tokenize};

const SYMBOL_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "//", "%", "**", "@", "<<", ">>", "&", "|", "^", "~", "<", ">", "<=",
    ">=", "==", "!=", "<>", "+=", "-=", "*=", "/=", "//=", "%=", "**=", "@=", "<<=", ">>=", "&=",
    "|=", "^=",
];

const KEYWORD_OPERATORS: &[&str] = &["and", "or", "not", "in", "is"];

pub fn halstead_metrics(source: &str) -> Result<HalsteadMetrics, SourceError> {
    let tokens = tokenize(source)?;
    check_structure(&tokens)?;

    let code: Vec<Token<'_>> = tokens
        .into_iter()
        .filter(|t| !matches!(t.kind, TokenKind::Comment | TokenKind::Newline))
        .collect();

    let mut operators: Vec<&str> = Vec::new();
    let mut operand_positions = BTreeSet::new();
    let mut i = 0;
    while i < code.len() {
        let Some((op, width)) = operator_at(&code, i) else {
            i += 1;
            continue;
        };
        operators.push(op);
        if i > 0 && is_operand(&code[i - 1]) {
            operand_positions.insert(i - 1);
        }
        if code.get(i + width).is_some_and(is_operand) {
            operand_positions.insert(i + width);
        }
        i += width;
    }

    let distinct_operators: HashSet<&str> = operators.iter().copied().collect();
    let distinct_operands: HashSet<&str> = operand_positions.iter().map(|&p| code[p].text).collect();

    Ok(HalsteadMetrics::from_counts(
        distinct_operators.len() as u32,
        distinct_operands.len() as u32,
        operators.len() as u32,
        operand_positions.len() as u32,
    ))
}

/// The operator starting at `code[i]` and how many tokens it spans.
fn operator_at<'a>(code: &[Token<'a>], i: usize) -> Option<(&'a str, usize)> {
    let tok = code[i];
    let next = code.get(i + 1);
    match tok.kind {
        TokenKind::Operator if tok.text == "@" => {
            // a leading `@` is a decorator, not matrix multiplication
            let prev = i.checked_sub(1).map(|p| code[p]);
            prev.filter(|p| is_operand(p) || matches!(p.text, ")" | "]"))
                .map(|_| (tok.text, 1))
        }
        TokenKind::Operator if SYMBOL_OPERATORS.contains(&tok.text) => Some((tok.text, 1)),
        TokenKind::Keyword if tok.text == "not" && next.is_some_and(|n| n.is_keyword("in")) => {
            Some(("not in", 2))
        }
        TokenKind::Keyword if tok.text == "is" && next.is_some_and(|n| n.is_keyword("not")) => {
            Some(("is not", 2))
        }
        TokenKind::Keyword if KEYWORD_OPERATORS.contains(&tok.text) => Some((tok.text, 1)),
        _ => None,
    }
}

fn is_operand(tok: &Token<'_>) -> bool {
    match tok.kind {
        TokenKind::Name | TokenKind::Number | TokenKind::String => true,
        TokenKind::Keyword => matches!(tok.text, "True" | "False" | "None"),
        _ => false,
    }
}

impl HalsteadMetrics {
    /// Derive the full metric set from distinct (`h1`, `h2`) and total
    /// (`n1`, `n2`) operator/operand counts.
    pub fn from_counts(h1: u32, h2: u32, n1: u32, n2: u32) -> Self {
        let vocabulary = h1 + h2;
        let length = n1 + n2;
        let log2 = |x: u32| if x == 0 { 0.0 } else { (x as f64).log2() };

        let calculated_length = h1 as f64 * log2(h1) + h2 as f64 * log2(h2);
        let volume = length as f64 * log2(vocabulary);
        let difficulty = if h2 == 0 {
            0.0
        } else {
            (h1 as f64 / 2.0) * (n2 as f64 / h2 as f64)
        };
        let effort = difficulty * volume;

        Self {
            h1,
            h2,
            n1,
            n2,
            vocabulary,
            length,
            calculated_length,
            volume,
            difficulty,
            effort,
            bugs: volume / 3000.0,
            time: effort / 18.0,
        }
    }
}
