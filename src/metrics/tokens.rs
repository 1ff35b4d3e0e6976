//! Python tokenizer shared by the metrics groups
//!
//! Produces a flat token stream with physical newlines kept, so callers can
//! rebuild logical lines (newlines inside brackets do not end a statement).
//! Whitespace and backslash continuations are dropped.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Python keywords (soft keywords such as `match`/`case` are names).
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"(?P<ws>[ \t\x0C\r]+)",
        r"|(?P<nl>\n)",
        r"|(?P<cont>\\\r?\n)",
        r"|(?P<comment>#[^\r\n]*)",
        r#"|(?P<string>[rRbBuUfF]{0,2}(?:"(?:[^"\\\r\n]|\\(?s:.))*"|'(?:[^'\\\r\n]|\\(?s:.))*'))"#,
        r"|(?P<number>0[xXoObB][0-9a-fA-F_]+|(?:\d[\d_]*(?:\.[\d_]*)?|\.\d[\d_]*)(?:[eE][+-]?\d[\d_]*)?[jJ]?)",
        r"|(?P<name>[\p{XID_Start}_]\p{XID_Continue}*)",
        r"|(?P<op>\*\*=|//=|>>=|<<=|\.\.\.|->|:=|==|!=|<=|>=|<>|\*\*|//|<<|>>|[-+*/%&|^@]=|[-+*/%&|^~<>=.,:;@()\[\]{}])",
        r")"
    ))
    .expect("TOKEN_PATTERN regex is invalid")
});

static TRIPLE_QUOTE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[rRbBuUfF]{0,2}("""|''')"#).expect("TRIPLE_QUOTE_START regex is invalid")
});

/// Why a source file could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("unterminated string starting on line {line}")]
    UnterminatedString { line: usize },
    #[error("unexpected character {ch:?} on line {line}")]
    UnexpectedCharacter { line: usize, ch: char },
    #[error("unmatched {found:?} on line {line}")]
    UnbalancedBracket { line: usize, found: char },
    #[error("{open:?} opened on line {line} is never closed")]
    UnclosedBracket { line: usize, open: char },
    #[error("unindent does not match any outer indentation level on line {line}")]
    InconsistentDedent { line: usize },
    #[error("unexpected indent on line {line}")]
    UnexpectedIndent { line: usize },
    #[error("expected an indented block after line {line}")]
    ExpectedIndent { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Keyword,
    Number,
    String,
    Operator,
    Comment,
    Newline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// 1-indexed line where the token starts.
    pub line: usize,
    /// 1-indexed line where the token ends (differs for multi-line strings).
    pub end_line: usize,
    /// Indentation width when the token opens its line, byte offset otherwise.
    pub column: usize,
}

impl Token<'_> {
    pub fn is_op(&self, text: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == text
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == text
    }
}

/// Tokenize Python source.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, SourceError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut line_start = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let column = column_of(&source[line_start..pos]);

        if let Some(open) = TRIPLE_QUOTE_START.captures(rest) {
            let (Some(whole), Some(quote)) = (open.get(0), open.get(1)) else {
                return Err(SourceError::UnterminatedString { line });
            };
            let body = &rest[whole.end()..];
            let close = find_closing(body, quote.as_str())
                .ok_or(SourceError::UnterminatedString { line })?;
            let len = whole.end() + close + quote.len();
            let text = &rest[..len];
            let newlines = text.matches('\n').count();
            tokens.push(Token {
                kind: TokenKind::String,
                text,
                line,
                end_line: line + newlines,
                column,
            });
            if let Some(last_nl) = text.rfind('\n') {
                line_start = pos + last_nl + 1;
            }
            line += newlines;
            pos += len;
            continue;
        }

        let Some(caps) = TOKEN_PATTERN.captures(rest) else {
            return Err(unexpected(rest, line));
        };
        let Some(whole) = caps.get(0).filter(|m| !m.is_empty()) else {
            return Err(unexpected(rest, line));
        };
        let text = whole.as_str();

        let kind = if caps.name("ws").is_some() {
            None
        } else if caps.name("nl").is_some() {
            Some(TokenKind::Newline)
        } else if caps.name("cont").is_some() {
            None
        } else if caps.name("comment").is_some() {
            Some(TokenKind::Comment)
        } else if caps.name("string").is_some() {
            Some(TokenKind::String)
        } else if caps.name("number").is_some() {
            Some(TokenKind::Number)
        } else if caps.name("name").is_some() {
            if KEYWORDS.contains(&text) {
                Some(TokenKind::Keyword)
            } else {
                Some(TokenKind::Name)
            }
        } else {
            Some(TokenKind::Operator)
        };

        let newlines = text.matches('\n').count();
        if let Some(kind) = kind {
            tokens.push(Token {
                kind,
                text,
                line,
                end_line: line + newlines,
                column,
            });
        }
        if let Some(last_nl) = text.rfind('\n') {
            line_start = pos + last_nl + 1;
        }
        line += newlines;
        pos += text.len();
    }

    Ok(tokens)
}

/// Group tokens into logical lines, dropping comments and newlines.
///
/// Newlines inside brackets do not end a logical line. Unbalanced closing
/// brackets are tolerated here; [`check_structure`] reports them.
pub fn logical_lines<'a>(tokens: &[Token<'a>]) -> Vec<Vec<Token<'a>>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut depth: usize = 0;

    for tok in tokens {
        match tok.kind {
            TokenKind::Newline => {
                if depth == 0 && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            TokenKind::Comment => {}
            TokenKind::Operator => {
                match tok.text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
                current.push(*tok);
            }
            _ => current.push(*tok),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Check bracket balance and block indentation.
pub fn check_structure(tokens: &[Token<'_>]) -> Result<(), SourceError> {
    let mut open: Vec<(char, usize)> = Vec::new();
    for tok in tokens.iter().filter(|t| t.kind == TokenKind::Operator) {
        match tok.text {
            "(" => open.push(('(', tok.line)),
            "[" => open.push(('[', tok.line)),
            "{" => open.push(('{', tok.line)),
            ")" | "]" | "}" => {
                let found = tok.text.chars().next().unwrap_or(')');
                let expected = match found {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match open.pop() {
                    Some((o, _)) if o == expected => {}
                    _ => {
                        return Err(SourceError::UnbalancedBracket {
                            line: tok.line,
                            found,
                        });
                    }
                }
            }
            _ => {}
        }
    }
    if let Some(&(open, line)) = open.last() {
        return Err(SourceError::UnclosedBracket { line, open });
    }

    let mut indents = vec![0usize];
    let mut block_opened_at: Option<usize> = None;
    for logical in logical_lines(tokens) {
        let (Some(first), Some(last)) = (logical.first(), logical.last()) else {
            continue;
        };
        let indent = first.column;
        let top = indents.last().copied().unwrap_or(0);

        if indent > top {
            if block_opened_at.is_none() {
                return Err(SourceError::UnexpectedIndent { line: first.line });
            }
            indents.push(indent);
        } else {
            if let Some(line) = block_opened_at {
                return Err(SourceError::ExpectedIndent { line });
            }
            while indents.last().is_some_and(|&i| indent < i) {
                indents.pop();
            }
            if indents.last() != Some(&indent) {
                return Err(SourceError::InconsistentDedent { line: first.line });
            }
        }

        block_opened_at = last.is_op(":").then_some(last.line);
    }
    if let Some(line) = block_opened_at {
        return Err(SourceError::ExpectedIndent { line });
    }

    Ok(())
}

/// Indentation width (tabs to multiples of 8) when `prefix` is pure
/// whitespace, byte length otherwise.
fn column_of(prefix: &str) -> usize {
    if !prefix.chars().all(|c| matches!(c, ' ' | '\t' | '\x0C')) {
        return prefix.len();
    }
    prefix.chars().fold(0, |width, c| match c {
        '\t' => (width / 8 + 1) * 8,
        '\x0C' => 0,
        _ => width + 1,
    })
}

/// Byte offset of the closing `quote` in `body`, honouring backslash escapes.
fn find_closing(body: &str, quote: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let needle = quote.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(needle) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn unexpected(rest: &str, line: usize) -> SourceError {
    let unquoted = rest.trim_start_matches(['r', 'R', 'b', 'B', 'u', 'U', 'f', 'F']);
    match rest.chars().next() {
        _ if unquoted.starts_with('"') || unquoted.starts_with('\'') => {
            SourceError::UnterminatedString { line }
        }
        Some(ch) => SourceError::UnexpectedCharacter { line, ch },
        None => SourceError::UnexpectedCharacter { line, ch: '\0' },
    }
}
