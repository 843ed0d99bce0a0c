//! Parse errors. No `thiserror` here: the error type is hand-rolled and
//! carries only structured fields, with message assembly left to `Display`.

use crate::span::Span;
use std::fmt;

/// A 1-based line/column position, computed on demand from a byte offset --
/// nothing on the hot parsing path tracks line/column eagerly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// The line/column of byte offset `at` within `source`, counting lines
    /// by `\n` and columns by byte (not grapheme) distance from the
    /// preceding newline. `at` may equal `source.len()` (end-of-input).
    pub fn locate(source: &str, at: u32) -> Position {
        let at = at as usize;
        let prefix = &source[..at.min(source.len())];
        let line = prefix.bytes().filter(|&b| b == b'\n').count() as u32 + 1;
        let column = match prefix.rfind('\n') {
            Some(nl) => (at - nl) as u32,
            None => at as u32 + 1,
        };
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong. Carries no localized message text of its own -- that is
/// assembled once, in [`ParseError`]'s `Display` impl, from the structured
/// fields here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token could not be formed at all (e.g. an unterminated string).
    Lexical,
    /// Tokens were well-formed but did not match the grammar at this point
    /// (e.g. a dangling operator, an unclosed `(`).
    Structural { expected: &'static str, found: String },
    /// The tokens and the overall shape were fine, but a specific
    /// construct's own rules were violated (e.g. a static member access
    /// whose bracketed name is not a type name).
    Semantic { detail: &'static str },
}

/// A single parse failure, anchored at the byte offset where the parser
/// gave up (invariant: parsing is whole-or-nothing -- there is never more
/// than one `ParseError` per failed parse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: u32) -> Self {
        ParseError { kind, offset }
    }

    pub fn lexical(offset: u32) -> Self {
        ParseError::new(ParseErrorKind::Lexical, offset)
    }

    pub fn structural(expected: &'static str, found: impl Into<String>, offset: u32) -> Self {
        ParseError::new(ParseErrorKind::Structural { expected, found: found.into() }, offset)
    }

    pub fn semantic(detail: &'static str, offset: u32) -> Self {
        ParseError::new(ParseErrorKind::Semantic { detail }, offset)
    }

    /// The human-facing position of this error within `source`. `source`
    /// must be the same text the failed parse was run over.
    pub fn position(&self, source: &str) -> Position {
        Position::locate(source, self.offset)
    }

    pub fn at<'a>(&self, source: &'a str) -> Span<'a> {
        Span::new(self.offset, &source[self.offset as usize..self.offset as usize])
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at byte {}: ", self.offset)?;
        match &self.kind {
            ParseErrorKind::Lexical => write!(f, "could not form a valid token"),
            ParseErrorKind::Structural { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseErrorKind::Semantic { detail } => write!(f, "{detail}"),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_counts_lines_and_columns() {
        let source = "abc\ndef\nghi";
        assert_eq!(Position::locate(source, 0), Position { line: 1, column: 1 });
        assert_eq!(Position::locate(source, 4), Position { line: 2, column: 1 });
        assert_eq!(Position::locate(source, 9), Position { line: 3, column: 2 });
    }

    #[test]
    fn display_renders_structural_detail() {
        let err = ParseError::structural("')'", "end of input", 7);
        assert_eq!(err.to_string(), "at byte 7: expected ')', found end of input");
    }
}
