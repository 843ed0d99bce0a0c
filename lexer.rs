//! The single-pass, allocation-free tokeniser: a table of per-character
//! dispatch rules feeding a `Token` with a source span. No `LexState` is
//! needed here -- this grammar has no nested-brace template-string mode.

use crate::classify;
use crate::span::Span;
use crate::token::{StringFlags, Token, TokenKind};

/// A single-item cursor over a source text, advanced by [`Lexer::move_next`].
pub struct Lexer<'a> {
    source: &'a str,
    pos: u32,
    current: Token<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer { source, pos: 0, current: Token::new(TokenKind::EndOfInput, Span::empty_at(0)) };
        lexer.move_next();
        lexer
    }

    /// The token at the cursor (the last one produced by `move_next`, or
    /// the first token on a freshly constructed lexer).
    pub fn current(&self) -> Token<'a> {
        self.current
    }

    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Advance past the current token and lex the next one, which becomes
    /// the new `current`.
    pub fn move_next(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let rest = &self.source[self.pos as usize..];
        let token = if rest.is_empty() {
            Token::new(TokenKind::EndOfInput, Span::empty_at(self.pos))
        } else {
            self.scan_one(rest)
        };
        self.current = token;
        token
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.source[self.pos as usize..];
        let trimmed = rest.trim_start();
        self.pos += (rest.len() - trimmed.len()) as u32;
    }

    fn make(&mut self, kind: TokenKind, len: usize) -> Token<'a> {
        self.make_with_flags(kind, len, StringFlags::empty())
    }

    fn make_with_flags(&mut self, kind: TokenKind, len: usize, flags: StringFlags) -> Token<'a> {
        let span = Span::new(self.pos, &self.source[self.pos as usize..self.pos as usize + len]);
        self.pos += len as u32;
        Token { kind, span, flags }
    }

    fn scan_one(&mut self, rest: &str) -> Token<'a> {
        let c = rest.chars().next().unwrap();
        match c {
            '(' => self.make(TokenKind::LParen, 1),
            ')' => self.make(TokenKind::RParen, 1),
            '[' => self.make(TokenKind::LBracket, 1),
            ']' => self.make(TokenKind::RBracket, 1),
            ',' => self.make(TokenKind::Comma, 1),
            ';' => self.make(TokenKind::Semicolon, 1),
            '$' => self.make(TokenKind::Dollar, 1),
            '@' => self.make(TokenKind::At, 1),
            '%' => self.make(TokenKind::Percent, 1),
            ':' => {
                if rest.as_bytes().get(1) == Some(&b':') {
                    self.make(TokenKind::DoubleColon, 2)
                } else {
                    self.make(TokenKind::Unknown, 1)
                }
            }
            '!' => {
                if rest.as_bytes().get(1) == Some(&b'=') {
                    self.make(TokenKind::Ne, 2)
                } else {
                    self.make(TokenKind::Not, 1)
                }
            }
            '=' => {
                if rest.as_bytes().get(1) == Some(&b'=') {
                    self.make(TokenKind::Eq, 2)
                } else {
                    // Deliberate quirk: a lone `=` lexes as an `Identifier`,
                    // which the parser then rejects.
                    self.make(TokenKind::Identifier, 1)
                }
            }
            '<' => {
                if rest.as_bytes().get(1) == Some(&b'=') {
                    self.make(TokenKind::Le, 2)
                } else {
                    self.make(TokenKind::Lt, 1)
                }
            }
            '>' => {
                if rest.as_bytes().get(1) == Some(&b'=') {
                    self.make(TokenKind::Ge, 2)
                } else {
                    self.make(TokenKind::Gt, 1)
                }
            }
            '-' => {
                if rest.as_bytes().get(1) == Some(&b'>') {
                    self.make(TokenKind::Arrow, 2)
                } else if rest.as_bytes().get(1).is_some_and(|b| b.is_ascii_digit()) {
                    let (len, well_formed) = scan_number(rest);
                    self.make(if well_formed { TokenKind::Number } else { TokenKind::Unknown }, len)
                } else {
                    let len = scan_identifier_like(rest);
                    self.make(classify_identifier(&rest[..len]), len)
                }
            }
            '.' => {
                if rest.as_bytes().get(1).is_some_and(|b| b.is_ascii_digit()) {
                    let (len, well_formed) = scan_number(rest);
                    self.make(if well_formed { TokenKind::Number } else { TokenKind::Unknown }, len)
                } else {
                    self.make(TokenKind::Dot, 1)
                }
            }
            '+' => {
                let next_is_number = match rest[1..].chars().next() {
                    Some(d) if d.is_ascii_digit() => true,
                    Some('.') => rest[2..].chars().next().is_some_and(|d| d.is_ascii_digit()),
                    _ => false,
                };
                if next_is_number {
                    let (len, well_formed) = scan_number(rest);
                    self.make(if well_formed { TokenKind::Number } else { TokenKind::Unknown }, len)
                } else {
                    self.make(TokenKind::Unknown, 1)
                }
            }
            '0'..='9' => {
                let (len, well_formed) = scan_number(rest);
                self.make(if well_formed { TokenKind::Number } else { TokenKind::Unknown }, len)
            }
            '\'' | '"' | '`' => self.scan_string(rest, c),
            c if classify::is_identifier_start(c) => {
                let len = scan_identifier_like(rest);
                self.make(classify_identifier(&rest[..len]), len)
            }
            other => self.make(TokenKind::Unknown, other.len_utf8()),
        }
    }

    fn scan_string(&mut self, rest: &str, quote: char) -> Token<'a> {
        let mut flags = StringFlags::empty();
        let mut closed = false;
        let mut len = quote.len_utf8();
        for c in rest[len..].chars() {
            len += c.len_utf8();
            match c {
                '$' => flags.set(StringFlags::CONTAINS_DOLLAR),
                '@' => flags.set(StringFlags::CONTAINS_AT_SIGN),
                '%' => flags.set(StringFlags::CONTAINS_PERCENT),
                _ => {}
            }
            if c == quote {
                closed = true;
                break;
            }
        }
        if closed {
            self.make_with_flags(TokenKind::String, len, flags)
        } else {
            // Unterminated string: report as `Unknown` and consume the
            // remainder so the cursor makes progress.
            self.make(TokenKind::Unknown, rest.len())
        }
    }
}

fn classify_identifier(text: &str) -> TokenKind {
    if text.eq_ignore_ascii_case("and") {
        TokenKind::And
    } else if text.eq_ignore_ascii_case("or") {
        TokenKind::Or
    } else {
        TokenKind::Identifier
    }
}

/// Scan an identifier-like run starting at `text`'s first character, which
/// the caller has already established is a valid start (`letter | _`, or
/// `-` in the one dispatch branch that allows it). Stops before a trailing
/// `->` so the arrow token is never swallowed into the identifier.
fn scan_identifier_like(text: &str) -> usize {
    let mut chars = text.char_indices();
    let (_, first) = chars.next().expect("non-empty identifier-like run");
    let mut len = first.len_utf8();
    let bytes = text.as_bytes();
    loop {
        let Some((idx, c)) = chars.next() else { break };
        if c == '-' && bytes.get(idx + 1) == Some(&b'>') {
            break;
        }
        if classify::is_identifier_continue(c) {
            len += c.len_utf8();
        } else {
            break;
        }
    }
    len
}

/// Scan a number starting at `text`'s first character (an optional sign,
/// then either a `0x`/`0X` hex run or a decimal run with at most one `.`).
/// Returns `(consumed_len, well_formed)`; `well_formed` is false only for a
/// `0x`/`0X` prefix with no hex digits after it.
fn scan_number(text: &str) -> (usize, bool) {
    let bytes = text.as_bytes();
    let mut pos = if matches!(bytes.first(), Some(b'+') | Some(b'-')) { 1 } else { 0 };

    let after_sign = &text[pos..];
    if after_sign.len() >= 2 && after_sign.as_bytes()[0] == b'0' && matches!(after_sign.as_bytes()[1], b'x' | b'X') {
        let prefix_len = pos + 2;
        let mut end = prefix_len;
        while end < bytes.len() && classify::is_hex_digit(bytes[end] as char) {
            end += 1;
        }
        return (end, end > prefix_len);
    }

    let digits_start = pos;
    while pos < bytes.len() && classify::is_ascii_digit(bytes[pos] as char) {
        pos += 1;
    }
    if bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1).is_some_and(|b| b.is_ascii_digit()) {
        pos += 1;
        while pos < bytes.len() && classify::is_ascii_digit(bytes[pos] as char) {
            pos += 1;
        }
    }
    (pos, pos > digits_start)
}

/// Lex all of `source` into a vector of tokens, ending with `EndOfInput`.
pub fn lex_into(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(source);
    let mut out = Vec::new();
    loop {
        let tok = lexer.current();
        let is_eof = tok.kind == TokenKind::EndOfInput;
        out.push(tok);
        if is_eof {
            break;
        }
        lexer.move_next();
    }
    out
}
