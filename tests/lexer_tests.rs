//! Lexer boundary behaviours, exercised through the crate's public
//! `lex_into` re-export.

use buildexpr::lex_into;
use buildexpr::token::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex_into(source).into_iter().map(|t| t.kind).collect()
}

#[test]
fn empty_input_is_immediately_at_end_of_input() {
    assert_eq!(kinds(""), vec![TokenKind::EndOfInput]);
}

#[test]
fn double_colon_and_lone_colon() {
    assert_eq!(kinds("::"), vec![TokenKind::DoubleColon, TokenKind::EndOfInput]);
    assert_eq!(kinds(":"), vec![TokenKind::Unknown, TokenKind::EndOfInput]);
}

#[test]
fn lone_equal_sign_lexes_as_identifier() {
    assert_eq!(kinds("="), vec![TokenKind::Identifier, TokenKind::EndOfInput]);
}

#[test]
fn and_or_keywords_are_recognised_case_insensitively() {
    assert_eq!(kinds("and AND And"), vec![TokenKind::And, TokenKind::And, TokenKind::And, TokenKind::EndOfInput]);
    assert_eq!(kinds("or OR Or"), vec![TokenKind::Or, TokenKind::Or, TokenKind::Or, TokenKind::EndOfInput]);
}

#[test]
fn unterminated_string_is_unknown() {
    assert_eq!(kinds("'abc"), vec![TokenKind::Unknown, TokenKind::EndOfInput]);
    assert_eq!(kinds("\"abc"), vec![TokenKind::Unknown, TokenKind::EndOfInput]);
}

#[test]
fn scientific_notation_stops_before_the_exponent() {
    let tokens = lex_into("1.5e10");
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].text(), "1.5");
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].text(), "e10");
}

#[test]
fn hex_literal_requires_at_least_one_digit() {
    assert_eq!(kinds("0x1F"), vec![TokenKind::Number, TokenKind::EndOfInput]);
    assert_eq!(kinds("0x"), vec![TokenKind::Unknown, TokenKind::EndOfInput]);
}

#[test]
fn arrow_is_never_swallowed_into_a_preceding_identifier() {
    let tokens = lex_into("foo-bar->baz");
    let texts: Vec<&str> = tokens.iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["foo-bar", "->", "baz", ""]);
}
