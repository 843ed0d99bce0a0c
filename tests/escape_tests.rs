//! Escape codec properties, exercised through the crate's public re-exports.

use buildexpr::{contains_escaped_wildcards, escape, escape_cached, unescape_all, unescape_all_trimmed};

#[test]
fn escape_only_touches_reserved_characters() {
    assert_eq!(escape("a$b;c@d"), "a%24b%3bc%40d");
    assert_eq!(escape("nothing reserved here"), "nothing reserved here");
}

#[test]
fn unescape_is_lenient_about_non_reserved_bytes() {
    assert_eq!(unescape_all("%41"), "A");
}

#[test]
fn unescape_trims_only_when_asked() {
    assert_eq!(unescape_all_trimmed("  %24  "), "$");
    assert_eq!(unescape_all("  %24  "), "  $  ");
}

#[test]
fn escape_unescape_round_trip_on_reserved_only_input() {
    let s = "$%'()*;?@";
    assert_eq!(escape(&unescape_all(escape(s))), escape(s));
}

#[test]
fn unescape_is_idempotent_with_no_valid_triples() {
    let s = "no escapes, just a lone % and a bad %zz";
    assert_eq!(unescape_all(s), s);
}

#[test]
fn wildcard_detector_matches_either_hex_case() {
    assert!(contains_escaped_wildcards("a%2Ab"));
    assert!(contains_escaped_wildcards("a%2ab"));
    assert!(contains_escaped_wildcards("a%3Fb"));
    assert!(contains_escaped_wildcards("a%3fb"));
    assert!(!contains_escaped_wildcards("a%24b"));
}

#[test]
fn cached_escape_agrees_with_uncached_escape() {
    for s in ["a@b", "a@b", "plain", "$(weird);stuff"] {
        assert_eq!(escape_cached(s), escape(s));
    }
}
