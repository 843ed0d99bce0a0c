//! The `%HH` escape codec: encodes the nine reserved characters as
//! percent-hex sequences and decodes them back, leniently accepting any
//! `%HH` run regardless of whether `HH` names a reserved character.

use crate::classify::hex_value;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Exactly these nine characters are reserved.
const RESERVED: [char; 9] = ['$', '%', '\'', '(', ')', '*', ';', '?', '@'];

fn is_reserved(c: char) -> bool {
    RESERVED.contains(&c)
}

fn push_escaped(out: &mut String, c: char) {
    // Every reserved character is ASCII, so one `%HH` triple always
    // suffices.
    out.push('%');
    out.push_str(&format!("{:02x}", c as u32));
}

/// Encode every reserved character in `s` as `%HH`. Allocates only if at
/// least one reserved character is present.
pub fn escape(s: &str) -> String {
    match s.find(is_reserved) {
        None => s.to_owned(),
        Some(first) => {
            let mut out = String::with_capacity(s.len() + 8);
            out.push_str(&s[..first]);
            for c in s[first..].chars() {
                if is_reserved(c) {
                    push_escaped(&mut out, c);
                } else {
                    out.push(c);
                }
            }
            out
        }
    }
}

type InternCache = Mutex<HashMap<String, String>>;

fn intern_cache() -> &'static InternCache {
    static CACHE: OnceLock<InternCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Like [`escape`], but short-circuits repeated inputs through an
/// unbounded, process-wide cache guarded by a single mutex. Callers that
/// care about bounding memory should not use this and should maintain
/// their own bounded cache instead.
pub fn escape_cached(s: &str) -> String {
    if let Some(hit) = intern_cache().lock().unwrap().get(s) {
        return hit.clone();
    }
    let escaped = escape(s);
    intern_cache().lock().unwrap().insert(s.to_owned(), escaped.clone());
    escaped
}

/// Decode every `%HH` run in `s`. Any `%` followed by two hex digits
/// (either case) is decoded, whether or not the resulting byte names a
/// reserved character -- the decoder is deliberately more permissive than
/// the encoder. Allocates only if at least one valid `%HH` triple is
/// present.
pub fn unescape_all(s: &str) -> String {
    unescape_inner(s, false)
}

/// Like [`unescape_all`], but trims leading and trailing whitespace from
/// `s` before decoding.
pub fn unescape_all_trimmed(s: &str) -> String {
    unescape_inner(s, true)
}

fn unescape_inner(s: &str, trim: bool) -> String {
    let s = if trim { s.trim() } else { s };
    if !contains_valid_escape(s) {
        return s.to_owned();
    }
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(byte) = decode_triple(s, i) {
                out.push(byte as char);
                i += 3;
                continue;
            }
        }
        // Copy one whole UTF-8 scalar, not just one byte, to stay on a
        // char boundary.
        let ch_len = utf8_char_len(bytes[i]);
        out.push_str(&s[i..i + ch_len]);
        i += ch_len;
    }
    out
}

fn contains_valid_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i + 2 < bytes.len() {
        if bytes[i] == b'%' && decode_triple(s, i).is_some() {
            return true;
        }
        i += 1;
    }
    false
}

/// Decode the `%HH` triple starting at byte offset `i`, if `s[i..]` begins
/// with one and both hex digits are ASCII.
fn decode_triple(s: &str, i: usize) -> Option<u32> {
    let bytes = s.as_bytes();
    if i + 2 >= bytes.len() || bytes[i] != b'%' {
        return None;
    }
    let hi = hex_value(bytes[i + 1] as char)?;
    let lo = hex_value(bytes[i + 2] as char)?;
    Some((hi as u32) << 4 | lo as u32)
}

fn utf8_char_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

/// True iff `s` contains `%2A`, `%2a`, `%3F`, or `%3f` (the escaped forms
/// of `*` and `?`).
pub fn contains_escaped_wildcards(s: &str) -> bool {
    s.contains("%2A") || s.contains("%2a") || s.contains("%3F") || s.contains("%3f")
}
