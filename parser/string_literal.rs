//! The expandable-string sub-parser: walks a quoted literal's interior as
//! alternating literal runs and embedded `$(...)`/`@(...)`/`%(...)`
//! constructs or `%HH` escape runs, reusing the very same grammar
//! productions the main parser uses for those sigils -- just over a
//! freshly rebased [`Parser`] instance.

use crate::ast::{CompositeString, EscapedText, Expr, SimpleText, StringLiteral, StringPart};
use crate::classify;
use crate::error::ParseError;
use crate::pool::GrowableBuffer;
use crate::span::{Cover, Span};

use super::{Parser, Pools};

/// Parse the interior of a `String` token already known (via its
/// `StringFlags`) to contain at least one `$`, `@`, or `%`. `outer` covers
/// the surrounding quotes; `value` is the interior with the quotes
/// stripped.
pub(super) fn parse_composite<'a, 'p>(
    cover: Cover<'a>,
    pools: &'p Pools<'a>,
    outer: Span<'a>,
    value: Span<'a>,
) -> Result<Expr<'a>, ParseError> {
    let mut parts = GrowableBuffer::with_capacity(&pools.parts, 4);
    let end = value.end();
    let mut run_start = value.start();
    let mut pos = run_start;

    while pos < end {
        let Some(rel) = cover.span(pos, end).text().find(|c| matches!(c, '$' | '@' | '%')) else {
            break;
        };
        let sigil_at = pos + rel as u32;
        if sigil_at > run_start {
            push_simple(&mut parts, cover, cover.span(run_start, sigil_at));
        }
        run_start = sigil_at;
        let sigil = cover.span(sigil_at, end).text().as_bytes()[0] as char;

        if sigil == '%' {
            if let Some((decoded, len)) = scan_escape_run(cover.span(sigil_at, end)) {
                let span = cover.span(sigil_at, sigil_at + len);
                parts.add(StringPart::Escaped(EscapedText { unescaped: decoded, span }));
                pos = sigil_at + len;
                run_start = pos;
                continue;
            }
        }

        if let Some(expr) = try_parse_construct(cover, pools, sigil, sigil_at, end) {
            pos = expr.span().end();
            run_start = pos;
            parts.add(sigil_part(sigil, expr));
            continue;
        }

        // Nothing consumed it -- fold the bare sigil into the next literal
        // run and move past it.
        pos = sigil_at + 1;
    }
    if end > run_start {
        push_simple(&mut parts, cover, cover.span(run_start, end));
    }

    if parts.as_read_slice().iter().all(|p| matches!(p, StringPart::Simple(_))) {
        return Ok(Expr::StringLiteral(StringLiteral { outer, value }));
    }
    Ok(Expr::CompositeString(CompositeString { outer, parts: parts.into_immutable() }))
}

/// Push a literal run, merging it into an immediately preceding `Simple`
/// part rather than leaving two adjacent ones -- this is what actually
/// happens when a sigil run fails to parse as a construct and folds back
/// into plain text.
fn push_simple<'a, 'p>(parts: &mut GrowableBuffer<'p, StringPart<'a>>, cover: Cover<'a>, span: Span<'a>) {
    if span.is_empty() {
        return;
    }
    if let Some(StringPart::Simple(prev)) = parts.as_read_slice().last() {
        if prev.span.end() == span.start() {
            let merged = cover.cover(prev.span, span);
            parts.pop();
            parts.add(StringPart::Simple(SimpleText { span: merged }));
            return;
        }
    }
    parts.add(StringPart::Simple(SimpleText { span }));
}

/// Attempt `PropertyReference`/`ItemVector`/`MetadataReference` starting at
/// `sigil_at`, bounded to `..end` (never past the string's own interior).
/// A failed attempt is swallowed: a construct that does not parse degrades
/// to a literal sigil character, it does not fail the whole parse.
fn try_parse_construct<'a, 'p>(
    cover: Cover<'a>,
    pools: &'p Pools<'a>,
    sigil: char,
    sigil_at: u32,
    end: u32,
) -> Option<Expr<'a>> {
    let mut sub = Parser::for_slice(cover, pools, cover.span(sigil_at, end));
    let result = match sigil {
        '$' => sub.parse_property_ref(),
        '@' => sub.parse_item_vector(),
        '%' => sub.parse_metadata_ref(),
        _ => unreachable!("caller only passes $, @, or %"),
    };
    result.ok()
}

fn sigil_part<'a>(sigil: char, expr: Expr<'a>) -> StringPart<'a> {
    match (sigil, expr) {
        ('$', Expr::PropertyReference(p)) => StringPart::Property(p),
        ('@', Expr::ItemVector(v)) => StringPart::Item(v),
        ('%', Expr::MetadataReference(m)) => StringPart::Metadata(m),
        _ => unreachable!("try_parse_construct returns the node kind matching its sigil"),
    }
}

/// Decode a run of consecutive `%HH` triples starting at `span`'s first
/// byte (already known to be `%`). Returns the decoded text and the number
/// of bytes consumed, or `None` if not even one full triple decodes.
fn scan_escape_run(span: Span<'_>) -> Option<(smol_str::SmolStr, u32)> {
    let bytes = span.text().as_bytes();
    let mut i = 0usize;
    let mut decoded = String::new();
    while i + 3 <= bytes.len() && bytes[i] == b'%' {
        let (Some(hi), Some(lo)) = (classify::hex_value(bytes[i + 1] as char), classify::hex_value(bytes[i + 2] as char))
        else {
            break;
        };
        decoded.push((((hi as u32) << 4) | lo as u32) as u8 as char);
        i += 3;
    }
    if i == 0 {
        None
    } else {
        Some((smol_str::SmolStr::new(decoded), i as u32))
    }
}
