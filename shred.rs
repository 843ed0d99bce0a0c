//! Shred APIs: read-only projections over an expression string that answer
//! narrow questions -- which items and metadata does this reference, where
//! do top-level `;` splits fall -- without handing the caller a full AST.
//! Built on the same lexer/parser the full grammar uses, so they agree with
//! it for any well-formed input.

use crate::ast::{Expr, ItemVector, Receiver, Spanned, StringPart, Transform};
use crate::lexer::lex_into;
use crate::parser;
use crate::span::Span;
use crate::token::TokenKind;
use std::collections::{HashMap, HashSet};

/// The function name and raw argument texts of a transform's first step,
/// when that step is a bare identifier call (e.g. `->Foo('a', 'b')`).
#[derive(Debug, Clone)]
pub struct TransformFunctionCapture<'a> {
    pub name: &'a str,
    pub arguments: Vec<&'a str>,
}

/// One `-> expression` step inside an item vector.
#[derive(Debug, Clone)]
pub struct TransformCapture<'a> {
    pub span: Span<'a>,
    pub function: Option<TransformFunctionCapture<'a>>,
    /// Set when the transform's own `Primary` is itself an `@( ... )`
    /// (e.g. `@(A->@(B))`), exposing that nested item vector's own capture
    /// recursively rather than dropping it.
    pub nested_item: Option<Box<ItemExpressionCapture<'a>>>,
}

#[derive(Debug, Clone, Copy)]
pub struct SeparatorCapture<'a> {
    pub span: Span<'a>,
    pub start: u32,
}

/// One `@( ... )` occurrence, as a flat, easy-to-consume projection of the
/// `ItemVector` node the full parser would build for it.
#[derive(Debug, Clone)]
pub struct ItemExpressionCapture<'a> {
    pub start: u32,
    pub length: u32,
    pub raw_text: &'a str,
    pub item_type: &'a str,
    pub separator: Option<SeparatorCapture<'a>>,
    pub transform_function: Option<TransformFunctionCapture<'a>>,
    pub transforms: Vec<TransformCapture<'a>>,
}

fn function_capture<'a>(expr: &Expr<'a>) -> Option<TransformFunctionCapture<'a>> {
    let Expr::Receiver(Receiver::FunctionCall(call)) = expr else { return None };
    let Receiver::Identifier(id) = &*call.receiver else { return None };
    Some(TransformFunctionCapture { name: id.text(), arguments: call.arguments.iter().map(|a| a.span().text()).collect() })
}

fn transform_capture<'a>(t: &Transform<'a>) -> TransformCapture<'a> {
    let nested_item = match &*t.expr {
        Expr::ItemVector(v) => Some(Box::new(item_capture(v))),
        _ => None,
    };
    TransformCapture { span: t.span, function: function_capture(&t.expr), nested_item }
}

fn item_capture<'a>(v: &ItemVector<'a>) -> ItemExpressionCapture<'a> {
    ItemExpressionCapture {
        start: v.span.start(),
        length: v.span.len(),
        raw_text: v.span.text(),
        item_type: v.item_type.text(),
        separator: v.separator.as_ref().map(|s| SeparatorCapture { span: s.span(), start: s.span().start() }),
        transform_function: v.transforms.first().and_then(|t| function_capture(&t.expr)),
        transforms: v.transforms.iter().map(transform_capture).collect(),
    }
}

/// Enumerate, in source order, every `@( ... )` occurrence in `source`. An
/// occurrence that fails to parse as an item vector on its own is skipped:
/// this is a fast partial projection, not a validator.
pub fn shred_item_expressions(source: &str) -> impl Iterator<Item = ItemExpressionCapture<'_>> {
    let at_positions: Vec<u32> =
        lex_into(source).into_iter().filter(|t| t.kind == TokenKind::At).map(|t| t.span.start()).collect();
    at_positions.into_iter().filter_map(move |start| {
        let expr = parser::parse_item_vector_from(source, start).ok()?;
        let Expr::ItemVector(v) = expr else { unreachable!("parse_item_vector_from always returns an ItemVector") };
        Some(item_capture(&v))
    })
}

fn expr_has_metadata_outside_transform(expr: &Expr<'_>, inside_transform: bool) -> bool {
    match expr {
        Expr::MetadataReference(_) => !inside_transform,
        Expr::CompositeString(cs) => cs.parts.iter().any(|p| part_has_metadata_outside_transform(p, inside_transform)),
        Expr::PropertyReference(p) => expr_has_metadata_outside_transform(&p.inner, inside_transform),
        Expr::ItemVector(v) => item_vector_has_metadata_outside_transform(v, inside_transform),
        Expr::Receiver(r) => receiver_has_metadata_outside_transform(r, inside_transform),
        Expr::BinaryOperator(b) => {
            expr_has_metadata_outside_transform(&b.left, inside_transform)
                || expr_has_metadata_outside_transform(&b.right, inside_transform)
        }
        Expr::UnaryOperator(u) => expr_has_metadata_outside_transform(&u.operand, inside_transform),
        Expr::Parenthesized(inner, _) => expr_has_metadata_outside_transform(inner, inside_transform),
        Expr::StringLiteral(_) | Expr::NumericLiteral(_) => false,
    }
}

fn part_has_metadata_outside_transform(part: &StringPart<'_>, inside_transform: bool) -> bool {
    match part {
        StringPart::Metadata(_) => !inside_transform,
        StringPart::Property(p) => expr_has_metadata_outside_transform(&p.inner, inside_transform),
        StringPart::Item(v) => item_vector_has_metadata_outside_transform(v, inside_transform),
        StringPart::Simple(_) | StringPart::Escaped(_) => false,
    }
}

fn item_vector_has_metadata_outside_transform(v: &ItemVector<'_>, inside_transform: bool) -> bool {
    v.transforms.iter().any(|t| expr_has_metadata_outside_transform(&t.expr, true))
        || v.separator.as_deref().is_some_and(|s| expr_has_metadata_outside_transform(s, inside_transform))
}

fn receiver_has_metadata_outside_transform(r: &Receiver<'_>, inside_transform: bool) -> bool {
    match r {
        Receiver::Identifier(_) | Receiver::StaticMemberAccess(_) => false,
        Receiver::MemberAccess(m) => receiver_has_metadata_outside_transform(&m.target, inside_transform),
        Receiver::FunctionCall(c) => {
            receiver_has_metadata_outside_transform(&c.receiver, inside_transform)
                || c.arguments.iter().any(|a| expr_has_metadata_outside_transform(a, inside_transform))
        }
    }
}

/// True iff `source` contains a `%( ... )` reference outside any item
/// vector's transform steps. An input that fails to parse is treated as
/// containing none.
pub fn contains_metadata_outside_transform(source: &str) -> bool {
    match parser::parse(source) {
        Ok(expr) => expr_has_metadata_outside_transform(&expr, false),
        Err(_) => false,
    }
}

/// One metadata reference's resolved name components.
#[derive(Debug, Clone)]
pub struct MetadataName {
    pub item_type: Option<String>,
    pub metadata_name: String,
}

/// The two sets `shred_item_and_metadata_names` aggregates.
#[derive(Debug, Clone, Default)]
pub struct ReferencedNames {
    /// Item-type identifiers, case-insensitively deduplicated, first-seen
    /// spelling preserved, in first-seen order.
    pub item_types: Vec<String>,
    /// Canonical metadata key (`Name` or `ItemType.Name`, lower-cased) to
    /// its resolved components.
    pub metadata: HashMap<String, MetadataName>,
}

fn record_item(names: &mut ReferencedNames, seen: &mut HashSet<String>, item_type: &str) {
    if seen.insert(item_type.to_ascii_lowercase()) {
        names.item_types.push(item_type.to_owned());
    }
}

fn record_metadata(names: &mut ReferencedNames, item_type: Option<&str>, metadata_name: &str) {
    let key = match item_type {
        Some(it) => format!("{}.{}", it.to_ascii_lowercase(), metadata_name.to_ascii_lowercase()),
        None => metadata_name.to_ascii_lowercase(),
    };
    names
        .metadata
        .entry(key)
        .or_insert_with(|| MetadataName { item_type: item_type.map(str::to_owned), metadata_name: metadata_name.to_owned() });
}

fn collect_names(expr: &Expr<'_>, names: &mut ReferencedNames, seen_items: &mut HashSet<String>) {
    match expr {
        Expr::MetadataReference(m) => {
            record_metadata(names, m.item_type.as_ref().map(|i| i.text()), m.metadata_name.text())
        }
        Expr::CompositeString(cs) => {
            for part in cs.parts.iter() {
                collect_part(part, names, seen_items);
            }
        }
        Expr::PropertyReference(p) => collect_names(&p.inner, names, seen_items),
        Expr::ItemVector(v) => collect_item_vector(v, names, seen_items),
        Expr::Receiver(r) => collect_receiver(r, names, seen_items),
        Expr::BinaryOperator(b) => {
            collect_names(&b.left, names, seen_items);
            collect_names(&b.right, names, seen_items);
        }
        Expr::UnaryOperator(u) => collect_names(&u.operand, names, seen_items),
        Expr::Parenthesized(inner, _) => collect_names(inner, names, seen_items),
        Expr::StringLiteral(_) | Expr::NumericLiteral(_) => {}
    }
}

fn collect_part(part: &StringPart<'_>, names: &mut ReferencedNames, seen_items: &mut HashSet<String>) {
    match part {
        StringPart::Metadata(m) => record_metadata(names, m.item_type.as_ref().map(|i| i.text()), m.metadata_name.text()),
        StringPart::Property(p) => collect_names(&p.inner, names, seen_items),
        StringPart::Item(v) => collect_item_vector(v, names, seen_items),
        StringPart::Simple(_) | StringPart::Escaped(_) => {}
    }
}

fn collect_item_vector(v: &ItemVector<'_>, names: &mut ReferencedNames, seen_items: &mut HashSet<String>) {
    record_item(names, seen_items, v.item_type.text());
    for t in v.transforms.iter() {
        collect_names(&t.expr, names, seen_items);
    }
    if let Some(sep) = &v.separator {
        collect_names(sep, names, seen_items);
    }
}

fn collect_receiver(r: &Receiver<'_>, names: &mut ReferencedNames, seen_items: &mut HashSet<String>) {
    match r {
        Receiver::Identifier(_) | Receiver::StaticMemberAccess(_) => {}
        Receiver::MemberAccess(m) => collect_receiver(&m.target, names, seen_items),
        Receiver::FunctionCall(c) => {
            collect_receiver(&c.receiver, names, seen_items);
            for a in c.arguments.iter() {
                collect_names(a, names, seen_items);
            }
        }
    }
}

/// Aggregate referenced item-type names and metadata references over a list
/// of expressions. An expression that fails to parse in full still
/// contributes whatever item vectors `shred_item_expressions` can recover
/// from it.
pub fn shred_item_and_metadata_names<'a, I>(sources: I) -> ReferencedNames
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names = ReferencedNames::default();
    let mut seen_items = HashSet::new();
    for source in sources {
        match parser::parse(source) {
            Ok(expr) => collect_names(&expr, &mut names, &mut seen_items),
            Err(_) => {
                for capture in shred_item_expressions(source) {
                    record_item(&mut names, &mut seen_items, capture.item_type);
                }
            }
        }
    }
    names
}

/// A forward-only, lazy iterator over the slices between top-level `;`
/// characters. A `;` inside balanced `(...)`/`[...]` or inside a
/// `'...'`/`"..."`/`` `...` `` quoted run never splits.
pub struct SemicolonSplit<'a> {
    source: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for SemicolonSplit<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        let start = self.pos;
        let rest = &self.source[start..];
        let mut depth = 0i32;
        let mut quote: Option<char> = None;
        for (rel, c) in rest.char_indices() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '\'' | '"' | '`' => quote = Some(c),
                    '(' | '[' => depth += 1,
                    ')' | ']' => depth -= 1,
                    ';' if depth <= 0 => {
                        let end = start + rel;
                        self.pos = end + 1;
                        return Some(&self.source[start..end]);
                    }
                    _ => {}
                },
            }
        }
        self.done = true;
        Some(rest)
    }
}

/// Lazily split `source` on top-level `;` characters.
pub fn split_on_top_level_semicolons(source: &str) -> SemicolonSplit<'_> {
    SemicolonSplit { source, pos: 0, done: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_expressions_capture_transform_and_separator() {
        let captures: Vec<_> = shred_item_expressions("@(Compile->'%(FullPath)', ';')").collect();
        assert_eq!(captures.len(), 1);
        let c = &captures[0];
        assert_eq!(c.item_type, "Compile");
        assert_eq!(c.transforms.len(), 1);
        assert!(c.separator.is_some());
    }

    #[test]
    fn item_expressions_capture_bare_function_transform() {
        let captures: Vec<_> = shred_item_expressions("@(Compile->Distinct())").collect();
        let c = &captures[0];
        let f = c.transform_function.as_ref().expect("bare identifier call");
        assert_eq!(f.name, "Distinct");
        assert!(f.arguments.is_empty());
    }

    #[test]
    fn item_expressions_capture_nested_item_vector_transform() {
        let captures: Vec<_> = shred_item_expressions("@(A->@(B))").collect();
        let c = &captures[0];
        assert_eq!(c.item_type, "A");
        assert_eq!(c.transforms.len(), 1);
        let nested = c.transforms[0].nested_item.as_deref().expect("nested item vector capture");
        assert_eq!(nested.item_type, "B");
        assert!(nested.transforms.is_empty());
    }

    #[test]
    fn metadata_inside_transform_does_not_count_as_top_level() {
        assert!(!contains_metadata_outside_transform("@(Compile->'%(FullPath)')"));
    }

    #[test]
    fn metadata_outside_any_transform_counts_as_top_level() {
        assert!(contains_metadata_outside_transform("'%(FullPath)' == 'x'"));
    }

    #[test]
    fn shred_and_full_parse_agree_on_item_names() {
        let source = "@(Compile) == @(Link)";
        let names = shred_item_and_metadata_names([source]);
        assert_eq!(names.item_types, vec!["Compile", "Link"]);
    }

    #[test]
    fn metadata_name_dedupes_case_insensitively() {
        let names = shred_item_and_metadata_names(["'%(FullPath)%(fullpath)'"]);
        assert_eq!(names.metadata.len(), 1);
    }

    #[test]
    fn semicolon_split_ignores_interior_semicolons() {
        let parts: Vec<_> = split_on_top_level_semicolons("a;@(B, ';');c").collect();
        assert_eq!(parts, vec!["a", "@(B, ';')", "c"]);
    }

    #[test]
    fn semicolon_split_yields_whitespace_only_tokens_verbatim() {
        let parts: Vec<_> = split_on_top_level_semicolons("a; ;b").collect();
        assert_eq!(parts, vec!["a", " ", "b"]);
    }

    #[test]
    fn semicolon_split_of_empty_input_yields_one_empty_token() {
        let parts: Vec<_> = split_on_top_level_semicolons("").collect();
        assert_eq!(parts, vec![""]);
    }
}
