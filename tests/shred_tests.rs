//! Shred-API behaviours, exercised through the crate's public re-exports.

use buildexpr::{
    contains_metadata_outside_transform, shred_item_and_metadata_names, shred_item_expressions,
    split_on_top_level_semicolons,
};

#[test]
fn enumerates_item_vectors_in_source_order_with_transform_and_separator() {
    let source = "@(Compile->'%(FullPath)', ';'); @(Link)";
    let captures: Vec<_> = shred_item_expressions(source).collect();
    assert_eq!(captures.len(), 2);
    assert_eq!(captures[0].item_type, "Compile");
    assert!(captures[0].separator.is_some());
    assert_eq!(captures[1].item_type, "Link");
    assert!(captures[1].separator.is_none());
    assert_eq!(captures[0].raw_text, "@(Compile->'%(FullPath)', ';')");
}

#[test]
fn bare_identifier_transform_exposes_its_function_name_and_arguments() {
    let captures: Vec<_> = shred_item_expressions("@(Compile->WithMetadataValue('Foo', 'Bar'))").collect();
    let f = captures[0].transform_function.as_ref().expect("bare call transform");
    assert_eq!(f.name, "WithMetadataValue");
    assert_eq!(f.arguments, vec!["'Foo'", "'Bar'"]);
}

#[test]
fn transform_exposes_a_nested_item_vector_recursively() {
    let captures: Vec<_> = shred_item_expressions("@(A->@(B))").collect();
    let nested = captures[0].transforms[0].nested_item.as_deref().expect("nested item vector capture");
    assert_eq!(nested.item_type, "B");
}

#[test]
fn metadata_reference_inside_a_transform_is_not_top_level() {
    assert!(!contains_metadata_outside_transform("@(Compile->'%(FullPath)')"));
}

#[test]
fn metadata_reference_in_a_plain_condition_is_top_level() {
    assert!(contains_metadata_outside_transform("'%(FullPath)' == 'x'"));
}

#[test]
fn a_malformed_expression_is_treated_as_having_no_top_level_metadata() {
    assert!(!contains_metadata_outside_transform("%(A..B)"));
}

#[test]
fn shred_agrees_with_the_full_parser_on_item_and_metadata_names() {
    let names = shred_item_and_metadata_names(["@(Compile) == @(compile)", "'%(FullPath)'"]);
    // case-insensitive dedup, first-seen spelling kept
    assert_eq!(names.item_types, vec!["Compile"]);
    assert!(names.metadata.contains_key("fullpath"));
}

#[test]
fn metadata_key_is_qualified_when_an_item_type_is_present() {
    let names = shred_item_and_metadata_names(["'%(Compile.Identity)'"]);
    let entry = names.metadata.get("compile.identity").expect("qualified key present");
    assert_eq!(entry.item_type.as_deref(), Some("Compile"));
    assert_eq!(entry.metadata_name, "Identity");
}

#[test]
fn semicolon_split_never_splits_inside_an_item_vector_separator() {
    let parts: Vec<_> = split_on_top_level_semicolons("a;@(B, ';');c").collect();
    assert_eq!(parts, vec!["a", "@(B, ';')", "c"]);
}

#[test]
fn semicolon_split_never_splits_inside_balanced_parens_or_quotes() {
    let parts: Vec<_> = split_on_top_level_semicolons("Exists('a;b');Exists('c')").collect();
    assert_eq!(parts, vec!["Exists('a;b')", "Exists('c')"]);
}

#[test]
fn semicolon_split_yields_whitespace_only_tokens_verbatim() {
    let parts: Vec<_> = split_on_top_level_semicolons("a; ;b").collect();
    assert_eq!(parts, vec!["a", " ", "b"]);
}

#[test]
fn semicolon_split_of_a_string_with_no_semicolons_yields_one_token() {
    let parts: Vec<_> = split_on_top_level_semicolons("just one thing").collect();
    assert_eq!(parts, vec!["just one thing"]);
}
