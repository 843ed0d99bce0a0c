//! Lexer, recursive-descent parser, and AST for build-script expressions:
//! the conditions, item lists, property/metadata references and function
//! calls that appear inside build-script attributes.
//!
//! Evaluating the tree into concrete values, recovering from a bad parse,
//! preserving whitespace trivia, and producing localised diagnostics are
//! all out of scope here -- this crate only gets you from source text to a
//! typed, span-carrying AST (or a single [`error::ParseError`]).
//!
//! ```
//! let ast = buildexpr::parse("'$(Configuration)' == 'Debug'").unwrap();
//! assert!(matches!(ast, buildexpr::ast::Expr::BinaryOperator(_)));
//! ```

pub mod ast;
pub mod classify;
pub mod error;
pub mod escape;
pub mod lexer;
pub mod parser;
pub mod pool;
pub mod shred;
pub mod span;
pub mod token;

pub use ast::{Ast, Expr};
pub use error::ParseError;
pub use escape::{contains_escaped_wildcards, escape, escape_cached, unescape_all, unescape_all_trimmed};
pub use lexer::lex_into;
pub use parser::parse;
pub use shred::{
    contains_metadata_outside_transform, shred_item_and_metadata_names, shred_item_expressions,
    split_on_top_level_semicolons,
};
