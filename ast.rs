//! The immutable AST node taxonomy: a closed sum type for expressions,
//! plus a closed sub-sum type for the `Receiver` nodes that may sit to the
//! left of `.` or `(` in a postfix chain -- a two-level shape rather than
//! one flat enum with a runtime "is receiver" discriminant.
//!
//! Every node is `Clone` (cheap: spans are borrowed, children are `Box`)
//! and carries its own `span()`. Trees are built once by the parser and
//! never mutated afterwards.

use crate::span::Span;
use smol_str::SmolStr;

/// Implemented by every AST node (and by [`Expr`]/[`Receiver`] themselves,
/// by delegating to whichever variant is active).
pub trait Spanned<'a> {
    fn span(&self) -> Span<'a>;
}

/// A bare identifier token, used both as a leaf expression and as the name
/// half of qualified constructs (`TypeName`, `MetadataReference`, ...).
#[derive(Debug, Clone, Copy)]
pub struct Identifier<'a> {
    pub name: Span<'a>,
}

impl<'a> Identifier<'a> {
    pub fn text(&self) -> &'a str {
        self.name.text()
    }
}

impl<'a> Spanned<'a> for Identifier<'a> {
    fn span(&self) -> Span<'a> {
        self.name
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StringLiteral<'a> {
    /// Covers the surrounding quotes.
    pub outer: Span<'a>,
    /// Excludes the surrounding quotes.
    pub value: Span<'a>,
}
impl<'a> Spanned<'a> for StringLiteral<'a> {
    fn span(&self) -> Span<'a> {
        self.outer
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NumericLiteral<'a> {
    pub span: Span<'a>,
}
impl<'a> NumericLiteral<'a> {
    /// The raw, un-interpreted text (decimal/hex/sign interpretation is
    /// deferred to the evaluator).
    pub fn raw_text(&self) -> &'a str {
        self.span.text()
    }
}
impl<'a> Spanned<'a> for NumericLiteral<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// A literal chunk of text inside an expandable string.
#[derive(Debug, Clone, Copy)]
pub struct SimpleText<'a> {
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for SimpleText<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// One or more consecutive `%HH` triples, decoded into a single string.
/// `span` still covers the original `%HH...` bytes, so tooling can point at
/// the source even though `unescaped` is owned, decoded text.
#[derive(Debug, Clone)]
pub struct EscapedText<'a> {
    pub unescaped: SmolStr,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for EscapedText<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// One constituent of a [`CompositeString`]'s `parts` sequence.
#[derive(Debug, Clone)]
pub enum StringPart<'a> {
    Simple(SimpleText<'a>),
    Escaped(EscapedText<'a>),
    Property(PropertyReference<'a>),
    Item(ItemVector<'a>),
    Metadata(MetadataReference<'a>),
}
impl<'a> Spanned<'a> for StringPart<'a> {
    fn span(&self) -> Span<'a> {
        match self {
            StringPart::Simple(n) => n.span(),
            StringPart::Escaped(n) => n.span(),
            StringPart::Property(n) => n.span(),
            StringPart::Item(n) => n.span(),
            StringPart::Metadata(n) => n.span(),
        }
    }
}

/// An expandable string literal with at least one embedded reference or
/// escape run. A literal with no such parts collapses back to a plain
/// [`StringLiteral`] instead (invariant: `CompositeString` is only ever
/// constructed with a non-trivial `parts`).
#[derive(Debug, Clone)]
pub struct CompositeString<'a> {
    pub outer: Span<'a>,
    pub parts: Box<[StringPart<'a>]>,
}
impl<'a> Spanned<'a> for CompositeString<'a> {
    fn span(&self) -> Span<'a> {
        self.outer
    }
}

/// `$( inner )`.
#[derive(Debug, Clone)]
pub struct PropertyReference<'a> {
    pub inner: Box<Expr<'a>>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for PropertyReference<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// One `-> expression` operand inside an item vector.
#[derive(Debug, Clone)]
pub struct Transform<'a> {
    pub expr: Box<Expr<'a>>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for Transform<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// `@( itemType transforms* separator? )`.
#[derive(Debug, Clone)]
pub struct ItemVector<'a> {
    pub item_type: Identifier<'a>,
    pub transforms: Box<[Transform<'a>]>,
    pub separator: Option<Box<Expr<'a>>>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for ItemVector<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// `%( Name )` or `%( ItemType.Name )`.
#[derive(Debug, Clone, Copy)]
pub struct MetadataReference<'a> {
    pub item_type: Option<Identifier<'a>>,
    pub metadata_name: Identifier<'a>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for MetadataReference<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// `namespace.Name` (e.g. `System.IO.Path` => namespace `System.IO`, name
/// `Path`). `qualified` holds iff `namespace` is non-empty.
#[derive(Debug, Clone, Copy)]
pub struct TypeName<'a> {
    pub namespace: Option<Span<'a>>,
    pub name: Identifier<'a>,
    pub span: Span<'a>,
    pub qualified: bool,
}
impl<'a> Spanned<'a> for TypeName<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// `target.memberName`.
#[derive(Debug, Clone)]
pub struct MemberAccess<'a> {
    pub target: Box<Receiver<'a>>,
    pub member_name: Identifier<'a>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for MemberAccess<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// `[TypeName]::memberName`.
#[derive(Debug, Clone, Copy)]
pub struct StaticMemberAccess<'a> {
    pub type_name: TypeName<'a>,
    pub member_name: Identifier<'a>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for StaticMemberAccess<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// `receiver(arg0, ...)`.
#[derive(Debug, Clone)]
pub struct FunctionCall<'a> {
    pub receiver: Box<Receiver<'a>>,
    pub arguments: Box<[Expr<'a>]>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for FunctionCall<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone)]
pub struct BinaryOperator<'a> {
    pub left: Box<Expr<'a>>,
    pub op: BinaryOp,
    pub op_span: Span<'a>,
    pub right: Box<Expr<'a>>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for BinaryOperator<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

#[derive(Debug, Clone)]
pub struct UnaryOperator<'a> {
    pub op_span: Span<'a>,
    pub operand: Box<Expr<'a>>,
    pub span: Span<'a>,
}
impl<'a> Spanned<'a> for UnaryOperator<'a> {
    fn span(&self) -> Span<'a> {
        self.span
    }
}

/// A node that may appear to the left of `.` or `(` in a postfix chain:
/// identifiers, member accesses, static member accesses, and calls.
#[derive(Debug, Clone)]
pub enum Receiver<'a> {
    Identifier(Identifier<'a>),
    MemberAccess(MemberAccess<'a>),
    StaticMemberAccess(StaticMemberAccess<'a>),
    FunctionCall(FunctionCall<'a>),
}
impl<'a> Spanned<'a> for Receiver<'a> {
    fn span(&self) -> Span<'a> {
        match self {
            Receiver::Identifier(n) => n.span(),
            Receiver::MemberAccess(n) => n.span(),
            Receiver::StaticMemberAccess(n) => n.span(),
            Receiver::FunctionCall(n) => n.span(),
        }
    }
}

/// Every expression the grammar can produce.
#[derive(Debug, Clone)]
pub enum Expr<'a> {
    StringLiteral(StringLiteral<'a>),
    NumericLiteral(NumericLiteral<'a>),
    CompositeString(CompositeString<'a>),
    PropertyReference(PropertyReference<'a>),
    ItemVector(ItemVector<'a>),
    MetadataReference(MetadataReference<'a>),
    Receiver(Receiver<'a>),
    BinaryOperator(BinaryOperator<'a>),
    UnaryOperator(UnaryOperator<'a>),
    /// `( inner )` -- a parenthesised sub-expression that is not itself a
    /// receiver. The span covers the parentheses; `inner` is unwrapped so
    /// downstream evaluation does not see an extra layer of indirection for
    /// something with no AST shape of its own.
    Parenthesized(Box<Expr<'a>>, Span<'a>),
}

impl<'a> Expr<'a> {
    /// Whether this node may appear to the left of `.` or `(` -- i.e.
    /// whether it is (or wraps) a [`Receiver`]. A parenthesised group is
    /// never a receiver, which is exactly what makes `$(X).Member` fail to
    /// parse while `$(X.Member)` succeeds.
    pub fn as_receiver(&self) -> Option<&Receiver<'a>> {
        match self {
            Expr::Receiver(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_receiver(self) -> Result<Receiver<'a>, Expr<'a>> {
        match self {
            Expr::Receiver(r) => Ok(r),
            other => Err(other),
        }
    }
}

impl<'a> From<Receiver<'a>> for Expr<'a> {
    fn from(r: Receiver<'a>) -> Self {
        Expr::Receiver(r)
    }
}

impl<'a> Spanned<'a> for Expr<'a> {
    fn span(&self) -> Span<'a> {
        match self {
            Expr::StringLiteral(n) => n.span(),
            Expr::NumericLiteral(n) => n.span(),
            Expr::CompositeString(n) => n.span(),
            Expr::PropertyReference(n) => n.span(),
            Expr::ItemVector(n) => n.span(),
            Expr::MetadataReference(n) => n.span(),
            Expr::Receiver(n) => n.span(),
            Expr::BinaryOperator(n) => n.span(),
            Expr::UnaryOperator(n) => n.span(),
            Expr::Parenthesized(_, span) => *span,
        }
    }
}

/// The root of a successful parse: a conditional expression (`Conditional
/// := Or`).
pub type Ast<'a> = Expr<'a>;
