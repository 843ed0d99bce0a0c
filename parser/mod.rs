//! The recursive-descent parser: primes a [`Lexer`] with one token, walks
//! the grammar top-down, and either returns a complete AST or discards
//! everything and reports a single [`ParseError`] -- there is no partial
//! result and no error recovery.
//!
//! A `Parser` wraps a lexer-like cursor, with one method per production and
//! descending precedence levels written out by hand, driving a closed,
//! typed [`ast::Expr`] rather than pushing into a green-tree builder.

mod string_literal;

use crate::ast::{
    BinaryOp, BinaryOperator, Expr, FunctionCall, Identifier, ItemVector, MemberAccess,
    MetadataReference, NumericLiteral, PropertyReference, Receiver, Spanned, StaticMemberAccess,
    StringLiteral, Transform, TypeName, UnaryOperator,
};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::pool::{BufferPool, GrowableBuffer};
use crate::span::{Cover, Span};
use crate::token::{Token, TokenKind};

/// The three element types the parser collects into pooled buffers while
/// descending, so a deeply nested expression does not allocate a fresh
/// `Vec` per argument list / transform chain / string-literal part run.
pub struct Pools<'a> {
    exprs: BufferPool<Expr<'a>>,
    transforms: BufferPool<Transform<'a>>,
    parts: BufferPool<crate::ast::StringPart<'a>>,
}

impl<'a> Pools<'a> {
    pub fn new() -> Self {
        Pools { exprs: BufferPool::new(), transforms: BufferPool::new(), parts: BufferPool::new() }
    }
}

impl<'a> Default for Pools<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `source` as a conditional expression.
pub fn parse(source: &str) -> Result<Expr<'_>, ParseError> {
    let pools = Pools::new();
    let mut parser = Parser::new(source, &pools);
    let expr = parser.parse_or()?;
    if parser.current_kind() != TokenKind::EndOfInput {
        return Err(parser.err_expected("end of input"));
    }
    Ok(expr)
}

/// Parse a single `@( ... )` item vector starting at absolute byte offset
/// `start` within `root`, used by [`crate::shred`] to enumerate item-vector
/// occurrences without requiring the whole surrounding expression to parse.
/// Every span on the returned node is already in `root`'s coordinates.
pub fn parse_item_vector_from(root: &str, start: u32) -> Result<Expr<'_>, ParseError> {
    let pools = Pools::new();
    let cover = Cover::new(root);
    let slice = cover.span(start, root.len() as u32);
    let mut parser = Parser::for_slice(cover, &pools, slice);
    parser.parse_item_vector()
}

/// One parser instance per (sub-)parse. `base` is the absolute byte offset,
/// within the root source, of this instance's own `lexer`'s source -- every
/// span the lexer yields is local to that slice and must be shifted by
/// `base` before it means anything to a caller holding the root text.
pub(crate) struct Parser<'a, 'p> {
    lexer: Lexer<'a>,
    base: u32,
    cover: Cover<'a>,
    pools: &'p Pools<'a>,
}

impl<'a, 'p> Parser<'a, 'p> {
    pub fn new(source: &'a str, pools: &'p Pools<'a>) -> Self {
        Parser { lexer: Lexer::new(source), base: 0, cover: Cover::new(source), pools }
    }

    /// A parser over `slice` (already a literal sub-slice of the root
    /// source), rebasing every span it produces back onto the root's
    /// coordinates via `slice.start()`.
    fn for_slice(cover: Cover<'a>, pools: &'p Pools<'a>, slice: Span<'a>) -> Self {
        Parser { lexer: Lexer::new(slice.text()), base: slice.start(), cover, pools }
    }

    fn rebase(&self, span: Span<'a>) -> Span<'a> {
        Span::new(span.start() + self.base, span.text())
    }

    fn current_token(&self) -> Token<'a> {
        let t = self.lexer.current();
        Token { kind: t.kind, span: self.rebase(t.span), flags: t.flags }
    }

    fn current_kind(&self) -> TokenKind {
        self.lexer.current().kind
    }

    fn current_span(&self) -> Span<'a> {
        self.rebase(self.lexer.current().span)
    }

    fn bump(&mut self) -> Token<'a> {
        let tok = self.current_token();
        self.lexer.move_next();
        tok
    }

    fn err_expected(&self, expected: &'static str) -> ParseError {
        ParseError::structural(expected, self.current_kind().to_string(), self.current_span().start())
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Span<'a>, ParseError> {
        if self.current_kind() == kind {
            let span = self.current_span();
            self.bump();
            Ok(span)
        } else {
            Err(self.err_expected(expected))
        }
    }

    fn identifier(&mut self) -> Result<Identifier<'a>, ParseError> {
        if self.current_kind() != TokenKind::Identifier {
            return Err(self.err_expected("an identifier"));
        }
        let name = self.current_span();
        self.bump();
        Ok(Identifier { name })
    }

    // ---- Conditional := Or -------------------------------------------

    fn parse_or(&mut self) -> Result<Expr<'a>, ParseError> {
        let mut left = self.parse_and()?;
        while self.current_kind() == TokenKind::Or {
            let op_span = self.current_span();
            self.bump();
            let right = self.parse_and()?;
            let span = self.cover.cover(left.span(), right.span());
            left = Expr::BinaryOperator(BinaryOperator {
                left: Box::new(left),
                op: BinaryOp::Or,
                op_span,
                right: Box::new(right),
                span,
            });
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr<'a>, ParseError> {
        let mut left = self.parse_rel()?;
        while self.current_kind() == TokenKind::And {
            let op_span = self.current_span();
            self.bump();
            let right = self.parse_rel()?;
            let span = self.cover.cover(left.span(), right.span());
            left = Expr::BinaryOperator(BinaryOperator {
                left: Box::new(left),
                op: BinaryOp::And,
                op_span,
                right: Box::new(right),
                span,
            });
        }
        Ok(left)
    }

    /// Relational operators are non-associative: at most one per chain.
    fn parse_rel(&mut self) -> Result<Expr<'a>, ParseError> {
        let left = self.parse_unary()?;
        let Some(op) = relop(self.current_kind()) else {
            return Ok(left);
        };
        let op_span = self.current_span();
        self.bump();
        let right = self.parse_unary()?;
        let span = self.cover.cover(left.span(), right.span());
        Ok(Expr::BinaryOperator(BinaryOperator {
            left: Box::new(left),
            op,
            op_span,
            right: Box::new(right),
            span,
        }))
    }

    fn parse_unary(&mut self) -> Result<Expr<'a>, ParseError> {
        if self.current_kind() == TokenKind::Not {
            let op_span = self.current_span();
            self.bump();
            let operand = self.parse_unary()?;
            let span = self.cover.cover(op_span, operand.span());
            return Ok(Expr::UnaryOperator(UnaryOperator { op_span, operand: Box::new(operand), span }));
        }
        self.parse_postfix()
    }

    /// Postfix extends only `Receiver` nodes: the loop stops the moment the
    /// accumulated expression is not one, which is exactly what keeps
    /// `$(X).Member` from parsing while `$(X.Member)` does.
    fn parse_postfix(&mut self) -> Result<Expr<'a>, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if expr.as_receiver().is_none() {
                break;
            }
            match self.current_kind() {
                TokenKind::Dot => {
                    self.bump();
                    let member_name = self.identifier()?;
                    let receiver = expr.into_receiver().expect("checked above");
                    let span = self.cover.cover(receiver.span(), member_name.span());
                    expr = Expr::Receiver(Receiver::MemberAccess(MemberAccess {
                        target: Box::new(receiver),
                        member_name,
                        span,
                    }));
                }
                TokenKind::LParen => {
                    self.bump();
                    let arguments = self.parse_arg_list()?;
                    let rparen_span = self.expect(TokenKind::RParen, "')'")?;
                    let receiver = expr.into_receiver().expect("checked above");
                    let span = self.cover.cover(receiver.span(), rparen_span);
                    expr = Expr::Receiver(Receiver::FunctionCall(FunctionCall {
                        receiver: Box::new(receiver),
                        arguments,
                        span,
                    }));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr<'a>, ParseError> {
        match self.current_kind() {
            TokenKind::String => self.parse_string_primary(),
            TokenKind::Number => {
                let span = self.current_span();
                self.bump();
                Ok(Expr::NumericLiteral(NumericLiteral { span }))
            }
            TokenKind::Dollar => self.parse_property_ref(),
            TokenKind::At => self.parse_item_vector(),
            TokenKind::Percent => self.parse_metadata_ref(),
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBracket => self.parse_static_call(),
            TokenKind::Identifier => self.parse_identifier_primary(),
            _ => Err(self.err_expected("an expression")),
        }
    }

    /// `Identifier ( '(' ArgList ')' )?` -- `Primary`'s own production
    /// already embeds one optional call; `parse_postfix`'s loop then
    /// handles any further `.`/`(` chaining on top of it. Both
    /// productions need this because `ItemVector`'s transforms and
    /// separator call `parse_primary` directly, never `parse_postfix`, so a
    /// bare transform function like `->Distinct()` would otherwise never
    /// get its call parsed.
    fn parse_identifier_primary(&mut self) -> Result<Expr<'a>, ParseError> {
        let id = self.identifier()?;
        let receiver = Receiver::Identifier(id);
        if self.current_kind() != TokenKind::LParen {
            return Ok(Expr::Receiver(receiver));
        }
        self.bump();
        let arguments = self.parse_arg_list()?;
        let rparen_span = self.expect(TokenKind::RParen, "')'")?;
        let span = self.cover.cover(receiver.span(), rparen_span);
        Ok(Expr::Receiver(Receiver::FunctionCall(FunctionCall { receiver: Box::new(receiver), arguments, span })))
    }

    fn parse_string_primary(&mut self) -> Result<Expr<'a>, ParseError> {
        let token = self.current_token();
        let outer = token.span;
        // The opening and closing quote are always one ASCII byte.
        let value = outer.slice(1, outer.len() as usize - 2);
        if !token.flags.any() {
            self.bump();
            return Ok(Expr::StringLiteral(StringLiteral { outer, value }));
        }
        let expr = string_literal::parse_composite(self.cover, self.pools, outer, value)?;
        self.bump();
        Ok(expr)
    }

    fn parse_parenthesized(&mut self) -> Result<Expr<'a>, ParseError> {
        let lparen_span = self.current_span();
        self.bump();
        let inner = self.parse_or()?;
        let rparen_span = self.expect(TokenKind::RParen, "')'")?;
        let span = self.cover.cover(lparen_span, rparen_span);
        Ok(Expr::Parenthesized(Box::new(inner), span))
    }

    /// `PropertyRef := '$' '(' Postfix ')'`.
    fn parse_property_ref(&mut self) -> Result<Expr<'a>, ParseError> {
        let dollar_span = self.current_span();
        self.bump();
        self.expect(TokenKind::LParen, "'('")?;
        let inner = self.parse_postfix()?;
        let rparen_span = self.expect(TokenKind::RParen, "')'")?;
        let span = self.cover.cover(dollar_span, rparen_span);
        Ok(Expr::PropertyReference(PropertyReference { inner: Box::new(inner), span }))
    }

    /// `ItemVector := '@' '(' Identifier ( '->' Primary )* ( ',' Primary )? ')'`.
    fn parse_item_vector(&mut self) -> Result<Expr<'a>, ParseError> {
        let at_span = self.current_span();
        self.bump();
        self.expect(TokenKind::LParen, "'('")?;
        let item_type = self.identifier()?;

        let mut transforms = GrowableBuffer::with_capacity(&self.pools.transforms, 2);
        while self.current_kind() == TokenKind::Arrow {
            let arrow_span = self.current_span();
            self.bump();
            let primary = self.parse_primary()?;
            let span = self.cover.cover(arrow_span, primary.span());
            transforms.add(Transform { expr: Box::new(primary), span });
        }

        let separator = if self.current_kind() == TokenKind::Comma {
            self.bump();
            Some(Box::new(self.parse_primary()?))
        } else {
            None
        };

        let rparen_span = self.expect(TokenKind::RParen, "')'")?;
        let span = self.cover.cover(at_span, rparen_span);
        Ok(Expr::ItemVector(ItemVector { item_type, transforms: transforms.into_immutable(), separator, span }))
    }

    /// `MetadataRef := '%' '(' Identifier ( '.' Identifier )? ')'`.
    fn parse_metadata_ref(&mut self) -> Result<Expr<'a>, ParseError> {
        let percent_span = self.current_span();
        self.bump();
        self.expect(TokenKind::LParen, "'('")?;
        let first = self.identifier()?;

        let (item_type, metadata_name) = if self.current_kind() == TokenKind::Dot {
            self.bump();
            if self.current_kind() == TokenKind::Dot {
                return Err(ParseError::semantic("double dot in metadata reference", self.current_span().start()));
            }
            let second = self.identifier()?;
            (Some(first), second)
        } else {
            (None, first)
        };

        let rparen_span = self.expect(TokenKind::RParen, "')'")?;
        let span = self.cover.cover(percent_span, rparen_span);
        Ok(Expr::MetadataReference(MetadataReference { item_type, metadata_name, span }))
    }

    /// `StaticCall := '[' TypeName ']' '::' Identifier '(' ArgList ')'`.
    fn parse_static_call(&mut self) -> Result<Expr<'a>, ParseError> {
        let lbracket_span = self.current_span();
        self.bump();
        let type_name = self.parse_type_name()?;
        self.expect(TokenKind::RBracket, "']'")?;
        self.expect(TokenKind::DoubleColon, "'::'")?;
        let member_name = self.identifier()?;
        let access_span = self.cover.cover(lbracket_span, member_name.span());
        let receiver = Receiver::StaticMemberAccess(StaticMemberAccess { type_name, member_name, span: access_span });

        self.expect(TokenKind::LParen, "'('")?;
        let arguments = self.parse_arg_list()?;
        let rparen_span = self.expect(TokenKind::RParen, "')'")?;
        let span = self.cover.cover(lbracket_span, rparen_span);
        Ok(Expr::Receiver(Receiver::FunctionCall(FunctionCall { receiver: Box::new(receiver), arguments, span })))
    }

    /// `TypeName := Identifier ( '.' Identifier )*`.
    fn parse_type_name(&mut self) -> Result<TypeName<'a>, ParseError> {
        let first = self.identifier()?;
        let mut last = first;
        let mut namespace_start = None;
        let mut namespace_end = first.span().end();

        while self.current_kind() == TokenKind::Dot {
            self.bump();
            namespace_start.get_or_insert(first.span().start());
            namespace_end = last.span().end();
            last = self.identifier()?;
        }

        let span = self.cover.cover(first.span(), last.span());
        let namespace = namespace_start.map(|s| self.cover.span(s, namespace_end));
        Ok(TypeName { namespace, name: last, span, qualified: namespace.is_some() })
    }

    /// `ArgList := ( Conditional ( ',' Conditional )* )?`.
    fn parse_arg_list(&mut self) -> Result<Box<[Expr<'a>]>, ParseError> {
        let mut args = GrowableBuffer::with_capacity(&self.pools.exprs, 4);
        if self.current_kind() == TokenKind::RParen {
            return Ok(args.into_immutable());
        }
        loop {
            args.add(self.parse_or()?);
            if self.current_kind() != TokenKind::Comma {
                break;
            }
            self.bump();
        }
        Ok(args.into_immutable())
    }
}

fn relop(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::Ne => Some(BinaryOp::Ne),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Le => Some(BinaryOp::Le),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::Ge => Some(BinaryOp::Ge),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;

    fn ok(source: &str) -> Expr<'_> {
        parse(source).unwrap_or_else(|e| panic!("expected {source:?} to parse, got {e}"))
    }

    fn fails(source: &str) {
        assert!(parse(source).is_err(), "expected {source:?} to fail to parse");
    }

    #[test]
    fn numeric_comparison() {
        let expr = ok("42 >= 10");
        let Expr::BinaryOperator(op) = expr else { panic!("expected BinaryOperator") };
        assert_eq!(op.op, BinaryOp::Ge);
        let Expr::NumericLiteral(left) = *op.left else { panic!("expected NumericLiteral") };
        let Expr::NumericLiteral(right) = *op.right else { panic!("expected NumericLiteral") };
        assert_eq!(left.raw_text(), "42");
        assert_eq!(right.raw_text(), "10");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = ok("'$(A)' == 'a' and '$(B)' == 'b' or '$(C)' == 'c'");
        let Expr::BinaryOperator(top) = expr else { panic!("expected BinaryOperator") };
        assert_eq!(top.op, BinaryOp::Or);
        let Expr::BinaryOperator(and) = *top.left else { panic!("expected And on the left") };
        assert_eq!(and.op, BinaryOp::And);
    }

    #[test]
    fn relational_operators_do_not_chain() {
        fails("1 < 2 < 3");
    }

    #[test]
    fn property_reference_member_access_parses_inside_the_parens() {
        let expr = ok("$(Foo.Bar)");
        let Expr::PropertyReference(p) = expr else { panic!("expected PropertyReference") };
        assert!(matches!(*p.inner, Expr::Receiver(Receiver::MemberAccess(_))));
    }

    #[test]
    fn dot_after_property_reference_does_not_parse() {
        fails("$(Foo).Bar");
    }

    #[test]
    fn static_member_call_with_qualified_type_name() {
        let expr = ok("$([System.IO.Path]::Combine($(Root), 'bin'))");
        let Expr::PropertyReference(p) = expr else { panic!("expected PropertyReference") };
        let Expr::Receiver(Receiver::FunctionCall(call)) = *p.inner else { panic!("expected FunctionCall") };
        let Receiver::StaticMemberAccess(access) = *call.receiver else { panic!("expected StaticMemberAccess") };
        assert!(access.type_name.qualified);
        assert_eq!(access.type_name.namespace.unwrap().text(), "System.IO");
        assert_eq!(access.type_name.name.text(), "Path");
        assert_eq!(access.member_name.text(), "Combine");
        assert_eq!(call.arguments.len(), 2);
    }

    #[test]
    fn item_vector_with_transform_and_separator() {
        let expr = ok("@(Compile->'%(FullPath)', ';')");
        let Expr::ItemVector(v) = expr else { panic!("expected ItemVector") };
        assert_eq!(v.item_type.text(), "Compile");
        assert_eq!(v.transforms.len(), 1);
        assert!(v.separator.is_some());
    }

    #[test]
    fn empty_property_reference_is_rejected() {
        fails("$()");
    }

    #[test]
    fn empty_item_vector_is_rejected() {
        fails("@()");
    }

    #[test]
    fn empty_metadata_reference_is_rejected() {
        fails("%()");
    }

    #[test]
    fn unclosed_string_is_rejected() {
        fails("'abc");
    }

    #[test]
    fn dotted_item_type_is_rejected() {
        fails("@(A.B)");
    }

    #[test]
    fn double_dot_metadata_is_rejected() {
        fails("%(A..B)");
    }

    #[test]
    fn negative_number_vs_arrow_in_item_vector() {
        let expr = ok("@(X->-1)");
        let Expr::ItemVector(v) = expr else { panic!("expected ItemVector") };
        assert_eq!(v.transforms.len(), 1);
        assert!(matches!(*v.transforms[0].expr, Expr::NumericLiteral(n) if n.raw_text() == "-1"));
    }

    #[test]
    fn dash_after_identifier_is_part_of_the_identifier() {
        let expr = ok("@(X-1)");
        let Expr::ItemVector(v) = expr else { panic!("expected ItemVector") };
        assert_eq!(v.item_type.text(), "X-1");
    }

    #[test]
    fn empty_input_fails() {
        fails("");
    }

    #[test]
    fn bare_function_call() {
        let expr = ok("Exists('foo.txt')");
        assert!(matches!(expr, Expr::Receiver(Receiver::FunctionCall(_))));
    }

    #[test]
    fn item_vector_transform_consumes_its_own_bare_function_call() {
        let expr = ok("@(Compile->Distinct())");
        let Expr::ItemVector(v) = expr else { panic!("expected ItemVector") };
        assert_eq!(v.transforms.len(), 1);
        let Expr::Receiver(Receiver::FunctionCall(call)) = &*v.transforms[0].expr else {
            panic!("expected the transform to be a function call")
        };
        assert!(matches!(&*call.receiver, Receiver::Identifier(id) if id.text() == "Distinct"));
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn unary_not() {
        let expr = ok("!Exists('foo.txt')");
        assert!(matches!(expr, Expr::UnaryOperator(_)));
    }
}
