use crate::ast::{BinaryOp, Constant, Expr, ExprKind, UnaryOp};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::lexer::{decode_char_literal, decode_string_literal};
use crate::number;
use crate::token::TokenKind;

use super::decl::DeclarationParsing;
use super::{ParseResult, Parser};

/// Expression grammar: precedence climbing with one function per level.
/// Binary levels are left-associative; ternary and assignment associate to
/// the right.
pub trait ExpressionParsing<'a> {
    fn parse_expression(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_assignment(&mut self) -> ParseResult<&'a Expr<'a>>;
    fn parse_constant_expression(&mut self) -> ParseResult<&'a Expr<'a>>;
}

impl<'a, 'int> ExpressionParsing<'a> for Parser<'a, 'int> {
    /// Comma level, the loosest binding.
    fn parse_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_assignment()?;
        while self.check(TokenKind::Comma) {
            let op_tok = self.current;
            self.advance();
            let right = self.parse_assignment()?;
            expr = self.ctx.binary(BinaryOp::Comma, op_tok, expr, right);
        }
        Ok(expr)
    }

    fn parse_assignment(&mut self) -> ParseResult<&'a Expr<'a>> {
        let expr = self.parse_conditional()?;
        let kind = self.peek_kind();
        if kind.is_assignment_op() {
            let op_tok = self.current;
            self.advance();
            let right = self.parse_assignment()?;
            return Ok(self.ctx.binary(assignment_op(kind), op_tok, expr, right));
        }
        Ok(expr)
    }

    /// Constant expressions are conditional expressions in the grammar.
    fn parse_constant_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.parse_conditional()
    }
}

fn assignment_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Assign => BinaryOp::Assign,
        TokenKind::StarAssign => BinaryOp::MulAssign,
        TokenKind::SlashAssign => BinaryOp::DivAssign,
        TokenKind::PercentAssign => BinaryOp::ModAssign,
        TokenKind::PlusAssign => BinaryOp::AddAssign,
        TokenKind::MinusAssign => BinaryOp::SubAssign,
        TokenKind::ShlAssign => BinaryOp::ShlAssign,
        TokenKind::ShrAssign => BinaryOp::ShrAssign,
        TokenKind::AmpAssign => BinaryOp::AndAssign,
        TokenKind::CaretAssign => BinaryOp::XorAssign,
        TokenKind::PipeAssign => BinaryOp::OrAssign,
        other => unreachable!("not an assignment operator: {:?}", other),
    }
}

impl<'a, 'int> Parser<'a, 'int> {
    pub(crate) fn parse_conditional(&mut self) -> ParseResult<&'a Expr<'a>> {
        let cond = self.parse_logical_or()?;
        if self.eat(TokenKind::Question) {
            let then_expr = self.parse_expression()?;
            self.consume(TokenKind::Colon)?;
            let else_expr = self.parse_conditional()?;
            let span = cond.span.merge(else_expr.span);
            return Ok(self.ctx.expr(span, ExprKind::Ternary { cond, then_expr, else_expr }));
        }
        Ok(cond)
    }

    fn parse_logical_or(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_logical_and()?;
        while self.check(TokenKind::PipePipe) {
            let op_tok = self.current;
            self.advance();
            let right = self.parse_logical_and()?;
            expr = self.ctx.binary(BinaryOp::LogicalOr, op_tok, expr, right);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_inclusive_or()?;
        while self.check(TokenKind::AmpAmp) {
            let op_tok = self.current;
            self.advance();
            let right = self.parse_inclusive_or()?;
            expr = self.ctx.binary(BinaryOp::LogicalAnd, op_tok, expr, right);
        }
        Ok(expr)
    }

    fn parse_inclusive_or(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_exclusive_or()?;
        while self.check(TokenKind::Pipe) {
            let op_tok = self.current;
            self.advance();
            let right = self.parse_exclusive_or()?;
            expr = self.ctx.binary(BinaryOp::BitOr, op_tok, expr, right);
        }
        Ok(expr)
    }

    fn parse_exclusive_or(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_bitwise_and()?;
        while self.check(TokenKind::Caret) {
            let op_tok = self.current;
            self.advance();
            let right = self.parse_bitwise_and()?;
            expr = self.ctx.binary(BinaryOp::BitXor, op_tok, expr, right);
        }
        Ok(expr)
    }

    fn parse_bitwise_and(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_equality()?;
        while self.check(TokenKind::Amp) {
            let op_tok = self.current;
            self.advance();
            let right = self.parse_equality()?;
            expr = self.ctx.binary(BinaryOp::BitAnd, op_tok, expr, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => return Ok(expr),
            };
            let op_tok = self.current;
            self.advance();
            let right = self.parse_relational()?;
            expr = self.ctx.binary(op, op_tok, expr, right);
        }
    }

    fn parse_relational(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_shift()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => return Ok(expr),
            };
            let op_tok = self.current;
            self.advance();
            let right = self.parse_shift()?;
            expr = self.ctx.binary(op, op_tok, expr, right);
        }
    }

    fn parse_shift(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => return Ok(expr),
            };
            let op_tok = self.current;
            self.advance();
            let right = self.parse_additive()?;
            expr = self.ctx.binary(op, op_tok, expr, right);
        }
    }

    fn parse_additive(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            let op_tok = self.current;
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = self.ctx.binary(op, op_tok, expr, right);
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.parse_cast_expression()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(expr),
            };
            let op_tok = self.current;
            self.advance();
            let right = self.parse_cast_expression()?;
            expr = self.ctx.binary(op, op_tok, expr, right);
        }
    }

    /// Cast vs parenthesized expression vs compound literal. Only attempted
    /// when the token after `(` can start a type name; a `{` after the
    /// closing `)` selects the compound-literal reading.
    pub(crate) fn parse_cast_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        if self.check(TokenKind::LParen) {
            let after_paren = self.peek_at(1);
            if self.token_starts_type_name(after_paren) {
                let start = self.mark();
                let attempt = self.try_parse(|p| {
                    p.consume(TokenKind::LParen)?;
                    let ty = p.parse_type_name()?;
                    p.consume(TokenKind::RParen)?;
                    Ok(ty)
                });
                if let Some(ty) = attempt {
                    if self.check(TokenKind::LBrace) {
                        let items = self.parse_initializer_list_body()?;
                        let span = self.span_from(start);
                        let literal =
                            self.ctx.expr(span, ExprKind::CompoundLiteral { ty, items });
                        return self.parse_postfix_suffixes(literal);
                    }
                    let operand = self.parse_cast_expression()?;
                    let span = self.span_from(start).merge(operand.span);
                    return Ok(self.ctx.expr(span, ExprKind::Cast { ty, operand }));
                }
            }
        }
        self.parse_unary()
    }

    pub(crate) fn parse_unary(&mut self) -> ParseResult<&'a Expr<'a>> {
        let tok = self.peek();
        let op = match tok.kind {
            TokenKind::PlusPlus => Some(UnaryOp::PreIncrement),
            TokenKind::MinusMinus => Some(UnaryOp::PreDecrement),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.ctx.unary(tok.pos.span(), op, operand));
        }

        let op = match tok.kind {
            TokenKind::Amp => Some(UnaryOp::AddressOf),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Bang => Some(UnaryOp::LogicalNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_cast_expression()?;
            return Ok(self.ctx.unary(tok.pos.span(), op, operand));
        }

        if tok.kind == TokenKind::Sizeof {
            return self.parse_sizeof();
        }

        self.parse_postfix()
    }

    /// `sizeof` takes either a unary expression or a parenthesized type
    /// name; the expression reading is tried first through a checkpoint.
    fn parse_sizeof(&mut self) -> ParseResult<&'a Expr<'a>> {
        let start = self.mark();
        let sizeof_tok = self.advance();

        if let Some(operand) = self.try_parse(|p| p.parse_unary()) {
            return Ok(self.ctx.unary(sizeof_tok.pos.span(), UnaryOp::Sizeof, operand));
        }

        if self.check(TokenKind::LParen) {
            self.advance();
            let ty = self.parse_type_name()?;
            self.consume(TokenKind::RParen)?;
            let span = self.span_from(start);
            return Ok(self.ctx.expr(span, ExprKind::SizeofType { ty }));
        }

        Err(self.error_here(DiagnosticKind::ExpectedExpressionOrTypeNameAfterSizeof))
    }

    fn parse_postfix(&mut self) -> ParseResult<&'a Expr<'a>> {
        let expr = self.parse_primary()?;
        self.parse_postfix_suffixes(expr)
    }

    pub(crate) fn parse_postfix_suffixes(
        &mut self,
        mut expr: &'a Expr<'a>,
    ) -> ParseResult<&'a Expr<'a>> {
        loop {
            match self.peek_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let rbracket = self.consume(TokenKind::RBracket)?;
                    let span = expr.span.merge(rbracket.pos.span());
                    expr = self.ctx.expr(span, ExprKind::Index { base: expr, index });
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assignment()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let rparen = self.consume(TokenKind::RParen)?;
                    let args = self.ctx.alloc_expr_refs(args);
                    let span = expr.span.merge(rparen.pos.span());
                    expr = self.ctx.expr(span, ExprKind::Call { callee: expr, args });
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = self.peek_kind() == TokenKind::Arrow;
                    self.advance();
                    let member_tok = self.consume(TokenKind::Identifier)?;
                    let span = expr.span.merge(member_tok.pos.span());
                    expr = self.ctx.expr(
                        span,
                        ExprKind::Member { base: expr, arrow, member: member_tok.lexeme },
                    );
                }
                TokenKind::PlusPlus => {
                    let tok = self.advance();
                    expr = self.ctx.unary(tok.pos.span(), UnaryOp::PostIncrement, expr);
                }
                TokenKind::MinusMinus => {
                    let tok = self.advance();
                    expr = self.ctx.unary(tok.pos.span(), UnaryOp::PostDecrement, expr);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<&'a Expr<'a>> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Identifier => {
                // a typedef-name is not an expression; rejecting it here is
                // what makes the sizeof and cast speculation converge
                if self.is_typedef_name(tok.lexeme) {
                    return Err(self.error_here(DiagnosticKind::ExpectedExpression));
                }
                self.advance();
                Ok(self.ctx.expr(tok.pos.span(), ExprKind::Ident(tok.lexeme)))
            }
            TokenKind::IntegerConstant => {
                self.advance();
                let decoded = number::decode_integer(self.interner.resolve(tok.lexeme));
                match decoded {
                    Ok(d) => {
                        if d.overflowed {
                            self.report(Diagnostic::new(
                                DiagnosticKind::IntegerConstantOutOfRange,
                                tok.pos,
                            ));
                        }
                        Ok(self.ctx.expr(
                            tok.pos.span(),
                            ExprKind::Constant(Constant::Int {
                                value: d.value,
                                signed: d.signed,
                                rank: d.rank,
                            }),
                        ))
                    }
                    Err(_) => Err(Diagnostic::new(DiagnosticKind::MalformedNumericConstant, tok.pos)),
                }
            }
            TokenKind::FloatingConstant => {
                self.advance();
                let decoded = number::decode_float(self.interner.resolve(tok.lexeme));
                match decoded {
                    Ok(f) => Ok(self.ctx.expr(
                        tok.pos.span(),
                        ExprKind::Constant(Constant::Float { value: f.value, rank: f.rank }),
                    )),
                    Err(_) => Err(Diagnostic::new(DiagnosticKind::MalformedNumericConstant, tok.pos)),
                }
            }
            TokenKind::CharLiteral => {
                self.advance();
                match decode_char_literal(self.interner.resolve(tok.lexeme)) {
                    Some(value) => Ok(self
                        .ctx
                        .expr(tok.pos.span(), ExprKind::Constant(Constant::Char { value }))),
                    None => Err(Diagnostic::new(DiagnosticKind::MalformedNumericConstant, tok.pos)),
                }
            }
            TokenKind::StringLiteral => {
                self.advance();
                let bytes = decode_string_literal(self.interner.resolve(tok.lexeme));
                let text = String::from_utf8_lossy(&bytes).into_owned();
                let sym = self.interner.intern(&text);
                Ok(self.ctx.expr(tok.pos.span(), ExprKind::StringLit(sym)))
            }
            TokenKind::LParen => {
                let lparen = self.advance();
                let inner = self.parse_expression()?;
                let rparen = self.consume(TokenKind::RParen)?;
                let span = lparen.pos.span().merge(rparen.pos.span());
                Ok(self.ctx.expr(span, ExprKind::Paren(inner)))
            }
            _ => Err(self.error_here(DiagnosticKind::ExpectedExpression)),
        }
    }
}
