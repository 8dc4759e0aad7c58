use crate::ast::{BlockItem, ForInit, Stmt, StmtKind};
use crate::token::TokenKind;

use super::decl::DeclarationParsing;
use super::expr::ExpressionParsing;
use super::{ParseResult, Parser};

pub trait StatementParsing<'a> {
    fn parse_statement(&mut self) -> ParseResult<&'a Stmt<'a>>;
    fn parse_compound_statement(&mut self) -> ParseResult<&'a Stmt<'a>>;
}

impl<'a, 'int> StatementParsing<'a> for Parser<'a, 'int> {
    fn parse_statement(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let start = self.mark();
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Empty))
            }
            TokenKind::LBrace => self.parse_compound_statement(),
            TokenKind::If => {
                self.advance();
                self.consume(TokenKind::LParen)?;
                let cond = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                let then_stmt = self.parse_statement()?;
                let else_stmt = if self.eat(TokenKind::Else) {
                    Some(self.parse_statement()?)
                } else {
                    None
                };
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::If { cond, then_stmt, else_stmt }))
            }
            TokenKind::While => {
                self.advance();
                self.consume(TokenKind::LParen)?;
                let cond = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                let body = self.parse_statement()?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::While { cond, body }))
            }
            TokenKind::Do => {
                self.advance();
                let body = self.parse_statement()?;
                self.consume(TokenKind::While)?;
                self.consume(TokenKind::LParen)?;
                let cond = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                self.consume(TokenKind::Semicolon)?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::DoWhile { body, cond }))
            }
            TokenKind::For => {
                self.advance();
                self.consume(TokenKind::LParen)?;
                // the init clause gets a scope that wraps the whole loop, so
                // a loop-local declaration does not escape
                self.enter_scope();
                let result = self.parse_for_tail(start);
                self.leave_scope();
                result
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon)?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Return(value)))
            }
            TokenKind::Break => {
                self.advance();
                self.consume(TokenKind::Semicolon)?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Break))
            }
            TokenKind::Continue => {
                self.advance();
                self.consume(TokenKind::Semicolon)?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Continue))
            }
            TokenKind::Goto => {
                self.advance();
                let label = self.consume(TokenKind::Identifier)?;
                self.consume(TokenKind::Semicolon)?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Goto(label.lexeme)))
            }
            TokenKind::Switch => {
                self.advance();
                self.consume(TokenKind::LParen)?;
                let cond = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                let body = self.parse_statement()?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Switch { cond, body }))
            }
            TokenKind::Case => {
                self.advance();
                let expr = self.parse_constant_expression()?;
                self.consume(TokenKind::Colon)?;
                let inner = self.parse_statement()?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Case { expr: Some(expr), inner }))
            }
            TokenKind::Default => {
                self.advance();
                self.consume(TokenKind::Colon)?;
                let inner = self.parse_statement()?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Case { expr: None, inner }))
            }
            // a label is one token of lookahead: IDENT ':'
            TokenKind::Identifier if self.peek_at(1).kind == TokenKind::Colon => {
                let name = self.advance();
                self.advance();
                let inner = self.parse_statement()?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Label { name: name.lexeme, inner }))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                let span = self.span_from(start);
                Ok(self.ctx.stmt(span, StmtKind::Expr(expr)))
            }
        }
    }

    fn parse_compound_statement(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let start = self.mark();
        self.consume(TokenKind::LBrace)?;
        self.enter_scope();

        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            if self.starts_declaration() {
                match self.parse_declaration() {
                    Ok(decls) => items.push(BlockItem::Decl(decls)),
                    Err(diag) => {
                        self.report(diag);
                        self.synchronize();
                    }
                }
            } else {
                match self.parse_statement() {
                    Ok(stmt) => items.push(BlockItem::Stmt(stmt)),
                    Err(diag) => {
                        self.report(diag);
                        self.synchronize();
                    }
                }
            }
        }

        self.leave_scope();
        self.consume(TokenKind::RBrace)?;
        let items = self.ctx.alloc_block_items(items);
        let span = self.span_from(start);
        Ok(self.ctx.stmt(span, StmtKind::Compound(items)))
    }
}

impl<'a, 'int> Parser<'a, 'int> {
    fn parse_for_tail(&mut self, start: usize) -> ParseResult<&'a Stmt<'a>> {
        let init = if self.eat(TokenKind::Semicolon) {
            ForInit::None
        } else if self.starts_declaration() {
            ForInit::Decl(self.parse_declaration()?)
        } else {
            let expr = self.parse_expression()?;
            self.consume(TokenKind::Semicolon)?;
            ForInit::Expr(expr)
        };

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon)?;

        let post = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RParen)?;

        let body = self.parse_statement()?;
        let span = self.span_from(start);
        Ok(self.ctx.stmt(span, StmtKind::For { init, cond, post, body }))
    }
}
