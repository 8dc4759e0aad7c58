mod decl;
mod expr;
mod stmt;
mod symbol;

#[cfg(test)]
mod tests;

pub use decl::DeclarationParsing;
pub use expr::ExpressionParsing;
pub use stmt::StatementParsing;
pub use symbol::{SymbolEntry, SymbolKind, SymbolTable};

use crate::arena_ctx::AstContext;
use crate::ast::TranslationUnit;
use crate::error::{Diagnostic, DiagnosticKind, Severity};
use crate::intern::{Interner, Symbol};
use crate::lexer::{Lexer, LexerContext};
use crate::source::Span;
use crate::token::{Token, TokenKind};
use crate::types::Type;

pub(crate) type ParseResult<T> = Result<T, Diagnostic>;

/// Saved parser state for bounded speculation. Restoring rewinds the token
/// cursor, drops diagnostics produced during the attempt, and repairs
/// symbol-table visibility; produced tokens are kept for re-consumption.
#[derive(Clone, Copy)]
pub(crate) struct ParserCheckpoint {
    pos: usize,
    diag_len: usize,
    error_count: usize,
}

/// Recursive-descent parser over the lazy token stream. Tokens are pulled
/// from the lexer on demand into a grow-only buffer, so token indices are
/// stable identities for the whole translation unit.
pub struct Parser<'a, 'int> {
    lexer: Lexer,
    lex_ctx: LexerContext,
    /// Lexer diagnostics live outside checkpoint truncation: a token is only
    /// scanned once, so its diagnostics must survive speculation rewinds.
    lex_diags: Vec<Diagnostic>,
    pub(crate) interner: &'int mut Interner,
    pub(crate) ctx: AstContext<'a>,
    tokens: Vec<Token>,
    pub(crate) current: usize,
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    pub(crate) symbols: SymbolTable<'a>,
}

impl<'a, 'int> Parser<'a, 'int> {
    pub fn new(
        lexer: Lexer,
        lex_ctx: LexerContext,
        interner: &'int mut Interner,
        ctx: AstContext<'a>,
    ) -> Self {
        Parser {
            lexer,
            lex_ctx,
            lex_diags: Vec::new(),
            interner,
            ctx,
            tokens: Vec::new(),
            current: 0,
            diagnostics: Vec::new(),
            error_count: 0,
            symbols: SymbolTable::new(),
        }
    }

    /// Parse the whole unit, recovering at declaration boundaries. Success
    /// is an error count of zero.
    pub fn parse_translation_unit(&mut self) -> TranslationUnit<'a> {
        let mut decls = Vec::new();
        while !self.at_eof() {
            let before = self.current;
            match self.parse_external_declaration() {
                Ok(ext) => decls.push(ext),
                Err(diag) => {
                    self.report(diag);
                    self.synchronize();
                    // a stray `}` at file scope is not a sync point; force
                    // progress so recovery cannot spin
                    if self.current == before && !self.at_eof() {
                        self.advance();
                    }
                }
            }
        }
        TranslationUnit { decls }
    }

    /// Error-severity diagnostics seen so far, lexer and parser combined.
    pub fn error_count(&self) -> usize {
        let lex_errors = self
            .lex_diags
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count();
        lex_errors + self.error_count
    }

    /// All diagnostics in emission order, lexer first.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut all = self.lex_diags;
        all.extend(self.diagnostics);
        all
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn token_at(&mut self, index: usize) -> Token {
        while self.tokens.len() <= index {
            let tok = self.lexer.scan(&mut self.lex_ctx, self.interner, &mut self.lex_diags);
            self.tokens.push(tok);
        }
        self.tokens[index]
    }

    pub(crate) fn peek(&mut self) -> Token {
        self.token_at(self.current)
    }

    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn peek_at(&mut self, offset: usize) -> Token {
        self.token_at(self.current + offset)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.current += 1;
        }
        tok
    }

    pub(crate) fn at_eof(&mut self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn check(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.expected(&[kind]))
        }
    }

    pub(crate) fn expected(&mut self, kinds: &[TokenKind]) -> Diagnostic {
        let found = self.peek();
        let kind = if found.kind == TokenKind::Eof {
            DiagnosticKind::UnexpectedEndOfInput { expected: kinds[0] }
        } else {
            DiagnosticKind::ExpectedToken { expected: kinds.to_vec(), found: found.kind }
        };
        Diagnostic::new(kind, found.pos)
    }

    pub(crate) fn error_here(&mut self, kind: DiagnosticKind) -> Diagnostic {
        let pos = self.peek().pos;
        Diagnostic::new(kind, pos)
    }

    /// Span from the token at `start_index` through the last consumed token.
    pub(crate) fn span_from(&mut self, start_index: usize) -> Span {
        let start = self.token_at(start_index).pos;
        let end_index = self.current.saturating_sub(1).max(start_index);
        let end = self.token_at(end_index).pos;
        start.span_to(end)
    }

    /// Current token index, used as a span start and a symbol birth index.
    pub(crate) fn mark(&self) -> usize {
        self.current
    }

    // ------------------------------------------------------------------
    // Checkpoints & recovery
    // ------------------------------------------------------------------

    pub(crate) fn checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint {
            pos: self.current,
            diag_len: self.diagnostics.len(),
            error_count: self.error_count,
        }
    }

    pub(crate) fn restore(&mut self, cp: ParserCheckpoint) {
        self.current = cp.pos;
        self.diagnostics.truncate(cp.diag_len);
        self.error_count = cp.error_count;
        self.symbols.restore(cp.pos);
    }

    /// Run a speculative parse; on failure the checkpoint is restored and
    /// `None` is returned.
    pub(crate) fn try_parse<F, T>(&mut self, op: F) -> Option<T>
    where
        F: FnOnce(&mut Self) -> ParseResult<T>,
    {
        let cp = self.checkpoint();
        match op(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.restore(cp);
                None
            }
        }
    }

    pub(crate) fn report(&mut self, diag: Diagnostic) {
        if diag.severity() == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
    }

    /// Panic-mode recovery: consume up to and including the next `;`. A `}`
    /// or EOF also stops recovery, without being consumed, so a missing
    /// semicolon cannot swallow the rest of an enclosing block.
    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Scopes & symbols
    // ------------------------------------------------------------------

    pub(crate) fn enter_scope(&mut self) {
        let birth = self.current;
        self.symbols.push_scope(birth);
    }

    pub(crate) fn leave_scope(&mut self) {
        self.symbols.pop_scope();
    }

    pub(crate) fn is_typedef_name(&self, name: Symbol) -> bool {
        self.symbols.is_typedef_name(name)
    }

    /// Record a declared name, diagnosing a same-scope redeclaration that
    /// changes what kind of symbol the name is (or rebinds a typedef to a
    /// different type).
    pub(crate) fn declare(
        &mut self,
        name: Symbol,
        name_tok: usize,
        kind: SymbolKind,
        ty: Option<&'a Type<'a>>,
    ) {
        if let Some(existing) = self.symbols.lookup_current_scope(name) {
            let clashes = existing.kind != kind
                || (kind == SymbolKind::Typedef
                    && match (existing.ty, ty) {
                        (Some(a), Some(b)) => !crate::types::types_equal(a, b),
                        _ => false,
                    });
            if clashes {
                let prev_tok = existing.name_tok;
                let prev = self.token_at(prev_tok).pos;
                let diag = self.error_here(DiagnosticKind::RedeclarationOfSymbolAsDifferentType {
                    name,
                    prev,
                });
                self.report(diag);
            }
        }
        let birth = self.current;
        self.symbols.declare(SymbolEntry { kind, name, name_tok, ty, birth });
    }

    /// True when the upcoming token can open a declaration: a
    /// declaration-specifier keyword or a typedef-name.
    pub(crate) fn starts_declaration(&mut self) -> bool {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Identifier => self.is_typedef_name(tok.lexeme),
            kind => kind.is_declaration_specifier(),
        }
    }

    /// True when `tok` can open a type name (casts, sizeof): any type
    /// specifier or qualifier, or a typedef-name, but never a storage class.
    pub(crate) fn token_starts_type_name(&self, tok: Token) -> bool {
        match tok.kind {
            TokenKind::Identifier => self.is_typedef_name(tok.lexeme),
            kind => kind.is_declaration_specifier() && !kind.is_storage_class(),
        }
    }
}
