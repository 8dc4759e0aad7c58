use super::*;
use crate::arena_ctx::AstArenas;
use crate::error::DiagnosticKind;
use crate::lexer::{Lexer, LexerContext};

macro_rules! parser_over {
    ($parser:ident, $interner:ident, $arenas:ident, $source:expr) => {
        let $arenas = AstArenas::new();
        let mut $interner = Interner::new();
        let lexer = Lexer::from_source($source, "test.c", &mut $interner);
        let mut $parser = Parser::new(lexer, LexerContext::new(), &mut $interner, $arenas.ctx());
    };
}

#[test]
fn tokens_are_pulled_lazily_and_keep_stable_indices() {
    parser_over!(parser, interner, arenas, "int x ;");
    assert_eq!(parser.tokens.len(), 0);
    let first = parser.peek();
    assert_eq!(first.kind, TokenKind::Int);
    assert_eq!(parser.tokens.len(), 1);
    let third = parser.peek_at(2);
    assert_eq!(third.kind, TokenKind::Semicolon);
    assert_eq!(parser.tokens.len(), 3);
    // re-reading an index returns the identical token
    assert_eq!(parser.peek_at(2), third);
}

#[test]
fn advance_stops_at_eof() {
    parser_over!(parser, interner, arenas, "x");
    parser.advance();
    let eof = parser.advance();
    assert_eq!(eof.kind, TokenKind::Eof);
    let again = parser.advance();
    assert_eq!(again, eof);
}

#[test]
fn consume_mismatch_reports_expected_token() {
    parser_over!(parser, interner, arenas, "+");
    let err = parser.consume(TokenKind::Semicolon).unwrap_err();
    assert!(matches!(
        err.kind,
        DiagnosticKind::ExpectedToken { found: TokenKind::Plus, .. }
    ));
}

#[test]
fn consume_at_eof_reports_unexpected_end_of_input() {
    parser_over!(parser, interner, arenas, "");
    let err = parser.consume(TokenKind::Semicolon).unwrap_err();
    assert!(matches!(
        err.kind,
        DiagnosticKind::UnexpectedEndOfInput { expected: TokenKind::Semicolon }
    ));
}

#[test]
fn starts_declaration_consults_the_symbol_table() {
    parser_over!(parser, interner, arenas, "typedef int T; T x; y z;");
    let unit_decl = parser.parse_external_declaration().unwrap();
    drop(unit_decl);
    assert!(parser.starts_declaration(), "typedef name should start a declaration");
    parser.parse_external_declaration().unwrap();
    assert!(!parser.starts_declaration(), "unknown identifier is not a declaration start");
}

#[test]
fn checkpoint_restore_round_trips_tokens_errors_and_symbols() {
    parser_over!(parser, interner, arenas, "int a; int b;");
    parser.parse_external_declaration().unwrap();

    let a = parser.interner.lookup("a").unwrap();
    assert!(parser.symbols.lookup(a).is_some());

    let before_pos = parser.current;
    let before_errors = parser.error_count();
    let cp = parser.checkpoint();

    // a speculative attempt that consumes tokens, declares a symbol, emits a
    // diagnostic, and then fails
    let outcome: Option<()> = parser.try_parse(|p| {
        p.parse_declaration()?;
        let diag = p.error_here(DiagnosticKind::ExpectedExpression);
        p.report(diag.clone());
        Err(diag)
    });
    assert!(outcome.is_none());
    drop(cp);

    assert_eq!(parser.current, before_pos);
    assert_eq!(parser.error_count(), before_errors);
    assert!(parser.diagnostics.is_empty());
    let b = parser.interner.lookup("b").unwrap();
    assert!(parser.symbols.lookup(b).is_none(), "b must be invisible after restore");
    assert!(parser.symbols.lookup(a).is_some(), "a must survive the restore");

    // produced tokens stay available for re-consumption
    parser.parse_external_declaration().unwrap();
    assert!(parser.symbols.lookup(b).is_some());
}

#[test]
fn restore_leaves_scopes_opened_before_the_checkpoint() {
    parser_over!(parser, interner, arenas, "a b c d e f g h");
    parser.advance();
    parser.enter_scope();
    parser.advance();
    let cp = parser.checkpoint();
    parser.advance();
    parser.enter_scope();
    assert_eq!(parser.symbols.depth(), 3);

    parser.restore(cp);
    assert_eq!(parser.symbols.depth(), 2);
}

#[test]
fn synchronize_consumes_through_semicolon() {
    parser_over!(parser, interner, arenas, "garbage tokens ; int x ;");
    parser.synchronize();
    assert_eq!(parser.peek_kind(), TokenKind::Int);
}

#[test]
fn synchronize_stops_at_closing_brace_without_consuming() {
    parser_over!(parser, interner, arenas, "oops }");
    parser.synchronize();
    assert_eq!(parser.peek_kind(), TokenKind::RBrace);
}

#[test]
fn redeclaration_as_different_kind_is_diagnosed() {
    parser_over!(parser, interner, arenas, "typedef int T; int T;");
    parser.parse_external_declaration().unwrap();
    let _ = parser.parse_external_declaration();
    assert!(
        parser
            .diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::RedeclarationOfSymbolAsDifferentType { .. })),
        "{:?}",
        parser.diagnostics
    );
}

#[test]
fn translation_unit_recovers_and_keeps_parsing() {
    parser_over!(parser, interner, arenas, "int broken(] ; int ok;");
    let unit = parser.parse_translation_unit();
    assert!(parser.error_count() > 0);
    let ok = parser.interner.lookup("ok").unwrap();
    assert!(parser.symbols.lookup(ok).is_some());
    assert!(!unit.decls.is_empty());
}
