use std::io;
use std::path::{Path, PathBuf};

use crate::arena_ctx::AstContext;
use crate::ast::TranslationUnit;
use crate::error::{Diagnostic, Severity};
use crate::intern::Interner;
use crate::lexer::{Lexer, LexerContext, DEFAULT_SYSTEM_INCLUDE_PATHS};
use crate::parser::Parser;

/// Front-end configuration threaded through the driver; include search
/// paths are explicit values here rather than process-wide state.
#[derive(Debug, Clone, Default)]
pub struct FrontendOptions {
    pub user_include_paths: Vec<PathBuf>,
    pub system_include_paths: Vec<PathBuf>,
}

impl FrontendOptions {
    fn lexer_context(&self) -> LexerContext {
        let mut system = self.system_include_paths.clone();
        system.extend(DEFAULT_SYSTEM_INCLUDE_PATHS.iter().map(PathBuf::from));
        LexerContext::with_search_paths(self.user_include_paths.clone(), system)
    }
}

/// The parsed unit plus every diagnostic produced along the way. Parsing
/// never fails as such; success is the absence of error-severity
/// diagnostics.
pub struct ParseOutcome<'a> {
    pub unit: TranslationUnit<'a>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> ParseOutcome<'a> {
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }
}

pub fn parse_source<'a>(
    source: &str,
    name: &str,
    ctx: AstContext<'a>,
    interner: &mut Interner,
    options: &FrontendOptions,
) -> ParseOutcome<'a> {
    let lexer = Lexer::from_source(source, name, interner);
    run_parser(lexer, options.lexer_context(), ctx, interner)
}

pub fn parse_file<'a>(
    path: &Path,
    ctx: AstContext<'a>,
    interner: &mut Interner,
    options: &FrontendOptions,
) -> io::Result<ParseOutcome<'a>> {
    let lexer = Lexer::from_file(path, interner)?;
    Ok(run_parser(lexer, options.lexer_context(), ctx, interner))
}

fn run_parser<'a>(
    lexer: Lexer,
    lex_ctx: LexerContext,
    ctx: AstContext<'a>,
    interner: &mut Interner,
) -> ParseOutcome<'a> {
    let mut parser = Parser::new(lexer, lex_ctx, interner, ctx);
    let unit = parser.parse_translation_unit();
    let diagnostics = parser.into_diagnostics();
    ParseOutcome { unit, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::AstArenas;

    #[test]
    fn well_formed_source_has_no_diagnostics() {
        let arenas = AstArenas::new();
        let mut interner = Interner::new();
        let outcome = parse_source(
            "int main(void) { return 0; }",
            "main.c",
            arenas.ctx(),
            &mut interner,
            &FrontendOptions::default(),
        );
        assert!(outcome.is_success(), "{:?}", outcome.diagnostics);
        assert_eq!(outcome.unit.decls.len(), 1);
    }

    #[test]
    fn broken_source_reports_errors_but_still_returns_a_unit() {
        let arenas = AstArenas::new();
        let mut interner = Interner::new();
        let outcome = parse_source(
            "int f(void) { return }\nint g(void) { return 1; }",
            "broken.c",
            arenas.ctx(),
            &mut interner,
            &FrontendOptions::default(),
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.unit.decls.len(), 2);
    }

    #[test]
    fn warnings_do_not_fail_the_parse() {
        let arenas = AstArenas::new();
        let mut interner = Interner::new();
        let outcome = parse_source(
            "unsigned long long x = 99999999999999999999;",
            "warn.c",
            arenas.ctx(),
            &mut interner,
            &FrontendOptions::default(),
        );
        assert!(outcome.is_success());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].severity(), Severity::Warning);
    }
}
