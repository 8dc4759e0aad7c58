use crate::intern::{Interner, Symbol};
use crate::source::Position;
use crate::style::Style;
use crate::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A recoverable front-end diagnostic: a kind plus the position it was
/// produced at. Builder precondition violations are not diagnostics; they
/// abort (see `ir::builder`).
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    // Lexer
    UnterminatedBlockComment,
    UnterminatedStringLiteral,
    UnterminatedCharLiteral,
    StrayCharacter(char),
    IncludeNotFound { name: Symbol },
    MalformedDirective,

    // Numeric constants
    MalformedNumericConstant,
    IntegerConstantOutOfRange,

    // Parser
    ExpectedToken { expected: Vec<TokenKind>, found: TokenKind },
    UnexpectedEndOfInput { expected: TokenKind },
    IllegalDeclarationSpecifiers { prev: TokenKind },
    TypeSpecifierMissing,
    IllegalUseOfRestrict,
    ExpectedExpressionOrTypeNameAfterSizeof,
    ParameterTypeMalformed,
    ExpectedExpression,
    RedeclarationOfSymbolAsDifferentType { name: Symbol, prev: Position },
    EnumSpecifierWithoutIdentifierOrEnumeratorList,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::IntegerConstantOutOfRange => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, pos: Position) -> Self {
        Diagnostic { kind, pos }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn message(&self, interner: &Interner) -> String {
        match &self.kind {
            DiagnosticKind::UnterminatedBlockComment => "unterminated block comment".to_string(),
            DiagnosticKind::UnterminatedStringLiteral => {
                "unterminated string literal".to_string()
            }
            DiagnosticKind::UnterminatedCharLiteral => {
                "unterminated character literal".to_string()
            }
            DiagnosticKind::StrayCharacter(c) => {
                format!("stray '{}' in program", c.escape_default())
            }
            DiagnosticKind::IncludeNotFound { name } => {
                format!("'{}': no such file or directory", interner.resolve(*name))
            }
            DiagnosticKind::MalformedDirective => "malformed preprocessor directive".to_string(),
            DiagnosticKind::MalformedNumericConstant => "malformed numeric constant".to_string(),
            DiagnosticKind::IntegerConstantOutOfRange => {
                "integer constant is too large for its type".to_string()
            }
            DiagnosticKind::ExpectedToken { expected, found } => {
                let list = expected
                    .iter()
                    .map(|k| format!("{:?}", k))
                    .collect::<Vec<_>>()
                    .join(" or ");
                format!("expected {}, found {:?}", list, found)
            }
            DiagnosticKind::UnexpectedEndOfInput { expected } => {
                format!("unexpected end of input, expected {:?}", expected)
            }
            DiagnosticKind::IllegalDeclarationSpecifiers { prev } => {
                format!("cannot combine with previous {:?} declaration specifier", prev)
            }
            DiagnosticKind::TypeSpecifierMissing => {
                "type specifier missing in declaration".to_string()
            }
            DiagnosticKind::IllegalUseOfRestrict => {
                "restrict requires a pointer".to_string()
            }
            DiagnosticKind::ExpectedExpressionOrTypeNameAfterSizeof => {
                "expected expression or type name after sizeof".to_string()
            }
            DiagnosticKind::ParameterTypeMalformed => "malformed parameter type".to_string(),
            DiagnosticKind::ExpectedExpression => "expected expression".to_string(),
            DiagnosticKind::RedeclarationOfSymbolAsDifferentType { name, prev } => {
                format!(
                    "redeclaration of '{}' as a different kind of symbol (previous declaration at line {})",
                    interner.resolve(*name),
                    prev.line
                )
            }
            DiagnosticKind::EnumSpecifierWithoutIdentifierOrEnumeratorList => {
                "enum specifier requires an identifier or an enumerator list".to_string()
            }
        }
    }

    /// One-line rendering: `path:line:column: error: <message>`.
    pub fn render(&self, interner: &Interner) -> String {
        let label = match self.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        format!(
            "{}:{}:{}: {}: {}",
            interner.resolve(self.pos.path),
            self.pos.line,
            self.pos.column,
            label,
            self.message(interner)
        )
    }

    /// Multi-line rendering with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str, interner: &Interner) -> String {
        let line_content = source
            .lines()
            .nth(self.pos.line as usize - 1)
            .unwrap_or("");
        let col = (self.pos.column as usize).saturating_sub(1);
        let caret = format!("{}^", " ".repeat(col));

        let label = match self.severity() {
            Severity::Error => Style::bold_red("error"),
            Severity::Warning => Style::bold_yellow("warning"),
        };
        let line_num = Style::blue(&format!("{:4}", self.pos.line));
        let pipe = Style::blue("|");

        format!(
            "{}: {}\n{} {} {}\n     {} {}",
            label,
            self.message(interner),
            line_num,
            pipe,
            line_content,
            pipe,
            Style::red(&caret)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    fn at(interner: &mut Interner, line: u32, column: u32) -> Position {
        Position::new(interner.intern("test.c"), line, column)
    }

    #[test]
    fn render_is_one_line_with_location() {
        let mut interner = Interner::new();
        let pos = at(&mut interner, 4, 12);
        let diag = Diagnostic::new(DiagnosticKind::ExpectedExpression, pos);
        assert_eq!(diag.render(&interner), "test.c:4:12: error: expected expression");
    }

    #[test]
    fn overflow_renders_as_warning() {
        let mut interner = Interner::new();
        let pos = at(&mut interner, 1, 1);
        let diag = Diagnostic::new(DiagnosticKind::IntegerConstantOutOfRange, pos);
        assert_eq!(diag.severity(), Severity::Warning);
        assert!(diag.render(&interner).contains("warning:"));
    }

    #[test]
    fn expected_token_lists_alternatives() {
        let mut interner = Interner::new();
        let pos = at(&mut interner, 1, 1);
        let diag = Diagnostic::new(
            DiagnosticKind::ExpectedToken {
                expected: vec![TokenKind::Semicolon, TokenKind::Comma],
                found: TokenKind::RParen,
            },
            pos,
        );
        let msg = diag.message(&interner);
        assert!(msg.contains("Semicolon"));
        assert!(msg.contains("Comma"));
        assert!(msg.contains("RParen"));
    }

    #[test]
    fn display_with_source_underlines_the_column() {
        let mut interner = Interner::new();
        let pos = at(&mut interner, 2, 5);
        let diag = Diagnostic::new(DiagnosticKind::TypeSpecifierMissing, pos);
        let source = "int a;\nfoo bar;\n";
        let display = diag.display_with_source(source, &interner);
        assert!(display.contains("foo bar;"), "source line shown: {}", display);
        assert!(display.contains("    ^"), "caret at column: {}", display);
        assert!(display.contains("\x1b["), "colored: {}", display);
    }

    #[test]
    fn include_not_found_names_the_file() {
        let mut interner = Interner::new();
        let name = interner.intern("missing.h");
        let pos = at(&mut interner, 1, 1);
        let diag = Diagnostic::new(DiagnosticKind::IncludeNotFound { name }, pos);
        assert!(diag.message(&interner).contains("missing.h"));
    }
}
