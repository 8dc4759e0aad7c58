use crate::intern::Symbol;
use crate::source::Position;

/// Closed set of token kinds. Keywords are re-tagged identifiers; the
/// preprocessor kinds never reach the parser (the lexer consumes directives),
/// and `Newline` only appears while a directive line is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Bool,
    Complex,
    Struct,
    Union,
    Enum,
    Typedef,
    Static,
    Auto,
    Register,
    If,
    Else,
    Switch,
    Case,
    Default,
    Goto,
    Continue,
    Break,
    Return,
    While,
    Do,
    For,
    Sizeof,
    Const,
    Restrict,
    Volatile,
    Extern,
    Inline,

    // Punctuators
    Assign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PlusAssign,
    MinusAssign,
    ShlAssign,
    ShrAssign,
    AmpAssign,
    CaretAssign,
    PipeAssign,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Bang,
    Semicolon,
    Comma,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Dot,
    Plus,
    Minus,
    Arrow,
    Star,
    Slash,
    PlusPlus,
    MinusMinus,
    EqEq,
    BangEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Ellipsis,
    Percent,
    Shl,
    Shr,
    Question,

    // Literals
    Identifier,
    IntegerConstant,
    FloatingConstant,
    CharLiteral,
    StringLiteral,

    // Preprocessor
    Hash,
    HashHash,
    PpInclude,
    PpDefine,
    PpUndef,
    PpIfdef,
    PpLine,

    // Control
    Newline,
    Eof,
}

impl TokenKind {
    /// True for the keyword kinds that can open a declaration-specifier list
    /// without consulting the symbol table.
    pub fn is_declaration_specifier(self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Bool
                | TokenKind::Complex
                | TokenKind::Struct
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Typedef
                | TokenKind::Static
                | TokenKind::Auto
                | TokenKind::Register
                | TokenKind::Extern
                | TokenKind::Inline
                | TokenKind::Const
                | TokenKind::Restrict
                | TokenKind::Volatile
        )
    }

    /// Storage-class keywords; at most one may appear per declaration.
    pub fn is_storage_class(self) -> bool {
        matches!(
            self,
            TokenKind::Typedef
                | TokenKind::Static
                | TokenKind::Auto
                | TokenKind::Register
                | TokenKind::Extern
        )
    }

    /// Assignment operators, for the right-associative assignment level.
    pub fn is_assignment_op(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::ShlAssign
                | TokenKind::ShrAssign
                | TokenKind::AmpAssign
                | TokenKind::CaretAssign
                | TokenKind::PipeAssign
        )
    }
}

/// Reserved-word table: identifiers whose spelling matches an entry are
/// re-tagged by the lexer. `_Bool` and `_Complex` keep their underscore
/// spellings here.
pub fn keyword_kind(lexeme: &str) -> Option<TokenKind> {
    let kind = match lexeme {
        "void" => TokenKind::Void,
        "char" => TokenKind::Char,
        "short" => TokenKind::Short,
        "int" => TokenKind::Int,
        "long" => TokenKind::Long,
        "float" => TokenKind::Float,
        "double" => TokenKind::Double,
        "signed" => TokenKind::Signed,
        "unsigned" => TokenKind::Unsigned,
        "_Bool" => TokenKind::Bool,
        "_Complex" => TokenKind::Complex,
        "struct" => TokenKind::Struct,
        "union" => TokenKind::Union,
        "enum" => TokenKind::Enum,
        "typedef" => TokenKind::Typedef,
        "static" => TokenKind::Static,
        "auto" => TokenKind::Auto,
        "register" => TokenKind::Register,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "goto" => TokenKind::Goto,
        "continue" => TokenKind::Continue,
        "break" => TokenKind::Break,
        "return" => TokenKind::Return,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "for" => TokenKind::For,
        "sizeof" => TokenKind::Sizeof,
        "const" => TokenKind::Const,
        "restrict" => TokenKind::Restrict,
        "volatile" => TokenKind::Volatile,
        "extern" => TokenKind::Extern,
        "inline" => TokenKind::Inline,
        _ => return None,
    };
    Some(kind)
}

/// A lexed token. `lexeme` holds the interned source spelling for
/// identifiers and literals (and the keyword spelling for keywords);
/// punctuators carry `Symbol::EMPTY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Symbol,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: Symbol, pos: Position) -> Self {
        Token { kind, lexeme, pos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    #[test]
    fn keyword_table_retags_reserved_words() {
        assert_eq!(keyword_kind("while"), Some(TokenKind::While));
        assert_eq!(keyword_kind("typedef"), Some(TokenKind::Typedef));
        assert_eq!(keyword_kind("restrict"), Some(TokenKind::Restrict));
    }

    #[test]
    fn underscore_bool_maps_to_bool_kind() {
        assert_eq!(keyword_kind("_Bool"), Some(TokenKind::Bool));
        assert_eq!(keyword_kind("_Complex"), Some(TokenKind::Complex));
    }

    #[test]
    fn ordinary_identifiers_are_not_keywords() {
        assert_eq!(keyword_kind("main"), None);
        assert_eq!(keyword_kind("Int"), None);
        assert_eq!(keyword_kind("bool"), None);
    }

    #[test]
    fn token_carries_position_and_lexeme() {
        let mut interner = Interner::new();
        let name = interner.intern("x");
        let path = interner.intern("a.c");
        let tok = Token::new(TokenKind::Identifier, name, Position::new(path, 3, 7));
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.pos.line, 3);
        assert_eq!(tok.pos.column, 7);
        assert_eq!(interner.resolve(tok.lexeme), "x");
    }

    #[test]
    fn storage_class_kinds_are_declaration_specifiers() {
        for kind in [
            TokenKind::Typedef,
            TokenKind::Static,
            TokenKind::Auto,
            TokenKind::Register,
            TokenKind::Extern,
        ] {
            assert!(kind.is_storage_class());
            assert!(kind.is_declaration_specifier());
        }
        assert!(!TokenKind::Identifier.is_storage_class());
    }

    #[test]
    fn compound_assignment_ops_are_assignment_ops() {
        assert!(TokenKind::Assign.is_assignment_op());
        assert!(TokenKind::ShlAssign.is_assignment_op());
        assert!(!TokenKind::EqEq.is_assignment_op());
    }
}
