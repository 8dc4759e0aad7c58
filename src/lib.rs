pub mod arena;
pub mod arena_ctx;
pub mod ast;
pub mod cli;
pub mod compile;
pub mod dump;
pub mod error;
pub mod intern;
pub mod ir;
pub mod lexer;
pub mod number;
pub mod parser;
pub mod source;
pub mod style;
pub mod token;
pub mod types;

pub use arena::Arena;
pub use arena_ctx::{AstArenas, AstContext};
pub use compile::{parse_file, parse_source, FrontendOptions, ParseOutcome};
pub use dump::{dump_translation_unit, type_to_string};
pub use error::{Diagnostic, DiagnosticKind, Severity};
pub use intern::{Interner, Symbol};
pub use ir::{Instr, IrBuilder, NodeId, Value, Var};
pub use lexer::{Lexer, LexerContext, MacroDefinition};
pub use parser::{DeclarationParsing, ExpressionParsing, Parser, StatementParsing};
pub use source::{Position, Span};
pub use token::{Token, TokenKind};
pub use types::{IntRank, StorageClass, Type, TypeKind};
