mod decl;
mod expr;
mod stmt;

pub use decl::{
    Declaration, Designator, ExternalDecl, FunctionDef, InitItem, Initializer, TranslationUnit,
};
pub use expr::{BinaryOp, Constant, Expr, ExprKind, UnaryOp};
pub use stmt::{BlockItem, ForInit, Stmt, StmtKind};
