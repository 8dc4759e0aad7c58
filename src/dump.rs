//! Human-readable rendering of parsed ASTs and types, used by the driver's
//! `--ast` flag and by diagnostics that mention types.

use crate::ast::{
    BlockItem, Constant, Declaration, Designator, Expr, ExprKind, ExternalDecl, ForInit,
    InitItem, Initializer, Stmt, StmtKind, TranslationUnit,
};
use crate::intern::Interner;
use crate::types::{FloatRank, IntRank, Type, TypeKind};

/// Render a type as prose, reading outside in: `array[2] of pointer to
/// function(void) returning int`.
pub fn type_to_string(ty: &Type<'_>, interner: &Interner) -> String {
    let mut out = String::new();
    if ty.is_const {
        out.push_str("const ");
    }
    if ty.is_volatile {
        out.push_str("volatile ");
    }
    match ty.kind {
        TypeKind::Void => out.push_str("void"),
        TypeKind::Integer { signed, rank } => {
            let name = match (signed, rank) {
                (_, IntRank::Bool) => "_Bool",
                (true, IntRank::Char) => "char",
                (false, IntRank::Char) => "unsigned char",
                (true, IntRank::Short) => "short",
                (false, IntRank::Short) => "unsigned short",
                (true, IntRank::Int) => "int",
                (false, IntRank::Int) => "unsigned int",
                (true, IntRank::Long) => "long",
                (false, IntRank::Long) => "unsigned long",
                (true, IntRank::LongLong) => "long long",
                (false, IntRank::LongLong) => "unsigned long long",
            };
            out.push_str(name);
        }
        TypeKind::Floating { rank } => out.push_str(match rank {
            FloatRank::Float => "float",
            FloatRank::Double => "double",
            FloatRank::LongDouble => "long double",
        }),
        TypeKind::Pointer { pointee, is_const, is_volatile, is_restrict } => {
            if is_const {
                out.push_str("const ");
            }
            if is_volatile {
                out.push_str("volatile ");
            }
            if is_restrict {
                out.push_str("restrict ");
            }
            out.push_str("pointer to ");
            out.push_str(&type_to_string(pointee, interner));
        }
        TypeKind::Array { element, size } => {
            match size.and_then(constant_int_value) {
                Some(n) => out.push_str(&format!("array[{}] of ", n)),
                None if size.is_some() => out.push_str("array[expr] of "),
                None => out.push_str("array[] of "),
            }
            out.push_str(&type_to_string(element, interner));
        }
        TypeKind::Function { ret, params, variadic } => {
            out.push_str("function(");
            if params.is_empty() {
                out.push_str("void");
            } else {
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&type_to_string(param.ty, interner));
                }
            }
            if variadic {
                out.push_str(", ...");
            }
            out.push_str(") returning ");
            out.push_str(&type_to_string(ret, interner));
        }
        TypeKind::Record { tag, is_union, .. } => {
            out.push_str(if is_union { "union" } else { "struct" });
            match tag {
                Some(tag) => {
                    out.push(' ');
                    out.push_str(interner.resolve(tag));
                }
                None => out.push_str(" <anonymous>"),
            }
        }
        TypeKind::Enum { tag, .. } => {
            out.push_str("enum");
            match tag {
                Some(tag) => {
                    out.push(' ');
                    out.push_str(interner.resolve(tag));
                }
                None => out.push_str(" <anonymous>"),
            }
        }
    }
    out
}

fn constant_int_value(expr: &Expr<'_>) -> Option<u64> {
    match expr.kind {
        ExprKind::Constant(Constant::Int { value, .. }) => Some(value),
        _ => None,
    }
}

pub fn dump_translation_unit(unit: &TranslationUnit<'_>, interner: &Interner) -> String {
    let mut printer = AstPrinter { interner, out: String::new(), depth: 0 };
    printer.line("TranslationUnit");
    printer.depth += 1;
    for decl in &unit.decls {
        printer.external(decl);
    }
    printer.out
}

struct AstPrinter<'i> {
    interner: &'i Interner,
    out: String,
    depth: usize,
}

impl<'i> AstPrinter<'i> {
    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn external(&mut self, decl: &ExternalDecl<'_>) {
        match decl {
            ExternalDecl::Function(func) => {
                let name = self.interner.resolve(func.name).to_string();
                self.line(format!("FunctionDef {}", name));
                self.depth += 1;
                self.line(format!("returns {}", type_to_string(func.ret, self.interner)));
                for param in func.params {
                    let pname = param
                        .name
                        .map(|n| self.interner.resolve(n).to_string())
                        .unwrap_or_else(|| "<unnamed>".to_string());
                    self.line(format!(
                        "param {}: {}",
                        pname,
                        type_to_string(param.ty, self.interner)
                    ));
                }
                if func.variadic {
                    self.line("variadic");
                }
                self.stmt(func.body);
                self.depth -= 1;
            }
            ExternalDecl::Declarations(decls) => {
                for decl in decls.iter() {
                    self.declaration(decl);
                }
            }
        }
    }

    fn declaration(&mut self, decl: &Declaration<'_>) {
        let name = decl
            .name
            .map(|n| self.interner.resolve(n).to_string())
            .unwrap_or_else(|| "<none>".to_string());
        self.line(format!(
            "Declaration {}: {}",
            name,
            type_to_string(decl.ty, self.interner)
        ));
        if let Some(init) = decl.init {
            self.depth += 1;
            self.initializer(init);
            self.depth -= 1;
        }
    }

    fn initializer(&mut self, init: &Initializer<'_>) {
        match init {
            Initializer::Expr(expr) => self.expr(expr),
            Initializer::List { items, .. } => {
                self.line("InitializerList");
                self.depth += 1;
                for item in items.iter() {
                    self.init_item(item);
                }
                self.depth -= 1;
            }
        }
    }

    fn init_item(&mut self, item: &InitItem<'_>) {
        if !item.designation.is_empty() {
            let mut text = String::from("designation");
            for designator in item.designation {
                match designator {
                    Designator::Index(_) => text.push_str(" [index]"),
                    Designator::Field(name) => {
                        text.push_str(" .");
                        text.push_str(self.interner.resolve(*name));
                    }
                }
            }
            self.line(text);
        }
        self.initializer(item.init);
    }

    fn stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt.kind {
            StmtKind::Empty => self.line("Empty"),
            StmtKind::Compound(items) => {
                self.line("Compound");
                self.depth += 1;
                for item in items {
                    match item {
                        BlockItem::Decl(decls) => {
                            for decl in decls.iter() {
                                self.declaration(decl);
                            }
                        }
                        BlockItem::Stmt(inner) => self.stmt(inner),
                    }
                }
                self.depth -= 1;
            }
            StmtKind::Expr(expr) => {
                self.line("ExprStmt");
                self.depth += 1;
                self.expr(expr);
                self.depth -= 1;
            }
            StmtKind::If { cond, then_stmt, else_stmt } => {
                self.line("If");
                self.depth += 1;
                self.expr(cond);
                self.stmt(then_stmt);
                if let Some(else_stmt) = else_stmt {
                    self.line("Else");
                    self.stmt(else_stmt);
                }
                self.depth -= 1;
            }
            StmtKind::Return(value) => {
                self.line("Return");
                if let Some(value) = value {
                    self.depth += 1;
                    self.expr(value);
                    self.depth -= 1;
                }
            }
            StmtKind::While { cond, body } => {
                self.line("While");
                self.depth += 1;
                self.expr(cond);
                self.stmt(body);
                self.depth -= 1;
            }
            StmtKind::DoWhile { body, cond } => {
                self.line("DoWhile");
                self.depth += 1;
                self.stmt(body);
                self.expr(cond);
                self.depth -= 1;
            }
            StmtKind::For { init, cond, post, body } => {
                self.line("For");
                self.depth += 1;
                match init {
                    ForInit::None => {}
                    ForInit::Expr(expr) => self.expr(expr),
                    ForInit::Decl(decls) => {
                        for decl in decls.iter() {
                            self.declaration(decl);
                        }
                    }
                }
                if let Some(cond) = cond {
                    self.expr(cond);
                }
                if let Some(post) = post {
                    self.expr(post);
                }
                self.stmt(body);
                self.depth -= 1;
            }
            StmtKind::Break => self.line("Break"),
            StmtKind::Continue => self.line("Continue"),
            StmtKind::Goto(label) => {
                let label = self.interner.resolve(label).to_string();
                self.line(format!("Goto {}", label));
            }
            StmtKind::Label { name, inner } => {
                let name = self.interner.resolve(name).to_string();
                self.line(format!("Label {}", name));
                self.depth += 1;
                self.stmt(inner);
                self.depth -= 1;
            }
            StmtKind::Switch { cond, body } => {
                self.line("Switch");
                self.depth += 1;
                self.expr(cond);
                self.stmt(body);
                self.depth -= 1;
            }
            StmtKind::Case { expr, inner } => {
                match expr {
                    Some(expr) => {
                        self.line("Case");
                        self.depth += 1;
                        self.expr(expr);
                        self.depth -= 1;
                    }
                    None => self.line("Default"),
                }
                self.depth += 1;
                self.stmt(inner);
                self.depth -= 1;
            }
        }
    }

    fn expr(&mut self, expr: &Expr<'_>) {
        match expr.kind {
            ExprKind::Ident(name) => {
                let name = self.interner.resolve(name).to_string();
                self.line(format!("Ident {}", name));
            }
            ExprKind::Constant(constant) => match constant {
                Constant::Int { value, signed, rank } => {
                    let ty = Type::new(TypeKind::Integer { signed, rank });
                    self.line(format!(
                        "Constant {} '{}'",
                        value,
                        type_to_string(&ty, self.interner)
                    ));
                }
                Constant::Float { value, rank } => {
                    let ty = Type::new(TypeKind::Floating { rank });
                    self.line(format!(
                        "Constant {} '{}'",
                        value,
                        type_to_string(&ty, self.interner)
                    ));
                }
                Constant::Char { value } => self.line(format!("CharConstant {}", value)),
            },
            ExprKind::StringLit(text) => {
                let text = self.interner.resolve(text).to_string();
                self.line(format!("String {:?}", text));
            }
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Binary { op, left, right, .. } => {
                self.line(format!("Binary {:?}", op));
                self.depth += 1;
                self.expr(left);
                self.expr(right);
                self.depth -= 1;
            }
            ExprKind::Unary { op, operand } => {
                self.line(format!("Unary {:?}", op));
                self.depth += 1;
                self.expr(operand);
                self.depth -= 1;
            }
            ExprKind::Ternary { cond, then_expr, else_expr } => {
                self.line("Ternary");
                self.depth += 1;
                self.expr(cond);
                self.expr(then_expr);
                self.expr(else_expr);
                self.depth -= 1;
            }
            ExprKind::Call { callee, args } => {
                self.line("Call");
                self.depth += 1;
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
                self.depth -= 1;
            }
            ExprKind::Index { base, index } => {
                self.line("ArraySubscript");
                self.depth += 1;
                self.expr(base);
                self.expr(index);
                self.depth -= 1;
            }
            ExprKind::Member { base, arrow, member } => {
                let member = self.interner.resolve(member).to_string();
                self.line(format!(
                    "Member {}{}",
                    if arrow { "->" } else { "." },
                    member
                ));
                self.depth += 1;
                self.expr(base);
                self.depth -= 1;
            }
            ExprKind::SizeofType { ty } => {
                self.line(format!("SizeofType {}", type_to_string(ty, self.interner)));
            }
            ExprKind::Cast { ty, operand } => {
                self.line(format!("Cast {}", type_to_string(ty, self.interner)));
                self.depth += 1;
                self.expr(operand);
                self.depth -= 1;
            }
            ExprKind::CompoundLiteral { ty, items } => {
                self.line(format!(
                    "CompoundLiteral {}",
                    type_to_string(ty, self.interner)
                ));
                self.depth += 1;
                for item in items {
                    self.init_item(item);
                }
                self.depth -= 1;
            }
            ExprKind::TypeOperand { ty } => {
                self.line(format!("Type {}", type_to_string(ty, self.interner)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::AstArenas;
    use crate::compile::{parse_source, FrontendOptions};

    fn dump(source: &str) -> String {
        let arenas = AstArenas::new();
        let mut interner = Interner::new();
        let outcome = parse_source(
            source,
            "dump.c",
            arenas.ctx(),
            &mut interner,
            &FrontendOptions::default(),
        );
        assert!(outcome.is_success(), "{:?}", outcome.diagnostics);
        dump_translation_unit(&outcome.unit, &interner)
    }

    #[test]
    fn function_with_body_renders_nested() {
        let text = dump("int square(int value) { return value * value; }");
        assert!(text.contains("FunctionDef square"), "{}", text);
        assert!(text.contains("param value: int"), "{}", text);
        assert!(text.contains("Binary Mul"), "{}", text);
        assert!(text.contains("Ident value"), "{}", text);
    }

    #[test]
    fn declaration_renders_prose_type() {
        let text = dump("int (*foo[2])(void);");
        assert!(
            text.contains("Declaration foo: array[2] of pointer to function(void) returning int"),
            "{}",
            text
        );
    }

    #[test]
    fn indentation_tracks_nesting() {
        let text = dump("int f(void) { if (1) return 2; return 3; }");
        assert!(text.contains("    If"), "{}", text);
        assert!(text.contains("      Constant 1 'int'"), "{}", text);
    }
}
