use crate::arena::Arena;
use crate::ast::{
    BinaryOp, BlockItem, Declaration, Designator, Expr, ExprKind, FunctionDef, InitItem,
    Initializer, Stmt, StmtKind, UnaryOp,
};
use crate::source::Span;
use crate::types::{Arith, Enumerator, Field, FloatRank, IntRank, ParamDecl, Type, TypeKind};

/// Every arena a translation unit allocates from, one per node family.
/// Declare it before the parser and borrow an [`AstContext`] from it; the
/// arenas outlive every AST and type reference handed out.
#[derive(Default)]
pub struct AstArenas<'a> {
    pub types: Arena<Type<'a>>,
    pub exprs: Arena<Expr<'a>>,
    pub expr_refs: Arena<&'a Expr<'a>>,
    pub stmts: Arena<Stmt<'a>>,
    pub block_items: Arena<BlockItem<'a>>,
    pub decls: Arena<Declaration<'a>>,
    pub inits: Arena<Initializer<'a>>,
    pub init_items: Arena<InitItem<'a>>,
    pub designators: Arena<Designator<'a>>,
    pub params: Arena<ParamDecl<'a>>,
    pub fields: Arena<Field<'a>>,
    pub enumerators: Arena<Enumerator<'a>>,
    pub funcs: Arena<FunctionDef<'a>>,
}

impl<'a> AstArenas<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ctx(&'a self) -> AstContext<'a> {
        AstContext { arenas: self }
    }
}

/// Cheap copyable handle over the arenas, passed everywhere a node is built.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    arenas: &'a AstArenas<'a>,
}

impl<'a> AstContext<'a> {
    pub fn alloc_type(&self, ty: Type<'a>) -> &'a Type<'a> {
        self.arenas.types.alloc(ty)
    }

    pub fn type_of(&self, kind: TypeKind<'a>) -> &'a Type<'a> {
        self.alloc_type(Type::new(kind))
    }

    pub fn void(&self) -> &'a Type<'a> {
        self.type_of(TypeKind::Void)
    }

    pub fn integer(&self, signed: bool, rank: IntRank) -> &'a Type<'a> {
        self.type_of(TypeKind::Integer { signed, rank })
    }

    pub fn int(&self) -> &'a Type<'a> {
        self.integer(true, IntRank::Int)
    }

    pub fn floating(&self, rank: FloatRank) -> &'a Type<'a> {
        self.type_of(TypeKind::Floating { rank })
    }

    /// Unqualified pointer to `inner`.
    pub fn pointer_to(&self, inner: &'a Type<'a>) -> &'a Type<'a> {
        self.type_of(TypeKind::Pointer {
            pointee: inner,
            is_const: false,
            is_volatile: false,
            is_restrict: false,
        })
    }

    /// Materialize the result of the arithmetic conversion rules.
    pub fn arith(&self, class: Arith) -> &'a Type<'a> {
        match class {
            Arith::Int { signed, rank } => self.integer(signed, rank),
            Arith::Float { rank } => self.floating(rank),
        }
    }

    pub fn alloc_expr(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.arenas.exprs.alloc(expr)
    }

    #[inline(always)]
    pub fn expr(&self, span: Span, kind: ExprKind<'a>) -> &'a Expr<'a> {
        self.alloc_expr(Expr { span, kind })
    }

    #[inline(always)]
    pub fn binary(
        &self,
        op: BinaryOp,
        op_tok: usize,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    ) -> &'a Expr<'a> {
        self.expr(
            left.span.merge(right.span),
            ExprKind::Binary { op, op_tok, left, right },
        )
    }

    #[inline(always)]
    pub fn unary(&self, span: Span, op: UnaryOp, operand: &'a Expr<'a>) -> &'a Expr<'a> {
        self.expr(span.merge(operand.span), ExprKind::Unary { op, operand })
    }

    pub fn alloc_expr_refs<I>(&self, exprs: I) -> &'a [&'a Expr<'a>]
    where
        I: IntoIterator<Item = &'a Expr<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.expr_refs.alloc_slice(exprs)
    }

    pub fn alloc_stmt(&self, stmt: Stmt<'a>) -> &'a Stmt<'a> {
        self.arenas.stmts.alloc(stmt)
    }

    #[inline(always)]
    pub fn stmt(&self, span: Span, kind: StmtKind<'a>) -> &'a Stmt<'a> {
        self.alloc_stmt(Stmt { span, kind })
    }

    pub fn alloc_block_items<I>(&self, items: I) -> &'a [BlockItem<'a>]
    where
        I: IntoIterator<Item = BlockItem<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.block_items.alloc_slice(items)
    }

    pub fn alloc_decls<I>(&self, decls: I) -> &'a [Declaration<'a>]
    where
        I: IntoIterator<Item = Declaration<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.decls.alloc_slice(decls)
    }

    pub fn alloc_init(&self, init: Initializer<'a>) -> &'a Initializer<'a> {
        self.arenas.inits.alloc(init)
    }

    pub fn alloc_init_items<I>(&self, items: I) -> &'a [InitItem<'a>]
    where
        I: IntoIterator<Item = InitItem<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.init_items.alloc_slice(items)
    }

    pub fn alloc_designators<I>(&self, designators: I) -> &'a [Designator<'a>]
    where
        I: IntoIterator<Item = Designator<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.designators.alloc_slice(designators)
    }

    pub fn alloc_params<I>(&self, params: I) -> &'a [ParamDecl<'a>]
    where
        I: IntoIterator<Item = ParamDecl<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.params.alloc_slice(params)
    }

    pub fn alloc_fields<I>(&self, fields: I) -> &'a [Field<'a>]
    where
        I: IntoIterator<Item = Field<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.fields.alloc_slice(fields)
    }

    pub fn alloc_enumerators<I>(&self, enumerators: I) -> &'a [Enumerator<'a>]
    where
        I: IntoIterator<Item = Enumerator<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.enumerators.alloc_slice(enumerators)
    }

    pub fn alloc_func(&self, func: FunctionDef<'a>) -> &'a FunctionDef<'a> {
        self.arenas.funcs.alloc(func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Position;

    #[test]
    fn binary_helper_merges_spans() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();

        let left = ctx.expr(
            Position::new(crate::intern::Symbol::EMPTY, 1, 1).span(),
            ExprKind::Constant(crate::ast::Constant::Int {
                value: 1,
                signed: true,
                rank: IntRank::Int,
            }),
        );
        let right = ctx.expr(
            Position::new(crate::intern::Symbol::EMPTY, 1, 5).span(),
            ExprKind::Constant(crate::ast::Constant::Int {
                value: 2,
                signed: true,
                rank: IntRank::Int,
            }),
        );
        let sum = ctx.binary(BinaryOp::Add, 1, left, right);

        assert!(matches!(sum.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
        assert_eq!(sum.span.start.column, 1);
        assert_eq!(sum.span.end.column, 5);
    }

    #[test]
    fn pointer_to_wraps_inner_type() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let ptr = ctx.pointer_to(ctx.int());
        assert!(ptr.is_pointer());
        match ptr.kind {
            TypeKind::Pointer { pointee, .. } => assert!(pointee.is_integer()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn arith_materializes_conversion_results() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let ty = ctx.arith(Arith::Int { signed: false, rank: IntRank::Long });
        match ty.kind {
            TypeKind::Integer { signed, rank } => {
                assert!(!signed);
                assert_eq!(rank, IntRank::Long);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn slices_round_trip_through_arena() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let a = ctx.expr(Span::default(), ExprKind::Ident(crate::intern::Symbol::EMPTY));
        let refs = ctx.alloc_expr_refs(vec![a, a]);
        assert_eq!(refs.len(), 2);
    }
}
