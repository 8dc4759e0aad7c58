use crate::arena_ctx::AstContext;
use crate::intern::Symbol;
use crate::types::{IntRank, Type};

use super::{AluOp, CastOp, CmpOp, Const, ConstValue, Instr, Value, Var};

/// Stable handle to an instruction node. Links are indices into the
/// builder's node slab, never pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

struct Node<'a> {
    /// `None` once the node has been detached by `clear_after` or drained by
    /// `finalize`.
    instr: Option<Instr<'a>>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// Cursor-based builder over a doubly-linked instruction list for a single
/// function. Insertion happens after the cursor (`None` means at the head),
/// and the cursor advances to each newly inserted node, so consecutive calls
/// emit instructions in call order.
///
/// Precondition violations (a non-pointer `alloca` result, a dead node
/// handle) are programmer errors and abort.
pub struct IrBuilder<'a> {
    ctx: AstContext<'a>,
    nodes: Vec<Node<'a>>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    cursor: Option<NodeId>,
}

impl<'a> IrBuilder<'a> {
    pub fn new(ctx: AstContext<'a>) -> Self {
        IrBuilder { ctx, nodes: Vec::new(), head: None, tail: None, len: 0, cursor: None }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    fn node(&self, id: NodeId) -> &Node<'a> {
        let node = &self.nodes[id.index()];
        assert!(node.instr.is_some(), "use of a detached instruction node");
        node
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<'a> {
        let node = &mut self.nodes[id.index()];
        assert!(node.instr.is_some(), "use of a detached instruction node");
        node
    }

    pub fn instr(&self, id: NodeId) -> &Instr<'a> {
        self.node(id).instr.as_ref().unwrap()
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    // ------------------------------------------------------------------
    // Cursor control
    // ------------------------------------------------------------------

    pub fn get_position(&self) -> Option<NodeId> {
        self.cursor
    }

    /// Next insertion becomes the new head.
    pub fn position_at_beginning(&mut self) {
        self.cursor = None;
    }

    /// Next insertion becomes the new tail.
    pub fn position_at_end(&mut self) {
        self.cursor = self.tail;
    }

    /// Next insertion lands immediately before `node`.
    pub fn position_before(&mut self, node: NodeId) {
        self.cursor = self.node(node).prev;
    }

    /// Next insertion lands immediately after `node`.
    pub fn position_after(&mut self, node: NodeId) {
        self.node(node);
        self.cursor = Some(node);
    }

    // ------------------------------------------------------------------
    // List surgery
    // ------------------------------------------------------------------

    fn insert(&mut self, instr: Instr<'a>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        match self.cursor {
            None => {
                let old_head = self.head;
                self.nodes.push(Node { instr: Some(instr), prev: None, next: old_head });
                match old_head {
                    Some(h) => self.node_mut(h).prev = Some(id),
                    None => self.tail = Some(id),
                }
                self.head = Some(id);
            }
            Some(c) => {
                let old_next = self.node(c).next;
                self.nodes.push(Node { instr: Some(instr), prev: Some(c), next: old_next });
                self.node_mut(c).next = Some(id);
                match old_next {
                    Some(n) => self.node_mut(n).prev = Some(id),
                    None => self.tail = Some(id),
                }
            }
        }
        self.len += 1;
        self.cursor = Some(id);
        id
    }

    /// Detach and discard every successor of `node`; `node` becomes the
    /// tail. A cursor pointing into the discarded suffix moves back to
    /// `node`.
    pub fn clear_after(&mut self, node: NodeId) {
        let mut next = self.node(node).next;
        self.node_mut(node).next = None;
        self.tail = Some(node);
        while let Some(id) = next {
            let dead = &mut self.nodes[id.index()];
            next = dead.next.take();
            dead.prev = None;
            dead.instr = None;
            self.len -= 1;
            if self.cursor == Some(id) {
                self.cursor = Some(node);
            }
        }
    }

    /// Copy the list into a vector in order, consuming the builder and
    /// disposing its nodes. `drop` is the non-transferring variant.
    pub fn finalize(mut self) -> Vec<Instr<'a>> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let node = &mut self.nodes[id.index()];
            cursor = node.next;
            out.push(node.instr.take().expect("list links only reach live nodes"));
        }
        out
    }

    // ------------------------------------------------------------------
    // Typed constructors, one per opcode
    // ------------------------------------------------------------------

    pub fn nop(&mut self, label: Option<Symbol>) -> NodeId {
        self.insert(Instr::Nop { label })
    }

    pub fn assign(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.insert(Instr::Assign { src, dst })
    }

    fn binary(&mut self, op: AluOp, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.insert(Instr::Binary { op, left, right, dst })
    }

    pub fn add(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Add, left, right, dst)
    }

    pub fn sub(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Sub, left, right, dst)
    }

    pub fn mul(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Mul, left, right, dst)
    }

    pub fn div(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Div, left, right, dst)
    }

    pub fn modulo(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Mod, left, right, dst)
    }

    pub fn and(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::And, left, right, dst)
    }

    pub fn or(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Or, left, right, dst)
    }

    pub fn xor(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Xor, left, right, dst)
    }

    pub fn shl(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Shl, left, right, dst)
    }

    pub fn shr(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.binary(AluOp::Shr, left, right, dst)
    }

    pub fn not(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.insert(Instr::Not { src, dst })
    }

    fn compare(&mut self, op: CmpOp, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.insert(Instr::Compare { op, left, right, dst })
    }

    pub fn eq(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.compare(CmpOp::Eq, left, right, dst)
    }

    pub fn ne(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.compare(CmpOp::Ne, left, right, dst)
    }

    pub fn lt(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.compare(CmpOp::Lt, left, right, dst)
    }

    pub fn le(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.compare(CmpOp::Le, left, right, dst)
    }

    pub fn gt(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.compare(CmpOp::Gt, left, right, dst)
    }

    pub fn ge(&mut self, left: Value<'a>, right: Value<'a>, dst: Var<'a>) -> NodeId {
        self.compare(CmpOp::Ge, left, right, dst)
    }

    pub fn br(&mut self, label: Symbol) -> NodeId {
        self.insert(Instr::Br { label })
    }

    pub fn br_cond(&mut self, cond: Value<'a>, label: Symbol) -> NodeId {
        self.insert(Instr::BrCond { cond, label })
    }

    pub fn call(&mut self, callee: Value<'a>, args: Vec<Value<'a>>, dst: Option<Var<'a>>) -> NodeId {
        self.insert(Instr::Call { callee, args, dst })
    }

    pub fn ret(&mut self, value: Option<Value<'a>>) -> NodeId {
        self.insert(Instr::Ret { value })
    }

    pub fn switch(
        &mut self,
        value: Value<'a>,
        default_label: Symbol,
        cases: Vec<(Const<'a>, Symbol)>,
    ) -> NodeId {
        self.insert(Instr::Switch { value, default_label, cases })
    }

    pub fn alloca(&mut self, ty: &'a Type<'a>, dst: Var<'a>) -> NodeId {
        assert!(dst.ty.is_pointer(), "alloca result must have pointer type");
        self.insert(Instr::Alloca { ty, dst })
    }

    pub fn load(&mut self, ptr: Value<'a>, dst: Var<'a>) -> NodeId {
        assert!(ptr.is_pointer(), "load requires a pointer operand");
        self.insert(Instr::Load { ptr, dst })
    }

    pub fn store(&mut self, ptr: Value<'a>, value: Value<'a>) -> NodeId {
        assert!(ptr.is_pointer(), "store requires a pointer operand");
        self.insert(Instr::Store { ptr, value })
    }

    pub fn memcpy(&mut self, dst: Value<'a>, src: Value<'a>, len: Value<'a>) -> NodeId {
        assert!(
            dst.is_pointer() || dst.ty().is_array(),
            "memcpy destination must be pointer- or array-typed"
        );
        assert!(
            src.is_pointer() || src.ty().is_array(),
            "memcpy source must be pointer- or array-typed"
        );
        self.insert(Instr::Memcpy { dst, src, len })
    }

    pub fn get_array_element_ptr(
        &mut self,
        ptr: Value<'a>,
        index: Value<'a>,
        dst: Var<'a>,
    ) -> NodeId {
        assert!(
            ptr.is_pointer() || ptr.ty().is_array(),
            "element address requires a pointer or array operand"
        );
        self.insert(Instr::GetArrayElementPtr { ptr, index, dst })
    }

    /// The member index is encoded as a constant `i32` operand.
    pub fn get_struct_member_ptr(&mut self, ptr: Value<'a>, index: i32, dst: Var<'a>) -> NodeId {
        assert!(ptr.is_pointer(), "member address requires a pointer operand");
        let index = Const {
            ty: self.ctx.integer(true, IntRank::Int),
            value: ConstValue::Int(index as i64),
        };
        self.insert(Instr::GetStructMemberPtr { ptr, index, dst })
    }

    fn cast(&mut self, op: CastOp, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.insert(Instr::Cast { op, src, dst })
    }

    pub fn trunc(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.cast(CastOp::Trunc, src, dst)
    }

    pub fn ext(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.cast(CastOp::Ext, src, dst)
    }

    pub fn ftoi(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.cast(CastOp::Ftoi, src, dst)
    }

    pub fn itof(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.cast(CastOp::Itof, src, dst)
    }

    pub fn itop(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.cast(CastOp::Itop, src, dst)
    }

    pub fn ptoi(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.cast(CastOp::Ptoi, src, dst)
    }

    pub fn bitcast(&mut self, src: Value<'a>, dst: Var<'a>) -> NodeId {
        self.cast(CastOp::Bitcast, src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::AstArenas;
    use crate::intern::Interner;

    fn int_var<'a>(ctx: AstContext<'a>, interner: &mut Interner, name: &str) -> Var<'a> {
        Var { ty: ctx.int(), name: interner.intern(name) }
    }

    fn ptr_var<'a>(ctx: AstContext<'a>, interner: &mut Interner, name: &str) -> Var<'a> {
        Var { ty: ctx.pointer_to(ctx.int()), name: interner.intern(name) }
    }

    fn int_const(ctx: AstContext<'_>, value: i64) -> Value<'_> {
        Value::Const(Const { ty: ctx.int(), value: ConstValue::Int(value) })
    }

    /// head=nil ⇔ tail=nil ⇔ len=0; forward traversal visits exactly `len`
    /// nodes ending at tail, and the backward walk is its mirror.
    fn assert_well_formed(builder: &IrBuilder<'_>) {
        assert_eq!(builder.head().is_none(), builder.tail().is_none());
        assert_eq!(builder.head().is_none(), builder.len() == 0);

        let mut forward = Vec::new();
        let mut cursor = builder.head();
        while let Some(id) = cursor {
            forward.push(id);
            cursor = builder.next(id);
        }
        assert_eq!(forward.len(), builder.len());
        assert_eq!(forward.last().copied(), builder.tail());

        let mut backward = Vec::new();
        let mut cursor = builder.tail();
        while let Some(id) = cursor {
            backward.push(id);
            cursor = builder.prev(id);
        }
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_builder_is_well_formed() {
        let arenas = AstArenas::new();
        let builder = IrBuilder::new(arenas.ctx());
        assert_well_formed(&builder);
        assert!(builder.is_empty());
        assert_eq!(builder.get_position(), None);
    }

    #[test]
    fn sequential_inserts_preserve_call_order() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);

        builder.position_at_end();
        let t1 = int_var(ctx, &mut interner, "t1");
        let t2 = int_var(ctx, &mut interner, "t2");
        builder.add(int_const(ctx, 1), int_const(ctx, 2), t1);
        builder.add(Value::Var(t1), int_const(ctx, 3), t2);
        builder.ret(Some(Value::Var(t2)));

        assert_well_formed(&builder);
        assert_eq!(builder.len(), 3);
        let instrs = builder.finalize();
        assert_eq!(instrs.len(), 3);
        assert!(matches!(instrs[0], Instr::Binary { op: AluOp::Add, .. }));
        assert!(matches!(instrs[1], Instr::Binary { op: AluOp::Add, .. }));
        assert!(matches!(instrs[2], Instr::Ret { .. }));
    }

    #[test]
    fn insert_at_beginning_becomes_head() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);

        let a = interner.intern("a");
        let b = interner.intern("b");
        builder.nop(Some(a));
        builder.position_at_beginning();
        let head = builder.nop(Some(b));

        assert_eq!(builder.head(), Some(head));
        assert_eq!(builder.get_position(), Some(head));
        assert_well_formed(&builder);
    }

    #[test]
    fn cursor_insertion_links_between_neighbors() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);

        let mut label = |s: &str| Some(interner.intern(s));
        let a = builder.nop(label("A"));
        let b = builder.nop(label("B"));
        let c = builder.nop(label("C"));

        builder.position_after(a);
        let x = builder.nop(label("X"));

        // [A, X, B, C], cursor at X
        assert_eq!(builder.get_position(), Some(x));
        assert_eq!(builder.prev(x), Some(a));
        assert_eq!(builder.next(x), Some(b));
        assert_eq!(builder.next(a), Some(x));
        assert_eq!(builder.prev(b), Some(x));
        assert_well_formed(&builder);

        builder.position_after(c);
        let y = builder.nop(label("Y"));
        assert_eq!(builder.tail(), Some(y));
        assert_eq!(builder.len(), 5);
        assert_well_formed(&builder);
    }

    #[test]
    fn position_before_inserts_ahead_of_node() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);

        let mut label = |s: &str| Some(interner.intern(s));
        let a = builder.nop(label("A"));
        let b = builder.nop(label("B"));

        builder.position_before(b);
        let x = builder.nop(label("X"));
        assert_eq!(builder.next(a), Some(x));
        assert_eq!(builder.next(x), Some(b));
        assert_well_formed(&builder);

        // before the head means a new head
        builder.position_before(a);
        let h = builder.nop(label("H"));
        assert_eq!(builder.head(), Some(h));
        assert_well_formed(&builder);
    }

    #[test]
    fn clear_after_discards_the_suffix() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);

        let mut label = |s: &str| Some(interner.intern(s));
        let a = builder.nop(label("A"));
        let _b = builder.nop(label("B"));
        let _c = builder.nop(label("C"));

        builder.clear_after(a);
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.tail(), Some(a));
        assert_eq!(builder.get_position(), Some(a));
        assert_well_formed(&builder);
    }

    #[test]
    fn finalize_drains_in_order() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);

        let a = interner.intern("a");
        let b = interner.intern("b");
        builder.nop(Some(a));
        builder.nop(Some(b));
        let instrs = builder.finalize();
        assert_eq!(instrs.len(), 2);
        assert!(matches!(instrs[0], Instr::Nop { label: Some(l) } if l == a));
        assert!(matches!(instrs[1], Instr::Nop { label: Some(l) } if l == b));
    }

    #[test]
    fn alloca_result_must_be_pointer_typed() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);
        let p = ptr_var(ctx, &mut interner, "p");
        builder.alloca(ctx.int(), p);
        assert_eq!(builder.len(), 1);
    }

    #[test]
    #[should_panic(expected = "alloca result must have pointer type")]
    fn alloca_with_integer_result_aborts() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);
        let t = int_var(ctx, &mut interner, "t");
        builder.alloca(ctx.int(), t);
    }

    #[test]
    #[should_panic(expected = "load requires a pointer operand")]
    fn load_from_non_pointer_aborts() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);
        let t = int_var(ctx, &mut interner, "t");
        builder.load(int_const(ctx, 0), t);
    }

    #[test]
    #[should_panic(expected = "store requires a pointer operand")]
    fn store_through_non_pointer_aborts() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut builder = IrBuilder::new(ctx);
        builder.store(int_const(ctx, 0), int_const(ctx, 1));
    }

    #[test]
    fn struct_member_index_is_an_i32_constant() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);
        let p = ptr_var(ctx, &mut interner, "p");
        let out = ptr_var(ctx, &mut interner, "q");
        let id = builder.get_struct_member_ptr(Value::Var(p), 3, out);
        match builder.instr(id) {
            Instr::GetStructMemberPtr { index, .. } => {
                assert!(matches!(index.value, ConstValue::Int(3)));
                assert!(index.ty.is_integer());
            }
            other => panic!("unexpected instruction: {:?}", other),
        }
    }

    #[test]
    fn ftoi_appends_like_every_other_constructor() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);
        let t = int_var(ctx, &mut interner, "t");
        let f = Value::Const(Const {
            ty: ctx.floating(crate::types::FloatRank::Double),
            value: ConstValue::Float(1.5),
        });
        builder.ftoi(f, t);
        assert_eq!(builder.len(), 1);
        assert!(matches!(
            builder.instr(builder.head().unwrap()),
            Instr::Cast { op: CastOp::Ftoi, .. }
        ));
    }

    #[test]
    #[should_panic(expected = "detached instruction node")]
    fn positioning_on_a_cleared_node_aborts() {
        let arenas = AstArenas::new();
        let ctx = arenas.ctx();
        let mut interner = Interner::new();
        let mut builder = IrBuilder::new(ctx);
        let a = builder.nop(Some(interner.intern("a")));
        let b = builder.nop(Some(interner.intern("b")));
        builder.clear_after(a);
        builder.position_after(b);
    }
}
