//! SSA construction (spec §4.5): converts one [`crate::ir::Func`] into one
//! [`value::Func`] using Go's "simple phi" forward-reference work-list
//! algorithm (`phi.rs`) rather than dominance-frontier placement. Every
//! scalar local is tracked purely as SSA values via `defvars`; every local
//! (scalar or aggregate) also gets a real stack slot so address-of,
//! composite field/index access, and calls passing `&local` always have
//! somewhere to read from (spec §4.5, Design Notes §9).

mod params;
mod phi;
mod strings;
mod verify;

pub mod value;

pub use value::{Aux, Block, BlockKind, Func, Op, Value, ValueId};
pub use verify::verify;

use crate::ast::Span;
use crate::compilation::Compilation;
use crate::diagnostics::DiagnosticSink;
use crate::ir;
use crate::ir::BlockId as IrBlockId;
use crate::types::TypeIndex;
use std::collections::{HashMap, HashSet};

pub struct SsaBuilder<'a, S: DiagnosticSink> {
    comp: &'a Compilation,
    sink: &'a mut S,
    ir: &'a ir::Func,
    func: Func,
    /// The SSA block currently receiving emitted values. Equal to
    /// `value::BlockId(ir_block.0)` for the whole duration of converting a
    /// given IR block, *except* while converting a short-circuit `and`/`or`
    /// or a string (in)equality, each of which splices extra blocks into the
    /// middle of the current IR block's conversion (spec §4.5.6/§4.5.7) and
    /// leaves `cur` pointing at whichever one is now current.
    cur: value::BlockId,
    /// Per-ir-block map of each local's current SSA value (Braun et al.
    /// "local value numbering"); indexed by `IrBlockId`.
    pub(super) defvars: Vec<HashMap<ir::LocalIndex, ValueId>>,
    /// Stack slot address for every local, keyed by `ir::LocalIndex`,
    /// created once at entry (spec §4.5.2).
    local_addrs: Vec<ValueId>,
    /// Memoized conversion of each IR node; a node is defined in exactly
    /// one block and only ever referenced from within that same block, so
    /// a single flat map (no per-block scoping) is sufficient.
    node_values: HashMap<ir::NodeIndex, ValueId>,
    /// Forward references awaiting resolution once their owning
    /// predecessor block finishes conversion (spec §4.5.4/§4.5.5).
    pub(super) pending_fwd: Vec<(ValueId, IrBlockId, ir::LocalIndex)>,
}

impl<'a, S: DiagnosticSink> SsaBuilder<'a, S> {
    pub fn new(comp: &'a Compilation, sink: &'a mut S, ir: &'a ir::Func) -> Self {
        let func = Func::new(ir.name.clone(), ir.return_type);
        SsaBuilder {
            comp,
            sink,
            ir,
            func,
            cur: value::BlockId(0),
            defvars: vec![HashMap::new(); ir.blocks.len()],
            local_addrs: Vec::new(),
            node_values: HashMap::new(),
            pending_fwd: Vec::new(),
        }
    }

    pub fn build(comp: &'a Compilation, sink: &'a mut S, ir: &'a ir::Func) -> Func {
        let mut builder = Self::new(comp, sink, ir);
        builder.run()
    }

    fn run(mut self) -> Func {
        tracing::debug!(func = %self.ir.name, blocks = self.ir.blocks.len(), "ssa: building function");
        for (i, ir_block) in self.ir.blocks.iter().enumerate() {
            let kind = match ir_block.terminator {
                ir::Terminator::Ret(_) => BlockKind::Ret,
                ir::Terminator::Branch { .. } => BlockKind::If,
                ir::Terminator::Jump(_) => BlockKind::Plain,
                ir::Terminator::Unset => BlockKind::Plain,
            };
            let id = self.func.new_block(kind);
            debug_assert_eq!(id.0, i as u32);
        }
        for (i, ir_block) in self.ir.blocks.iter().enumerate() {
            let ssa_id = value::BlockId(i as u32);
            self.func.blocks[ssa_id.0 as usize].predecessors =
                ir_block.predecessors.iter().map(|b| value::BlockId(b.0)).collect();
            self.func.blocks[ssa_id.0 as usize].successors =
                ir_block.successors.iter().map(|b| value::BlockId(b.0)).collect();
        }

        self.setup_params(IrBlockId(0));

        for i in 0..self.ir.blocks.len() {
            let block = IrBlockId(i as u32);
            self.convert_block(block);
            self.resolve_pending_for(block);
        }

        for i in 0..self.func.blocks.len() {
            self.func.reorder_phis_first(value::BlockId(i as u32));
        }

        if let Err(msg) = verify::verify(&self.func) {
            tracing::warn!(func = %self.func.name, error = %msg, "ssa: verification failed");
            self.sink.error(
                Span::default(),
                crate::diagnostics::DiagnosticCode::E500,
                format!("internal SSA verification failure in '{}': {msg}", self.func.name),
            );
        }

        self.func
    }

    /// Convert every node of `block` in order, then its terminator. A
    /// logical `and`/`or` encountered along the way splices a branch+merge
    /// into the middle of this conversion (§4.5.6); `self.cur` tracks
    /// wherever that leaves us, and if it moved, the block's original
    /// successor edges (captured before any splice touches them) are
    /// reattached to the new tail via `splice_block`.
    fn convert_block(&mut self, block: IrBlockId) {
        let ssa_block = value::BlockId(block.0);
        self.cur = ssa_block;
        let original_successors = self.func.blocks[ssa_block.0 as usize].successors.clone();

        let node_ids: Vec<ir::NodeIndex> = self.ir.blocks[block.0 as usize].nodes.clone();
        let excluded = self.logic_operand_closure(&node_ids);
        for node in node_ids {
            if excluded.contains(&node) {
                continue;
            }
            self.convert_node(block, node);
        }
        self.convert_terminator(block);

        if self.cur != ssa_block {
            self.splice_block(ssa_block, self.cur, original_successors);
        }
    }

    /// Every IR node in `node_ids` that is (transitively) the right operand
    /// of a logical `and`/`or` binary op. These are skipped by the main
    /// conversion loop and instead converted lazily, inside the "evaluate
    /// right" block built by `convert_short_circuit` (spec §4.5.3, §4.5.6).
    fn logic_operand_closure(&self, node_ids: &[ir::NodeIndex]) -> HashSet<ir::NodeIndex> {
        let mut excluded = HashSet::new();
        for &node in node_ids {
            if let ir::Op::Binary { op: ir::BinOp::LogicAnd | ir::BinOp::LogicOr, right, .. } = self.ir.node(node).op {
                self.collect_operand_closure(right, &mut excluded);
            }
        }
        excluded
    }

    fn collect_operand_closure(&self, node: ir::NodeIndex, out: &mut HashSet<ir::NodeIndex>) {
        if !out.insert(node) {
            return;
        }
        for operand in operand_nodes(&self.ir.node(node).op) {
            self.collect_operand_closure(operand, out);
        }
    }

    /// Reattach `original`'s pre-splice successor edges (captured before
    /// `original` was repurposed as an internal branch point) to
    /// `new_tail`, and repoint every one of those successors' predecessor
    /// entries from `original` to `new_tail` to match.
    fn splice_block(&mut self, original: value::BlockId, new_tail: value::BlockId, original_successors: Vec<value::BlockId>) {
        for &succ in &original_successors {
            for p in self.func.blocks[succ.0 as usize].predecessors.iter_mut() {
                if *p == original {
                    *p = new_tail;
                }
            }
        }
        self.func.blocks[new_tail.0 as usize].successors = original_successors;
    }

    fn convert_terminator(&mut self, block: IrBlockId) {
        match self.ir.blocks[block.0 as usize].terminator.clone() {
            ir::Terminator::Ret(value) => {
                let ctrl = value.map(|v| self.node_value(block, v));
                if let Some(v) = ctrl {
                    self.func.blocks[self.cur.0 as usize].controls.push(v);
                }
            }
            ir::Terminator::Branch { cond, .. } => {
                let c = self.node_value(block, cond);
                self.func.blocks[self.cur.0 as usize].controls.push(c);
            }
            ir::Terminator::Jump(_) | ir::Terminator::Unset => {}
        }
    }

    fn node_value(&mut self, block: IrBlockId, node: ir::NodeIndex) -> ValueId {
        if let Some(&v) = self.node_values.get(&node) {
            return v;
        }
        self.convert_node(block, node)
    }

    fn emit(&mut self, op: Op, ty: TypeIndex, args: Vec<ValueId>) -> ValueId {
        self.func.push_value(self.cur, op, ty, args, Span::default())
    }

    fn local_type(&self, local: ir::LocalIndex) -> TypeIndex {
        self.ir.locals[local.0 as usize].ty
    }

    /// Convert one IR node to its SSA value (or composite of values), memoize
    /// it, and return the resulting id. Dispatch covers every `ir::Op`
    /// variant (spec §4.5.3).
    fn convert_node(&mut self, ir_block: IrBlockId, node: ir::NodeIndex) -> ValueId {
        if let Some(&v) = self.node_values.get(&node) {
            return v;
        }
        let n = self.ir.node(node).clone();
        let result = match n.op {
            ir::Op::ConstInt(v) => self.emit(Op::ConstInt, n.ty, vec![]).tap_aux_int(&mut self.func, v),
            ir::Op::ConstFloat(v) => {
                let id = self.emit(Op::ConstFloat, n.ty, vec![]);
                self.func.value_mut(id).aux_int = v.to_bits() as i64;
                id
            }
            ir::Op::ConstBool(v) => self.emit(Op::ConstBool, n.ty, vec![]).tap_aux_int(&mut self.func, v as i64),
            ir::Op::ConstNull => self.emit(Op::ConstNil, n.ty, vec![]),
            ir::Op::ConstString(idx) => {
                let id = self.emit(Op::ConstString, n.ty, vec![]);
                self.func.value_mut(id).aux = Aux::Str(String::from_utf8_lossy(&self.ir.strings[idx as usize]).into_owned());
                id
            }
            ir::Op::LoadLocal(local) => self.read_local(ir_block, local),
            ir::Op::StoreLocal { local, value } => {
                let v = self.node_value(ir_block, value);
                self.write_local(ir_block, local, v);
                v
            }
            ir::Op::LoadGlobal(ref name) => self.emit(Op::GlobalAddr, n.ty, vec![]).tap_aux_str(&mut self.func, name.clone()),
            ir::Op::StoreGlobal { ref name, value } => {
                let v = self.node_value(ir_block, value);
                let addr = self.emit(Op::GlobalAddr, TypeIndex::MEM, vec![]);
                self.func.value_mut(addr).aux = Aux::Str(name.clone());
                self.emit(Op::Store, TypeIndex::MEM, vec![addr, v])
            }
            ir::Op::Binary { op, left, right } => self.convert_binary(ir_block, op, left, right, n.ty),
            ir::Op::Unary { op, operand } => self.convert_unary(ir_block, op, operand, n.ty),
            ir::Op::StrConcat { left, right } => {
                let l = self.node_value(ir_block, left);
                let r = self.node_value(ir_block, right);
                self.emit(Op::StringConcat, TypeIndex::STRING, vec![l, r])
            }
            ir::Op::StringHeader { ptr, len } => {
                let p = self.node_value(ir_block, ptr);
                let l = self.node_value(ir_block, len);
                self.emit(Op::StringMake, TypeIndex::STRING, vec![p, l])
            }
            ir::Op::CallDirect { ref name, ref args } => {
                let arg_vals: Vec<ValueId> = args.iter().map(|&a| self.node_value(ir_block, a)).collect();
                let id = self.emit(Op::StaticCall, n.ty, arg_vals);
                self.func.value_mut(id).aux = Aux::Str(name.clone());
                id
            }
            ir::Op::CallIndirect { callee, ref args } => {
                let c = self.node_value(ir_block, callee);
                let mut arg_vals = vec![c];
                arg_vals.extend(args.iter().map(|&a| self.node_value(ir_block, a)));
                self.emit(Op::ClosureCall, n.ty, arg_vals)
            }
            ir::Op::AddrLocal(local) => self.local_addr(local),
            ir::Op::AddrGlobal(ref name) => self.emit(Op::GlobalAddr, n.ty, vec![]).tap_aux_str(&mut self.func, name.clone()),
            ir::Op::AddrIndex { base, index, elem_size } => {
                let b = self.node_value(ir_block, base);
                let i = self.node_value(ir_block, index);
                let scale = self.emit(Op::ConstInt, TypeIndex::I64, vec![]).tap_aux_int(&mut self.func, elem_size as i64);
                let scaled = self.emit(Op::Mul, TypeIndex::I64, vec![i, scale]);
                self.emit(Op::AddPtr, n.ty, vec![b, scaled])
            }
            ir::Op::AddrOffset { base, offset } => {
                let b = self.node_value(ir_block, base);
                self.emit(Op::OffPtr, n.ty, vec![b]).tap_aux_int(&mut self.func, offset as i64)
            }
            ir::Op::FuncAddr(ref name) => self.emit(Op::GlobalAddr, n.ty, vec![]).tap_aux_str(&mut self.func, name.clone()),
            ir::Op::PtrLoad(addr) => {
                let a = self.node_value(ir_block, addr);
                self.emit(Op::Load, n.ty, vec![a])
            }
            ir::Op::PtrStore { addr, value } => {
                let a = self.node_value(ir_block, addr);
                let v = self.node_value(ir_block, value);
                self.emit(Op::Store, TypeIndex::MEM, vec![a, v])
            }
            ir::Op::FieldLocal { local, offset } => {
                let base = self.local_addr(local);
                let addr = self.emit(Op::OffPtr, TypeIndex::MEM, vec![base]).tap_aux_int(&mut self.func, offset as i64);
                self.emit(Op::Load, n.ty, vec![addr])
            }
            ir::Op::FieldValue { base, offset } => {
                let b = self.node_value(ir_block, base);
                let addr = self.emit(Op::OffPtr, TypeIndex::MEM, vec![b]).tap_aux_int(&mut self.func, offset as i64);
                self.emit(Op::Load, n.ty, vec![addr])
            }
            ir::Op::StoreLocalField { local, offset, value } => {
                let v = self.node_value(ir_block, value);
                let base = self.local_addr(local);
                let addr = self.emit(Op::OffPtr, TypeIndex::MEM, vec![base]).tap_aux_int(&mut self.func, offset as i64);
                self.emit(Op::Store, TypeIndex::MEM, vec![addr, v])
            }
            ir::Op::StoreField { addr, offset, value } => {
                let a = self.node_value(ir_block, addr);
                let v = self.node_value(ir_block, value);
                let off_addr = self.emit(Op::OffPtr, TypeIndex::MEM, vec![a]).tap_aux_int(&mut self.func, offset as i64);
                self.emit(Op::Store, TypeIndex::MEM, vec![off_addr, v])
            }
            ir::Op::IndexLocal { local, index, elem_size } => {
                let base = self.local_addr(local);
                let i = self.node_value(ir_block, index);
                let addr = self.scaled_addr(base, i, elem_size);
                self.emit(Op::Load, n.ty, vec![addr])
            }
            ir::Op::IndexValue { base, index, elem_size } => {
                let b = self.node_value(ir_block, base);
                let i = self.node_value(ir_block, index);
                let addr = self.scaled_addr(b, i, elem_size);
                self.emit(Op::Load, n.ty, vec![addr])
            }
            ir::Op::StoreIndexLocal { local, index, elem_size, value } => {
                let base = self.local_addr(local);
                let i = self.node_value(ir_block, index);
                let v = self.node_value(ir_block, value);
                let addr = self.scaled_addr(base, i, elem_size);
                self.emit(Op::Store, TypeIndex::MEM, vec![addr, v])
            }
            ir::Op::StoreIndexValue { base, index, elem_size, value } => {
                let b = self.node_value(ir_block, base);
                let i = self.node_value(ir_block, index);
                let v = self.node_value(ir_block, value);
                let addr = self.scaled_addr(b, i, elem_size);
                self.emit(Op::Store, TypeIndex::MEM, vec![addr, v])
            }
            ir::Op::SliceLocal { local, len } => {
                let ptr = self.local_addr(local);
                let len_v = self.emit(Op::ConstInt, TypeIndex::I64, vec![]).tap_aux_int(&mut self.func, len as i64);
                self.emit(Op::SliceMake, n.ty, vec![ptr, len_v])
            }
            ir::Op::SliceValue { ptr, len } => {
                let p = self.node_value(ir_block, ptr);
                let l = self.node_value(ir_block, len);
                self.emit(Op::SliceMake, n.ty, vec![p, l])
            }
            ir::Op::SlicePtr(s) => {
                let v = self.node_value(ir_block, s);
                self.emit(Op::SlicePtr, n.ty, vec![v])
            }
            ir::Op::SliceLen(s) => {
                let v = self.node_value(ir_block, s);
                self.emit(Op::SliceLen, n.ty, vec![v])
            }
            ir::Op::CondSelect { cond, then_value, else_value } => {
                let c = self.node_value(ir_block, cond);
                let t = self.node_value(ir_block, then_value);
                let e = self.node_value(ir_block, else_value);
                self.emit(Op::CondSelect, n.ty, vec![c, t, e])
            }
            ir::Op::Convert { target, operand } => {
                let v = self.node_value(ir_block, operand);
                self.convert_cast(v, n.ty.min(target))
            }
            ir::Op::Nop => self.emit(Op::ConstInt, TypeIndex::VOID, vec![]),
        };
        self.node_values.insert(node, result);
        result
    }

    fn scaled_addr(&mut self, base: ValueId, index: ValueId, elem_size: u32) -> ValueId {
        let scale = self.emit(Op::ConstInt, TypeIndex::I64, vec![]).tap_aux_int(&mut self.func, elem_size as i64);
        let scaled = self.emit(Op::Mul, TypeIndex::I64, vec![index, scale]);
        self.emit(Op::AddPtr, TypeIndex::MEM, vec![base, scaled])
    }

    fn convert_cast(&mut self, v: ValueId, target: TypeIndex) -> ValueId {
        let from_size = self.comp.types.size_of(self.func.value(v).ty);
        let to_size = self.comp.types.size_of(target);
        let op = match from_size.cmp(&to_size) {
            std::cmp::Ordering::Less => {
                if self.comp.types.is_integer(target) && !self.comp.types.get(target).is_unsigned_basic() {
                    Op::SignExt
                } else {
                    Op::ZeroExt
                }
            }
            std::cmp::Ordering::Greater => Op::Trunc,
            std::cmp::Ordering::Equal => Op::Move,
        };
        self.emit(op, target, vec![v])
    }

    fn convert_binary(
        &mut self,
        ir_block: IrBlockId,
        op: ir::BinOp,
        left: ir::NodeIndex,
        right: ir::NodeIndex,
        ty: TypeIndex,
    ) -> ValueId {
        if matches!(op, ir::BinOp::LogicAnd | ir::BinOp::LogicOr) {
            return self.convert_short_circuit(ir_block, op == ir::BinOp::LogicOr, left, right, ty);
        }
        let l = self.node_value(ir_block, left);
        let r = self.node_value(ir_block, right);
        let left_ty = self.func.value(l).ty;
        if matches!(op, ir::BinOp::Eq | ir::BinOp::Ne) && left_ty == TypeIndex::STRING {
            return self.string_equality(l, r, matches!(op, ir::BinOp::Ne));
        }
        let ssa_op = match op {
            ir::BinOp::Add => Op::Add,
            ir::BinOp::Sub => Op::Sub,
            ir::BinOp::Mul => Op::Mul,
            ir::BinOp::Div => Op::Div,
            ir::BinOp::Rem => Op::Mod,
            ir::BinOp::Eq => Op::Eq,
            ir::BinOp::Ne => Op::Ne,
            ir::BinOp::Lt => Op::Lt,
            ir::BinOp::Le => Op::Le,
            ir::BinOp::Gt => Op::Gt,
            ir::BinOp::Ge => Op::Ge,
            ir::BinOp::BitAnd => Op::And,
            ir::BinOp::BitOr => Op::Or,
            ir::BinOp::BitXor => Op::Xor,
            ir::BinOp::Shl => Op::Shl,
            ir::BinOp::Shr => Op::Shr,
            ir::BinOp::AddPtr => Op::AddPtr,
            ir::BinOp::SubPtr => Op::SubPtr,
            ir::BinOp::LogicAnd | ir::BinOp::LogicOr => unreachable!("handled above"),
        };
        self.emit(ssa_op, ty, vec![l, r])
    }

    /// `a and b` / `a or b` (spec §4.5.6): evaluate `a` in the current
    /// block; branch on it to a fresh "evaluate right" block or straight to
    /// a merge block, depending on which operator this is and which side
    /// short-circuits; evaluate `b` there (forcing re-conversion of any of
    /// its sub-nodes that the main loop's pre-scan skipped); merge with a
    /// `phi` whose two arguments are the short-circuit constant and `b`'s
    /// value, in the same order the predecessor edges were added.
    fn convert_short_circuit(&mut self, ir_block: IrBlockId, is_or: bool, left: ir::NodeIndex, right: ir::NodeIndex, ty: TypeIndex) -> ValueId {
        let lv = self.node_value(ir_block, left);
        let entry = self.cur;
        let entry_kind = self.func.blocks[entry.0 as usize].kind;

        let rhs_block = self.func.new_block(BlockKind::Plain);
        let merge_block = self.func.new_block(entry_kind);
        let (taken_block, short_circuit_block) = if is_or { (merge_block, rhs_block) } else { (rhs_block, merge_block) };

        self.func.blocks[entry.0 as usize].kind = BlockKind::If;
        self.func.blocks[entry.0 as usize].successors = vec![taken_block, short_circuit_block];
        self.func.blocks[entry.0 as usize].controls.push(lv);
        self.func.blocks[taken_block.0 as usize].predecessors.push(entry);
        self.func.blocks[short_circuit_block.0 as usize].predecessors.push(entry);

        let short_circuit_v = self.emit(Op::ConstBool, ty, vec![]).tap_aux_int(&mut self.func, is_or as i64);

        let mut rhs_closure = HashSet::new();
        self.collect_operand_closure(right, &mut rhs_closure);
        for node in &rhs_closure {
            self.node_values.remove(node);
        }

        self.cur = rhs_block;
        let rv = self.node_value(ir_block, right);
        let after_rhs = self.cur;
        self.func.blocks[after_rhs.0 as usize].successors = vec![merge_block];
        self.func.blocks[merge_block.0 as usize].predecessors.push(after_rhs);

        self.cur = merge_block;
        self.func.push_value(merge_block, Op::Phi, ty, vec![short_circuit_v, rv], Span::default())
    }

    fn convert_unary(&mut self, ir_block: IrBlockId, op: ir::UnOp, operand: ir::NodeIndex, ty: TypeIndex) -> ValueId {
        let v = self.node_value(ir_block, operand);
        match op {
            ir::UnOp::Neg => {
                let zero = self.emit(Op::ConstInt, ty, vec![]);
                self.emit(Op::Sub, ty, vec![zero, v])
            }
            ir::UnOp::Not => self.emit(Op::Not, ty, vec![v]),
            ir::UnOp::BitNot => self.emit(Op::Not, ty, vec![v]),
        }
    }

    fn local_addr(&mut self, local: ir::LocalIndex) -> ValueId {
        self.local_addrs[local.0 as usize]
    }
}

/// The IR nodes `op` directly reads, in evaluation order. Used to compute
/// the transitive closure of a logical `and`/`or`'s right operand (spec
/// §4.5.3's pre-scan) — every node reachable this way must not be converted
/// by the main loop.
fn operand_nodes(op: &ir::Op) -> Vec<ir::NodeIndex> {
    use ir::Op::*;
    match *op {
        ConstInt(_) | ConstFloat(_) | ConstBool(_) | ConstNull | ConstString(_) => vec![],
        LoadLocal(_) | LoadGlobal(_) | AddrLocal(_) | AddrGlobal(_) | FuncAddr(_) | FieldLocal { .. } | SliceLocal { .. } | Nop => {
            vec![]
        }
        StoreLocal { value, .. } => vec![value],
        StoreGlobal { value, .. } => vec![value],
        Binary { left, right, .. } => vec![left, right],
        Unary { operand, .. } => vec![operand],
        StrConcat { left, right } => vec![left, right],
        StringHeader { ptr, len } => vec![ptr, len],
        CallDirect { ref args, .. } => args.clone(),
        CallIndirect { callee, ref args } => {
            let mut v = vec![callee];
            v.extend(args.iter().copied());
            v
        }
        AddrIndex { base, index, .. } => vec![base, index],
        AddrOffset { base, .. } => vec![base],
        PtrLoad(addr) => vec![addr],
        PtrStore { addr, value } => vec![addr, value],
        FieldValue { base, .. } => vec![base],
        StoreLocalField { value, .. } => vec![value],
        StoreField { addr, value, .. } => vec![addr, value],
        IndexLocal { index, .. } => vec![index],
        IndexValue { base, index, .. } => vec![base, index],
        StoreIndexLocal { index, value, .. } => vec![index, value],
        StoreIndexValue { base, index, value, .. } => vec![base, index, value],
        SliceValue { ptr, len } => vec![ptr, len],
        SlicePtr(s) | SliceLen(s) => vec![s],
        CondSelect { cond, then_value, else_value } => vec![cond, then_value, else_value],
        Convert { operand, .. } => vec![operand],
    }
}

/// Tiny extension trait so the conversion table above can set a freshly
/// emitted value's `aux_int`/`aux` inline instead of breaking the `let id =
/// ...` chain with a separate statement.
trait ValueIdExt {
    fn tap_aux_int(self, func: &mut Func, v: i64) -> ValueId;
    fn tap_aux_str(self, func: &mut Func, s: String) -> ValueId;
}

impl ValueIdExt for ValueId {
    fn tap_aux_int(self, func: &mut Func, v: i64) -> ValueId {
        func.value_mut(self).aux_int = v;
        self
    }

    fn tap_aux_str(self, func: &mut Func, s: String) -> ValueId {
        func.value_mut(self).aux = Aux::Str(s);
        self
    }
}

trait BasicKindExt {
    fn is_unsigned_basic(&self) -> bool;
}

impl BasicKindExt for crate::types::Type {
    fn is_unsigned_basic(&self) -> bool {
        matches!(
            self,
            crate::types::Type::Basic(k) if k.is_unsigned()
        )
    }
}

pub fn build<S: DiagnosticSink>(comp: &Compilation, sink: &mut S, ir: &ir::Func) -> Func {
    SsaBuilder::build(comp, sink, ir)
}
