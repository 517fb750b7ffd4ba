//! Deferred φ insertion (spec §4.5.4–§4.5.5): Go's "simple phi" algorithm.
//!
//! Blocks are converted in a single forward pass over `ir::Func::blocks`, in
//! creation order. For a reducible CFG that order is already close to a
//! reverse-postorder: every predecessor of a block is converted first
//! *except* loop back edges, whose source block has a higher index than
//! the loop header it jumps to. Reading a local whose value lives across
//! such a not-yet-converted predecessor can't recurse (the predecessor
//! hasn't computed anything yet), so instead of recursing we mint an
//! `fwd_ref` placeholder value, record `(placeholder, predecessor,
//! local)` in `pending_fwd`, and resolve it in place once that predecessor
//! finishes — `resolve_pending_for` overwrites the placeholder's op/args so
//! every earlier reference to it (e.g. as a φ argument) sees the resolved
//! value without any further patching.

use super::value::Op;
use super::{SsaBuilder, ValueId};
use crate::ast::Span;
use crate::diagnostics::DiagnosticSink;
use crate::ir::{BlockId as IrBlockId, LocalIndex};

impl<'a, S: DiagnosticSink> SsaBuilder<'a, S> {
    /// Record a new definition of `local` in `ir_block`, both as the
    /// SSA-tracked value used by subsequent `LoadLocal`s and mirrored into
    /// the local's stack slot (spec §4.5, Design Notes §9: reads may ignore
    /// the mirror, but every write persists to it). Emitted into whichever
    /// SSA block is physically current — not necessarily `value::BlockId(
    /// ir_block.0)`, since a short-circuit or string-equality split earlier
    /// in `ir_block` may have moved `self.cur` on (spec §4.5.6/§4.5.7).
    pub(super) fn write_local(&mut self, ir_block: IrBlockId, local: LocalIndex, value: ValueId) {
        self.defvars[ir_block.0 as usize].insert(local, value);
        let addr = self.local_addrs[local.0 as usize];
        self.emit(Op::Store, crate::types::TypeIndex::MEM, vec![addr, value]);
    }

    /// Read `local`'s current value at the point of conversion within
    /// `ir_block` (equivalently, its value at the end of `ir_block` so far).
    pub(super) fn read_local(&mut self, ir_block: IrBlockId, local: LocalIndex) -> ValueId {
        self.value_of_local(ir_block, local)
    }

    fn value_of_local(&mut self, block: IrBlockId, local: LocalIndex) -> ValueId {
        if let Some(&v) = self.defvars[block.0 as usize].get(&local) {
            return v;
        }
        let preds = self.ir.blocks[block.0 as usize].predecessors.clone();
        let value = match preds.len() {
            0 => self.zero_value_for_local(local),
            1 => {
                let pred = preds[0];
                if self.is_sealed(pred, block) {
                    self.value_of_local(pred, local)
                } else {
                    self.make_fwd_ref(pred, local)
                }
            }
            _ => self.make_phi(block, local, &preds),
        };
        self.defvars[block.0 as usize].insert(local, value);
        value
    }

    /// A predecessor is sealed (fully converted) iff it comes strictly
    /// before the block currently being converted in the flat block list —
    /// true for every predecessor except a loop back edge.
    fn is_sealed(&self, pred: IrBlockId, cur: IrBlockId) -> bool {
        pred.0 < cur.0
    }

    fn make_fwd_ref(&mut self, pred: IrBlockId, local: LocalIndex) -> ValueId {
        let ty = self.local_type(local);
        let id = self.func.push_value(self.cur, Op::FwdRef, ty, Vec::new(), Span::default());
        self.pending_fwd.push((id, pred, local));
        id
    }

    fn make_phi(&mut self, block: IrBlockId, local: LocalIndex, preds: &[IrBlockId]) -> ValueId {
        let ty = self.local_type(local);
        let phi = self.func.push_value(self.cur, Op::Phi, ty, Vec::new(), Span::default());
        // Memoize before recursing into predecessors so a cycle through this
        // same local (e.g. a loop-carried variable) terminates instead of
        // looping forever.
        self.defvars[block.0 as usize].insert(local, phi);
        let mut args = Vec::with_capacity(preds.len());
        for &pred in preds {
            let arg = if self.is_sealed(pred, block) {
                self.value_of_local(pred, local)
            } else {
                self.make_fwd_ref(pred, local)
            };
            args.push(arg);
        }
        self.func.value_mut(phi).args = args;
        phi
    }

    /// A local with no predecessor and no prior write in its own block (only
    /// possible for the entry block reading a never-initialized local —
    /// shouldn't occur for a well-formed lowering, but conversion must not
    /// panic on it). Synthesizes a zero value of the local's type.
    fn zero_value_for_local(&mut self, local: LocalIndex) -> ValueId {
        tracing::warn!(?local, "ssa: reading local with no reaching definition, synthesizing zero");
        let ty = self.local_type(local);
        if self.comp.types.is_float(ty) {
            self.func.push_value(self.cur, Op::ConstFloat, ty, Vec::new(), Span::default())
        } else if self.comp.types.is_pointer(ty) || self.comp.types.is_optional(ty) {
            self.func.push_value(self.cur, Op::ConstNil, ty, Vec::new(), Span::default())
        } else {
            self.func.push_value(self.cur, Op::ConstInt, ty, Vec::new(), Span::default())
        }
    }

    /// Called once a block has finished conversion: resolve every pending
    /// forward reference whose predecessor was that block, by turning the
    /// placeholder into a `copy` of the now-known value. Every existing
    /// reference to the placeholder's `ValueId` (e.g. a φ argument slot)
    /// observes the resolved value with no further patching.
    pub(super) fn resolve_pending_for(&mut self, finished: IrBlockId) {
        let mut remaining = Vec::with_capacity(self.pending_fwd.len());
        let pending = std::mem::take(&mut self.pending_fwd);
        for (placeholder, pred, local) in pending {
            if pred == finished {
                let actual = self.value_of_local(pred, local);
                let v = self.func.value_mut(placeholder);
                v.op = Op::Copy;
                v.args = vec![actual];
            } else {
                remaining.push((placeholder, pred, local));
            }
        }
        self.pending_fwd = remaining;
    }
}
