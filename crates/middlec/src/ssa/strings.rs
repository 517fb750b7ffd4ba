//! String equality (spec §4.5.7, Design Notes §9, documented simplification
//! that must be preserved, not fixed): `==`/`!=` on two `string` values
//! compares length, then (only on a length match) pointer identity. Two
//! distinct allocations holding the same bytes compare unequal. Byte-for-byte
//! comparison is left to a runtime library call this middle end never
//! emits.

use super::value::{BlockKind, Op};
use super::{SsaBuilder, ValueId};
use crate::ast::Span;
use crate::diagnostics::DiagnosticSink;
use crate::types::TypeIndex;

impl<'a, S: DiagnosticSink> SsaBuilder<'a, S> {
    /// 1. Compare lengths. 2. If they differ, short-circuit to `negate`
    /// without computing the pointer comparison. 3. If they match, compare
    /// pointers (negated if this is `!=`). 4. Merge both outcomes with a
    /// `phi`. Mirrors `convert_short_circuit`'s branch+merge shape, not the
    /// old single-block `and`-of-two-comparisons it used to collapse into.
    pub(super) fn string_equality(&mut self, left: ValueId, right: ValueId, negate: bool) -> ValueId {
        let entry = self.cur;
        let entry_kind = self.func.blocks[entry.0 as usize].kind;

        let ll = self.emit(Op::SliceLen, TypeIndex::I64, vec![left]);
        let rl = self.emit(Op::SliceLen, TypeIndex::I64, vec![right]);
        let len_eq = self.emit(Op::Eq, TypeIndex::BOOL, vec![ll, rl]);

        let ptr_block = self.func.new_block(BlockKind::Plain);
        let merge_block = self.func.new_block(entry_kind);

        self.func.blocks[entry.0 as usize].kind = BlockKind::If;
        self.func.blocks[entry.0 as usize].successors = vec![ptr_block, merge_block];
        self.func.blocks[entry.0 as usize].controls.push(len_eq);
        self.func.blocks[ptr_block.0 as usize].predecessors.push(entry);
        self.func.blocks[merge_block.0 as usize].predecessors.push(entry);

        // Lengths differ: strings are unequal, regardless of `negate`.
        let mismatch_v = self.emit(Op::ConstBool, TypeIndex::BOOL, vec![]);
        self.func.value_mut(mismatch_v).aux_int = negate as i64;

        self.cur = ptr_block;
        let lp = self.emit(Op::SlicePtr, TypeIndex::MEM, vec![left]);
        let rp = self.emit(Op::SlicePtr, TypeIndex::MEM, vec![right]);
        let ptr_eq = self.emit(Op::Eq, TypeIndex::BOOL, vec![lp, rp]);
        let ptr_result = if negate { self.emit(Op::Not, TypeIndex::BOOL, vec![ptr_eq]) } else { ptr_eq };
        self.func.blocks[ptr_block.0 as usize].successors = vec![merge_block];
        self.func.blocks[merge_block.0 as usize].predecessors.push(ptr_block);

        self.cur = merge_block;
        self.func.push_value(merge_block, Op::Phi, TypeIndex::BOOL, vec![mismatch_v, ptr_result], Span::default())
    }
}
