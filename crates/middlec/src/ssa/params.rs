//! Three-phase ABI parameter setup (spec §4.5.2): every local gets a stack
//! slot first; then parameters are materialized from incoming `arg` values
//! according to their size class, in three phases so a composite's `arg`
//! registers are all read before any of them is clobbered by a later
//! phase's stores — this ordering is required, not cosmetic (spec's
//! documented BUG-010: collapsing the phases corrupts multi-register
//! parameters on some ABI paths).

use super::value::{BlockId as SsaBlockId, Op};
use super::{SsaBuilder, ValueId};
use crate::ast::Span;
use crate::diagnostics::DiagnosticSink;
use crate::ir::BlockId as IrBlockId;
use crate::types::TypeIndex;


/// How a parameter's incoming value(s) are classified for setup. Mirrors a
/// minimal System-V-like classification: scalars and slices each fit in at
/// most two registers; anything larger crosses to the stack and is passed
/// by reference instead (spec §4.5.2).
enum ParamClass {
    Scalar,
    TwoWord,
    ByRef { size: u32 },
}

impl<'a, S: DiagnosticSink> SsaBuilder<'a, S> {
    pub(super) fn setup_params(&mut self, entry: IrBlockId) {
        let ssa_entry = SsaBlockId(entry.0);
        self.cur = ssa_entry;
        self.local_addrs = (0..self.ir.locals.len())
            .map(|_| self.func.push_value(ssa_entry, Op::LocalAddr, TypeIndex::MEM, Vec::new(), Span::default()))
            .collect();

        // Phase 1: create every incoming `arg` value up front.
        let mut arg_regs: Vec<ValueId> = Vec::new();
        let mut next_reg: u32 = 0;
        let mut per_param: Vec<(usize, ParamClass, Vec<ValueId>)> = Vec::new();
        for (i, local) in self.ir.locals.iter().enumerate() {
            if !local.is_param {
                continue;
            }
            let class = classify(self.comp, local.ty);
            let regs_needed = match class {
                ParamClass::Scalar => 1,
                ParamClass::TwoWord => 2,
                ParamClass::ByRef { .. } => 1,
            };
            let mut regs = Vec::with_capacity(regs_needed);
            for _ in 0..regs_needed {
                let arg = self.func.push_value(ssa_entry, Op::Arg, TypeIndex::I64, Vec::new(), Span::default());
                self.func.value_mut(arg).aux_int = next_reg as i64;
                next_reg += 1;
                arg_regs.push(arg);
                regs.push(arg);
            }
            per_param.push((i, class, regs));
        }

        // Phase 2 + 3: construct composites, then store into each local's
        // stack slot, low register first.
        for (i, class, regs) in per_param {
            let local = crate::ir::LocalIndex(i as u32);
            let addr = self.local_addrs[i];
            match class {
                ParamClass::Scalar => {
                    self.write_local(entry, local, regs[0]);
                }
                ParamClass::TwoWord => {
                    let lo_addr = self.emit(Op::OffPtr, TypeIndex::MEM, vec![addr]);
                    self.func.value_mut(lo_addr).aux_int = 0;
                    self.emit(Op::Store, TypeIndex::MEM, vec![lo_addr, regs[0]]);
                    let hi_addr = self.emit(Op::OffPtr, TypeIndex::MEM, vec![addr]);
                    self.func.value_mut(hi_addr).aux_int = 8;
                    self.emit(Op::Store, TypeIndex::MEM, vec![hi_addr, regs[1]]);
                    if self.ir.locals[i].ty == TypeIndex::STRING {
                        let made = self.emit(Op::SliceMake, TypeIndex::STRING, vec![regs[0], regs[1]]);
                        self.defvars[entry.0 as usize].insert(local, made);
                    }
                }
                ParamClass::ByRef { size } => {
                    let mv = self.emit(Op::Move, TypeIndex::MEM, vec![addr, regs[0]]);
                    self.func.value_mut(mv).aux_int = size as i64;
                }
            }
        }
    }
}

fn classify(comp: &crate::compilation::Compilation, ty: TypeIndex) -> ParamClass {
    if ty == TypeIndex::STRING || comp.types.is_slice(ty) {
        return ParamClass::TwoWord;
    }
    let size = comp.types.size_of(ty);
    if size <= 8 {
        ParamClass::Scalar
    } else if size <= 16 {
        ParamClass::TwoWord
    } else {
        ParamClass::ByRef { size }
    }
}
