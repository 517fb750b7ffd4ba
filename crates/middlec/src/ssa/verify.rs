//! Post-construction sanity check (spec §4.5.5, §8): a best-effort internal
//! consistency pass, not a full validator. Failures are reported as `E500`
//! diagnostics by the caller rather than panicking — malformed SSA should
//! never crash the compiler, only fail loudly.

use super::value::{BlockKind, Func, Op};

pub fn verify(func: &Func) -> Result<(), String> {
    for block in &func.blocks {
        let mut seen_non_phi = false;
        for &id in &block.values {
            let v = func.value(id);
            if v.op == Op::Phi {
                if seen_non_phi {
                    return Err(format!("block {}: phi after non-phi value {}", block.id.0, id.0));
                }
                if v.args.len() != block.predecessors.len() {
                    return Err(format!(
                        "block {}: phi {} has {} args but block has {} predecessors",
                        block.id.0,
                        id.0,
                        v.args.len(),
                        block.predecessors.len()
                    ));
                }
            } else {
                seen_non_phi = true;
            }
            if v.op == Op::FwdRef {
                return Err(format!("block {}: unresolved forward reference {}", block.id.0, id.0));
            }
        }
        match block.kind {
            BlockKind::Ret | BlockKind::Exit => {
                if !block.successors.is_empty() {
                    return Err(format!("block {}: ret/exit block has successors", block.id.0));
                }
            }
            BlockKind::If => {
                if block.successors.len() != 2 {
                    return Err(format!(
                        "block {}: if block has {} successors, expected 2",
                        block.id.0,
                        block.successors.len()
                    ));
                }
                if block.controls.is_empty() {
                    return Err(format!("block {}: if block has no control value", block.id.0));
                }
            }
            BlockKind::Plain => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssa::value::BlockId;
    use crate::types::TypeIndex;

    #[test]
    fn empty_function_verifies() {
        let mut f = Func::new("f", TypeIndex::VOID);
        let b = f.new_block(BlockKind::Ret);
        debug_assert_eq!(b, BlockId(0));
        assert!(verify(&f).is_ok());
    }

    #[test]
    fn unresolved_fwd_ref_is_rejected() {
        let mut f = Func::new("f", TypeIndex::I64);
        let b = f.new_block(BlockKind::Ret);
        f.push_value(b, Op::FwdRef, TypeIndex::I64, Vec::new(), crate::ast::Span::default());
        assert!(verify(&f).is_err());
    }

    #[test]
    fn phi_arg_count_must_match_predecessors() {
        let mut f = Func::new("f", TypeIndex::I64);
        let entry = f.new_block(BlockKind::Plain);
        let a = f.new_block(BlockKind::Plain);
        let merge = f.new_block(BlockKind::Ret);
        f.blocks[merge.0 as usize].predecessors = vec![entry, a];
        let c1 = f.push_value(entry, Op::ConstInt, TypeIndex::I64, Vec::new(), crate::ast::Span::default());
        let phi = f.push_value(merge, Op::Phi, TypeIndex::I64, vec![c1], crate::ast::Span::default());
        let _ = phi;
        assert!(verify(&f).is_err());
    }
}
