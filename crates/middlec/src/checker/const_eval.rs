//! Compile-time constant folding (spec §4.3, §4.4.4). Only integer-valued
//! constant expressions are folded; anything else (floats, strings,
//! non-constant operands) simply isn't recorded on the symbol and the
//! lowerer emits it as ordinary runtime code.

use super::Checker;
use crate::ast::{BinaryOp, Expr, LiteralValue, NodeIndex, Program, UnaryOp};
use crate::diagnostics::DiagnosticSink;

impl<'a, S: DiagnosticSink> Checker<'a, S> {
    pub(super) fn eval_const_expr(&mut self, program: &Program, node: NodeIndex) -> Option<i64> {
        let expr = program.ast.as_expr(node)?.clone();
        match expr {
            Expr::Literal(LiteralValue::Int(v)) => Some(v),
            Expr::Literal(LiteralValue::True) => Some(1),
            Expr::Literal(LiteralValue::False) => Some(0),
            Expr::Literal(LiteralValue::Char(c)) => Some(c as i64),
            Expr::Paren(inner) => self.eval_const_expr(program, inner),
            Expr::Ident(name) => self.scope.lookup(&name).and_then(|s| s.const_value),
            Expr::Unary { op, operand } => {
                let v = self.eval_const_expr(program, operand)?;
                match op {
                    UnaryOp::Neg => Some(-v),
                    UnaryOp::Not => Some(if v == 0 { 1 } else { 0 }),
                    UnaryOp::BitNot => Some(!v),
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval_const_expr(program, left)?;
                let r = self.eval_const_expr(program, right)?;
                match op {
                    BinaryOp::Add => Some(l.wrapping_add(r)),
                    BinaryOp::Sub => Some(l.wrapping_sub(r)),
                    BinaryOp::Mul => Some(l.wrapping_mul(r)),
                    BinaryOp::Div => (r != 0).then(|| l.wrapping_div(r)),
                    BinaryOp::Rem => (r != 0).then(|| l.wrapping_rem(r)),
                    BinaryOp::BitAnd => Some(l & r),
                    BinaryOp::BitOr => Some(l | r),
                    BinaryOp::BitXor => Some(l ^ r),
                    BinaryOp::Shl => Some(l.wrapping_shl(r as u32)),
                    BinaryOp::Shr => Some(l.wrapping_shr(r as u32)),
                    BinaryOp::Eq => Some((l == r) as i64),
                    BinaryOp::Ne => Some((l != r) as i64),
                    BinaryOp::Lt => Some((l < r) as i64),
                    BinaryOp::Le => Some((l <= r) as i64),
                    BinaryOp::Gt => Some((l > r) as i64),
                    BinaryOp::Ge => Some((l >= r) as i64),
                    BinaryOp::And => Some(((l != 0) && (r != 0)) as i64),
                    BinaryOp::Or => Some(((l != 0) || (r != 0)) as i64),
                    BinaryOp::Coalesce => Some(l),
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Checker;
    use crate::ast::{AstBuilder, BinaryOp, Program, UnaryOp};
    use crate::compilation::Compilation;
    use crate::diagnostics::VecDiagnosticSink;

    #[test]
    fn folds_simple_arithmetic() {
        let mut b = AstBuilder::new();
        let l = b.int_lit(2);
        let r = b.int_lit(3);
        let add = b.binary(BinaryOp::Mul, l, r);
        let program = Program { ast: b.ast, decls: vec![] };
        let mut comp = Compilation::default();
        let mut sink = VecDiagnosticSink::new();
        let mut checker = Checker::new(&mut comp, &mut sink);
        assert_eq!(checker.eval_const_expr(&program, add), Some(6));
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let mut b = AstBuilder::new();
        let l = b.int_lit(1);
        let r = b.int_lit(0);
        let div = b.binary(BinaryOp::Div, l, r);
        let program = Program { ast: b.ast, decls: vec![] };
        let mut comp = Compilation::default();
        let mut sink = VecDiagnosticSink::new();
        let mut checker = Checker::new(&mut comp, &mut sink);
        assert_eq!(checker.eval_const_expr(&program, div), None);
    }

    #[test]
    fn negation_of_literal_folds() {
        let mut b = AstBuilder::new();
        let lit = b.int_lit(5);
        let neg = b.push_expr(crate::ast::Expr::Unary { op: UnaryOp::Neg, operand: lit });
        let program = Program { ast: b.ast, decls: vec![] };
        let mut comp = Compilation::default();
        let mut sink = VecDiagnosticSink::new();
        let mut checker = Checker::new(&mut comp, &mut sink);
        assert_eq!(checker.eval_const_expr(&program, neg), Some(-5));
    }
}
