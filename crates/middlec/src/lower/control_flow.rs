//! Statement lowering and control-flow linearization (spec §4.4.2). Every
//! `if`/`while`/`for` desugars into plain blocks joined by `jump`/`branch`
//! terminators; a branch whose both arms terminate leaves the merge block
//! unreachable (zero predecessors) rather than omitted, matching the SSA
//! builder's documented handling of that case (it synthesizes a zero value
//! and logs a warning rather than treating it as an error, spec §4.5.4).

use super::{LoopCx, Lowerer};
use crate::ast::{AssignOp, NodeIndex, Program, Stmt};
use crate::ir::{self, Terminator};
use crate::types::TypeIndex;

impl<'a> Lowerer<'a> {
    /// Lower a statement node into the current block. A statement never
    /// returns a value; callers that need one go through `lower_expr`.
    pub(super) fn lower_stmt(&mut self, program: &Program, node: NodeIndex) {
        let Some(stmt) = program.ast.as_stmt(node).cloned() else { return };
        if self.ir.is_terminated(self.current) {
            // Dead code after an unconditional jump/return; still walk it
            // for side-effect-free consistency, but land in a fresh,
            // unreachable block so later statements have somewhere to go.
            let dead = self.ir.new_block("unreachable");
            self.current = dead;
        }
        match stmt {
            Stmt::Return { value } => {
                let v = value.map(|v| self.lower_expr(program, v));
                self.ir.terminate(self.current, Terminator::Ret(v));
            }
            Stmt::Var { name, type_expr, value, is_const } => {
                self.lower_var(program, &name, type_expr.as_ref(), value, is_const, node);
            }
            Stmt::Assign { target, op, value } => {
                self.lower_assign(program, target, op, value);
            }
            Stmt::If { cond, then_block, else_block } => {
                self.lower_if(program, cond, then_block, else_block);
            }
            Stmt::While { cond, body } => {
                self.lower_while(program, cond, body);
            }
            Stmt::For { binding, iterable, body } => {
                self.lower_for(program, &binding, iterable, body);
            }
            Stmt::Block { stmts } => {
                self.push_scope();
                for s in stmts {
                    self.lower_stmt(program, s);
                }
                self.pop_scope();
            }
            Stmt::Break => {
                if let Some(top) = self.loop_stack.last() {
                    self.ir.terminate(self.current, Terminator::Jump(top.break_block));
                }
            }
            Stmt::Continue => {
                if let Some(top) = self.loop_stack.last() {
                    self.ir.terminate(self.current, Terminator::Jump(top.continue_block));
                }
            }
            Stmt::Defer { expr } => {
                // Simple form: lower `expr` immediately at this point, like
                // a plain expression statement. Queued run-at-every-exit
                // semantics are out of scope (spec §4.4.2).
                self.lower_expr(program, expr);
            }
            Stmt::Expr { expr } => {
                self.lower_expr(program, expr);
            }
            Stmt::BadStmt => {}
        }
    }

    fn lower_var(
        &mut self,
        program: &Program,
        name: &str,
        type_expr: Option<&crate::ast::TypeExprKind>,
        value: Option<NodeIndex>,
        is_const: bool,
        decl_node: NodeIndex,
    ) {
        // A folded constant was already inlined at every use site by the
        // checker (spec §4.3/§4.4.4); it never needs a stack slot.
        if is_const && self.folded_constants.contains_key(name) {
            return;
        }
        let declared = type_expr.and_then(|t| self.resolve_type(t));
        let ty = declared.unwrap_or_else(|| self.node_type(decl_node));
        let local = self.declare_local(name, ty, !is_const);
        if let Some(v) = value {
            let val = self.lower_expr(program, v);
            if self.is_aggregate(ty) {
                let dest_addr = self.emit(ir::Op::AddrLocal(local), TypeIndex::MEM);
                self.lower_aggregate_copy(dest_addr, val, ty);
            } else {
                self.ir.emit(self.current, ir::Op::StoreLocal { local, value: val }, TypeIndex::VOID);
            }
        }
    }

    /// `if cond { then } [else { other }]`: evaluate `cond` in the current
    /// block, branch to fresh `then`/`else` blocks, and join both arms at
    /// a fresh `merge` block. An absent `else` arm still gets its own
    /// (empty) block rather than branching straight to `merge`, so the
    /// predecessor-count bookkeeping the SSA builder relies on never needs
    /// a special case for "no else".
    fn lower_if(&mut self, program: &Program, cond: NodeIndex, then_block: NodeIndex, else_block: Option<NodeIndex>) {
        let cond_v = self.lower_expr(program, cond);
        let then_b = self.ir.new_block("if.then");
        let else_b = self.ir.new_block("if.else");
        self.ir.terminate(self.current, Terminator::Branch { cond: cond_v, then_block: then_b, else_block: else_b });

        self.current = then_b;
        self.lower_stmt(program, then_block);
        let then_end = self.current;

        self.current = else_b;
        if let Some(else_node) = else_block {
            self.lower_stmt(program, else_node);
        }
        let else_end = self.current;

        let merge_b = self.ir.new_block("if.merge");
        if !self.ir.is_terminated(then_end) {
            self.ir.terminate(then_end, Terminator::Jump(merge_b));
        }
        if !self.ir.is_terminated(else_end) {
            self.ir.terminate(else_end, Terminator::Jump(merge_b));
        }
        self.current = merge_b;
    }

    fn lower_while(&mut self, program: &Program, cond: NodeIndex, body: NodeIndex) {
        let header = self.ir.new_block("while.cond");
        if !self.ir.is_terminated(self.current) {
            self.ir.terminate(self.current, Terminator::Jump(header));
        }
        self.current = header;
        let cond_v = self.lower_expr(program, cond);

        let body_b = self.ir.new_block("while.body");
        let exit_b = self.ir.new_block("while.exit");
        self.ir.terminate(header, Terminator::Branch { cond: cond_v, then_block: body_b, else_block: exit_b });

        self.loop_stack.push(LoopCx { continue_block: header, break_block: exit_b });
        self.current = body_b;
        self.lower_stmt(program, body);
        if !self.ir.is_terminated(self.current) {
            self.ir.terminate(self.current, Terminator::Jump(header));
        }
        self.loop_stack.pop();

        self.current = exit_b;
    }

    /// Desugars `for x in iterable { body }` over an array/slice into an
    /// index-counted `while` (spec §4.4.2 names `for` as control flow that
    /// must linearize the same way `while` does; there is no separate
    /// iterator protocol in scope here).
    fn lower_for(&mut self, program: &Program, binding: &str, iterable: NodeIndex, body: NodeIndex) {
        let iter_ty = self.node_type(iterable);
        let elem_ty = self.comp.types.elem_type(iter_ty).unwrap_or(TypeIndex::INVALID);
        let iter_v = self.lower_expr(program, iterable);

        let len_v = if self.comp.types.is_array(iter_ty) {
            let len = self.comp.types.array_len(iter_ty).unwrap_or(0);
            self.emit(ir::Op::ConstInt(len as i64), TypeIndex::I64)
        } else {
            self.emit(ir::Op::SliceLen(iter_v), TypeIndex::I64)
        };
        let ptr_v = if self.comp.types.is_slice(iter_ty) {
            self.emit(ir::Op::SlicePtr(iter_v), TypeIndex::MEM)
        } else {
            iter_v
        };

        self.push_scope();
        let idx_local = self.declare_local("__for_idx", TypeIndex::I64, true);
        let zero = self.emit(ir::Op::ConstInt(0), TypeIndex::I64);
        self.ir.emit(self.current, ir::Op::StoreLocal { local: idx_local, value: zero }, TypeIndex::VOID);

        let header = self.ir.new_block("for.cond");
        self.ir.terminate(self.current, Terminator::Jump(header));
        self.current = header;
        let idx_v = self.emit(ir::Op::LoadLocal(idx_local), TypeIndex::I64);
        let cond_v = self.emit(ir::Op::Binary { op: ir::BinOp::Lt, left: idx_v, right: len_v }, TypeIndex::BOOL);

        let body_b = self.ir.new_block("for.body");
        let incr_b = self.ir.new_block("for.incr");
        let exit_b = self.ir.new_block("for.exit");
        self.ir.terminate(header, Terminator::Branch { cond: cond_v, then_block: body_b, else_block: exit_b });

        self.current = body_b;
        self.push_scope();
        let elem_size = self.comp.types.size_of(elem_ty);
        let idx_v = self.emit(ir::Op::LoadLocal(idx_local), TypeIndex::I64);
        let elem_v = self.emit(ir::Op::IndexValue { base: ptr_v, index: idx_v, elem_size }, elem_ty);
        let binding_local = self.declare_local(binding, elem_ty, false);
        self.ir.emit(self.current, ir::Op::StoreLocal { local: binding_local, value: elem_v }, TypeIndex::VOID);

        self.loop_stack.push(LoopCx { continue_block: incr_b, break_block: exit_b });
        self.lower_stmt(program, body);
        if !self.ir.is_terminated(self.current) {
            self.ir.terminate(self.current, Terminator::Jump(incr_b));
        }
        self.loop_stack.pop();
        self.pop_scope();

        self.current = incr_b;
        let idx_v = self.emit(ir::Op::LoadLocal(idx_local), TypeIndex::I64);
        let one = self.emit(ir::Op::ConstInt(1), TypeIndex::I64);
        let next = self.emit(ir::Op::Binary { op: ir::BinOp::Add, left: idx_v, right: one }, TypeIndex::I64);
        self.ir.emit(self.current, ir::Op::StoreLocal { local: idx_local, value: next }, TypeIndex::VOID);
        self.ir.terminate(self.current, Terminator::Jump(header));

        self.pop_scope();
        self.current = exit_b;
    }

    fn lower_assign(&mut self, program: &Program, target: NodeIndex, op: AssignOp, value: NodeIndex) {
        let rhs = self.lower_expr(program, value);
        let rhs = if op == AssignOp::Assign {
            rhs
        } else {
            let cur = self.lower_expr(program, target);
            let bin_op = match op {
                AssignOp::AddAssign => ir::BinOp::Add,
                AssignOp::SubAssign => ir::BinOp::Sub,
                AssignOp::MulAssign => ir::BinOp::Mul,
                AssignOp::DivAssign => ir::BinOp::Div,
                AssignOp::RemAssign => ir::BinOp::Rem,
                AssignOp::Assign => unreachable!(),
            };
            let ty = self.node_type(target);
            self.emit(ir::Op::Binary { op: bin_op, left: cur, right: rhs }, ty)
        };
        self.lower_store(program, target, rhs);
    }
}
