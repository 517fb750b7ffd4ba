//! Statement checking (spec §4.3): assignment/`if`/`while`/`for`/`break`/
//! `continue`/`return` rules. `check_stmt` returns whether the statement is
//! guaranteed to return on every path it can take, which
//! [`super::Checker::check_function_body`] uses for the missing-return
//! diagnostic (`E403`). The analysis is conservative by design (spec §7:
//! best effort, never block compilation on an imprecise answer) — it is an
//! "any branch returns" approximation, not full reachability.

use super::Checker;
use crate::ast::{AssignOp, Expr, NodeIndex, Program, Span, Stmt};
use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::scope::{Symbol, SymbolKind};
use crate::types::TypeIndex;

impl<'a, S: DiagnosticSink> Checker<'a, S> {
    pub(super) fn check_stmt(&mut self, program: &Program, node: NodeIndex) -> bool {
        let Some(stmt) = program.ast.as_stmt(node).cloned() else {
            return false;
        };
        let span = program.ast.span(node);
        match stmt {
            Stmt::Return { value } => self.check_return(program, value, span),
            Stmt::Var { name, type_expr, value, is_const } => {
                self.check_var_stmt(program, node, &name, type_expr.as_ref(), value, is_const, span);
                false
            }
            Stmt::Assign { target, op, value } => {
                self.check_assign(program, target, op, value, span);
                false
            }
            Stmt::If { cond, then_block, else_block } => {
                self.check_if(program, cond, then_block, else_block, span)
            }
            Stmt::While { cond, body } => {
                self.check_while(program, cond, body, span);
                false
            }
            Stmt::For { binding, iterable, body } => {
                self.check_for(program, node, &binding, iterable, body);
                false
            }
            Stmt::Block { stmts } => self.check_block(program, &stmts),
            Stmt::Break => {
                if self.loop_depth == 0 {
                    self.sink.error(span, DiagnosticCode::E400, "'break' outside a loop");
                }
                false
            }
            Stmt::Continue => {
                if self.loop_depth == 0 {
                    self.sink.error(span, DiagnosticCode::E401, "'continue' outside a loop");
                }
                false
            }
            Stmt::Defer { expr } => {
                // Shallow: only the single expression at the defer site is
                // checked. A real deferred-call queue per scope exit is out
                // of scope here (spec's acknowledged limitation, Design
                // Notes §9) — this must stay this way, not be "fixed".
                self.infer_expr(program, expr);
                false
            }
            Stmt::Expr { expr } => {
                self.infer_expr(program, expr);
                false
            }
            Stmt::BadStmt => false,
        }
    }

    fn check_return(&mut self, program: &Program, value: Option<NodeIndex>, span: Span) -> bool {
        let ret_ty = match value {
            Some(v) => self.infer_expr(program, v),
            None => TypeIndex::VOID,
        };
        if !self.comp.types.is_assignable(ret_ty, self.current_return_type) {
            let fname = self.current_fn_name.clone();
            self.sink.error(
                span,
                DiagnosticCode::E402,
                format!("return type mismatch in '{fname}'"),
            );
        }
        true
    }

    fn check_var_stmt(
        &mut self,
        program: &Program,
        node: NodeIndex,
        name: &str,
        type_expr: Option<&crate::ast::TypeExprKind>,
        value: Option<NodeIndex>,
        is_const: bool,
        span: Span,
    ) {
        let declared = type_expr.map(|t| self.resolve_type_expr(t, span));
        let inferred = value
            .map(|v| self.infer_expr(program, v))
            .unwrap_or(TypeIndex::UNTYPED_NULL);
        if let (Some(d), Some(_)) = (declared, value) {
            if !self.comp.types.is_assignable(inferred, d) {
                self.sink.error(span, DiagnosticCode::E300, format!("cannot initialize '{name}': type mismatch"));
            }
        }
        let mut ty = declared.unwrap_or(inferred);
        if declared.is_none() && self.comp.config.materialize_untyped {
            ty = self.comp.types.materialize(ty);
        }
        if self.scope.is_defined(name) {
            self.sink.error(span, DiagnosticCode::E302, format!("'{name}' is already defined in this scope"));
        }
        let kind = if is_const { SymbolKind::Constant } else { SymbolKind::Variable };
        let mut sym = Symbol::new(name.to_string(), kind, ty, node.0);
        if is_const && self.comp.config.fold_constants {
            if let Some(v) = value {
                if let Some(folded) = self.eval_const_expr(program, v) {
                    sym.const_value = Some(folded);
                }
            }
        }
        self.scope.define(sym);
    }

    fn check_assign(&mut self, program: &Program, target: NodeIndex, op: AssignOp, value: NodeIndex, span: Span) {
        let target_ty = self.infer_expr(program, target);
        let value_ty = self.infer_expr(program, value);
        self.check_target_mutable(program, target, span);
        if op != AssignOp::Assign && !self.comp.types.is_numeric(target_ty) {
            self.sink.error(span, DiagnosticCode::E300, "compound assignment requires a numeric target");
        }
        if !self.comp.types.is_assignable(value_ty, target_ty) {
            self.sink.error(span, DiagnosticCode::E300, "assignment type mismatch");
        }
    }

    fn check_target_mutable(&mut self, program: &Program, target: NodeIndex, span: Span) {
        if let Some(Expr::Ident(name)) = program.ast.as_expr(target) {
            match self.scope.lookup(name) {
                Some(sym) if sym.kind == SymbolKind::Constant => {
                    self.sink.error(span, DiagnosticCode::E300, format!("cannot assign to constant '{name}'"));
                }
                Some(sym) if !sym.mutable => {
                    self.sink.error(span, DiagnosticCode::E300, format!("cannot assign to immutable '{name}'"));
                }
                _ => {}
            }
        }
    }

    fn check_if(
        &mut self,
        program: &Program,
        cond: NodeIndex,
        then_block: NodeIndex,
        else_block: Option<NodeIndex>,
        span: Span,
    ) -> bool {
        let cond_ty = self.infer_expr(program, cond);
        if !self.comp.types.is_bool(cond_ty) {
            self.sink.error(span, DiagnosticCode::E300, "'if' condition must be bool");
        }
        let then_terminates = self.check_stmt(program, then_block);
        match else_block {
            Some(eb) => {
                let else_terminates = self.check_stmt(program, eb);
                then_terminates && else_terminates
            }
            None => false,
        }
    }

    fn check_while(&mut self, program: &Program, cond: NodeIndex, body: NodeIndex, span: Span) {
        let cond_ty = self.infer_expr(program, cond);
        if !self.comp.types.is_bool(cond_ty) {
            self.sink.error(span, DiagnosticCode::E300, "'while' condition must be bool");
        }
        self.loop_depth += 1;
        self.check_stmt(program, body);
        self.loop_depth -= 1;
    }

    fn check_for(&mut self, program: &Program, node: NodeIndex, binding: &str, iterable: NodeIndex, body: NodeIndex) {
        let iter_ty = self.infer_expr(program, iterable);
        let elem_ty = self.comp.types.elem_type(iter_ty).unwrap_or(TypeIndex::INVALID);
        self.push_scope();
        self.scope
            .define(Symbol::new(binding.to_string(), SymbolKind::Variable, elem_ty, node.0));
        self.loop_depth += 1;
        self.check_stmt(program, body);
        self.loop_depth -= 1;
        self.pop_scope();
    }

    fn check_block(&mut self, program: &Program, stmts: &[NodeIndex]) -> bool {
        self.push_scope();
        let mut terminates = false;
        for &s in stmts {
            if self.check_stmt(program, s) {
                terminates = true;
            }
        }
        self.pop_scope();
        terminates
    }
}
