//! Expression lowering (spec §4.4.3). Every scalar expression lowers to a
//! single IR value; a struct- or array-typed expression lowers to its
//! *address* instead (mirroring the SSA layer's own `TypeIndex::MEM`
//! convention for every address-carrying value, spec §4.5.2 Design Notes
//! §9: aggregates are inherently memory-based, never flat SSA values).
//! `&&`/`||` lower to a flat `ir::BinOp::LogicAnd`/`LogicOr` node here; the
//! actual short-circuit branching is the SSA builder's responsibility
//! (spec §4.5.6), since it alone knows which IR nodes belong to the
//! right-hand operand and need to land in a conditionally-executed block.

use super::Lowerer;
use crate::ast::{self, BinaryOp, BuiltinName, Expr, LiteralValue, NodeIndex, PrintKind, Program, UnaryOp};
use crate::ir::{self, Terminator};
use crate::types::{Type, TypeIndex};

impl<'a> Lowerer<'a> {
    pub(super) fn is_aggregate(&self, ty: TypeIndex) -> bool {
        matches!(self.comp.types.get(ty), Type::Struct { .. } | Type::Array { .. } | Type::Union { .. })
    }

    fn field_offset(&self, struct_ty: TypeIndex, field: &str) -> u32 {
        match self.comp.types.get(struct_ty) {
            Type::Struct { fields, .. } => fields.iter().find(|f| f.name == field).map(|f| f.offset).unwrap_or(0),
            _ => 0,
        }
    }

    /// Compute the address of an lvalue. Every result is `TypeIndex::MEM`
    /// (the same convention the SSA builder uses for its own synthetic
    /// address values, spec §4.5.2 Design Notes §9) since the IR layer
    /// never needs to distinguish "pointer to i32" from "pointer to
    /// Point" — only the checker's source-level types do that.
    pub(super) fn lower_addr(&mut self, program: &Program, node: NodeIndex) -> NodeIndex {
        let Some(expr) = program.ast.as_expr(node).cloned() else {
            return self.lower_expr(program, node);
        };
        match expr {
            Expr::Ident(name) => {
                if let Some(local) = self.lookup_local(&name) {
                    self.emit(ir::Op::AddrLocal(local), TypeIndex::MEM)
                } else {
                    self.emit(ir::Op::AddrGlobal(name), TypeIndex::MEM)
                }
            }
            Expr::FieldAccess { base: Some(b), field } => {
                let base_ty = self.node_type(b);
                let lookup_ty = self.comp.types.pointer_elem(base_ty).unwrap_or(base_ty);
                let offset = self.field_offset(lookup_ty, &field);
                let base_addr = if self.comp.types.is_pointer(base_ty) {
                    self.lower_expr(program, b)
                } else {
                    self.lower_addr(program, b)
                };
                self.emit(ir::Op::AddrOffset { base: base_addr, offset }, TypeIndex::MEM)
            }
            Expr::Index { base, index } => {
                let base_ty = self.node_type(base);
                let elem_ty = self.comp.types.elem_type(base_ty).unwrap_or(TypeIndex::INVALID);
                let elem_size = self.comp.types.size_of(elem_ty);
                let idx_v = self.lower_expr(program, index);
                let base_addr = if self.comp.types.is_slice(base_ty) {
                    let sv = self.lower_expr(program, base);
                    self.emit(ir::Op::SlicePtr(sv), TypeIndex::MEM)
                } else {
                    self.lower_addr(program, base)
                };
                self.emit(ir::Op::AddrIndex { base: base_addr, index: idx_v, elem_size }, TypeIndex::MEM)
            }
            Expr::Deref(operand) => self.lower_expr(program, operand),
            Expr::Paren(inner) => self.lower_addr(program, inner),
            _ => self.lower_expr(program, node),
        }
    }

    /// Recursive field/element-wise copy between two addresses. The IR has
    /// no bulk-`memcpy` primitive of its own (that's a codegen concern);
    /// scalarizing here keeps every store explicit and typed.
    pub(super) fn lower_aggregate_copy(&mut self, dest_addr: NodeIndex, src_addr: NodeIndex, ty: TypeIndex) {
        match self.comp.types.get(ty).clone() {
            Type::Struct { fields, .. } => {
                for f in fields {
                    if self.is_aggregate(f.ty) {
                        let d = self.emit(ir::Op::AddrOffset { base: dest_addr, offset: f.offset }, TypeIndex::MEM);
                        let s = self.emit(ir::Op::AddrOffset { base: src_addr, offset: f.offset }, TypeIndex::MEM);
                        self.lower_aggregate_copy(d, s, f.ty);
                    } else {
                        let v = self.emit(ir::Op::FieldValue { base: src_addr, offset: f.offset }, f.ty);
                        self.ir.emit(self.current, ir::Op::StoreField { addr: dest_addr, offset: f.offset, value: v }, TypeIndex::VOID);
                    }
                }
            }
            Type::Array { elem, length } => {
                let elem_size = self.comp.types.size_of(elem);
                for i in 0..length {
                    let off = (i as u32) * elem_size;
                    if self.is_aggregate(elem) {
                        let d = self.emit(ir::Op::AddrOffset { base: dest_addr, offset: off }, TypeIndex::MEM);
                        let s = self.emit(ir::Op::AddrOffset { base: src_addr, offset: off }, TypeIndex::MEM);
                        self.lower_aggregate_copy(d, s, elem);
                    } else {
                        let v = self.emit(ir::Op::FieldValue { base: src_addr, offset: off }, elem);
                        self.ir.emit(self.current, ir::Op::StoreField { addr: dest_addr, offset: off, value: v }, TypeIndex::VOID);
                    }
                }
            }
            _ => {
                let v = self.emit(ir::Op::PtrLoad(src_addr), ty);
                self.ir.emit(self.current, ir::Op::PtrStore { addr: dest_addr, value: v }, TypeIndex::VOID);
            }
        }
    }

    /// Store an already-lowered value (or, for an aggregate, its source
    /// address) into whatever lvalue `target` denotes.
    pub(super) fn lower_store(&mut self, program: &Program, target: NodeIndex, value: NodeIndex) {
        let ty = self.node_type(target);
        if self.is_aggregate(ty) {
            let dest_addr = self.lower_addr(program, target);
            self.lower_aggregate_copy(dest_addr, value, ty);
            return;
        }
        let Some(expr) = program.ast.as_expr(target).cloned() else { return };
        match expr {
            Expr::Ident(name) => {
                if let Some(local) = self.lookup_local(&name) {
                    self.ir.emit(self.current, ir::Op::StoreLocal { local, value }, TypeIndex::VOID);
                } else {
                    self.ir.emit(self.current, ir::Op::StoreGlobal { name, value }, TypeIndex::VOID);
                }
            }
            Expr::FieldAccess { base: Some(b), field } => {
                let base_ty = self.node_type(b);
                let lookup_ty = self.comp.types.pointer_elem(base_ty).unwrap_or(base_ty);
                let offset = self.field_offset(lookup_ty, &field);
                if !self.comp.types.is_pointer(base_ty) {
                    if let Some(Expr::Ident(name)) = program.ast.as_expr(b) {
                        if let Some(local) = self.lookup_local(name) {
                            self.ir.emit(self.current, ir::Op::StoreLocalField { local, offset, value }, TypeIndex::VOID);
                            return;
                        }
                    }
                }
                let addr = if self.comp.types.is_pointer(base_ty) { self.lower_expr(program, b) } else { self.lower_addr(program, b) };
                self.ir.emit(self.current, ir::Op::StoreField { addr, offset, value }, TypeIndex::VOID);
            }
            Expr::Index { base, index } => {
                let base_ty = self.node_type(base);
                let elem_ty = self.comp.types.elem_type(base_ty).unwrap_or(TypeIndex::INVALID);
                let elem_size = self.comp.types.size_of(elem_ty);
                let idx_v = self.lower_expr(program, index);
                if self.comp.types.is_array(base_ty) {
                    if let Some(Expr::Ident(name)) = program.ast.as_expr(base) {
                        if let Some(local) = self.lookup_local(name) {
                            self.ir.emit(self.current, ir::Op::StoreIndexLocal { local, index: idx_v, elem_size, value }, TypeIndex::VOID);
                            return;
                        }
                    }
                }
                let base_v = if self.comp.types.is_slice(base_ty) {
                    let sv = self.lower_expr(program, base);
                    self.emit(ir::Op::SlicePtr(sv), TypeIndex::MEM)
                } else {
                    self.lower_addr(program, base)
                };
                self.ir.emit(self.current, ir::Op::StoreIndexValue { base: base_v, index: idx_v, elem_size, value }, TypeIndex::VOID);
            }
            Expr::Deref(operand) => {
                let addr = self.lower_expr(program, operand);
                self.ir.emit(self.current, ir::Op::PtrStore { addr, value }, TypeIndex::VOID);
            }
            Expr::Paren(inner) => self.lower_store(program, inner, value),
            _ => {}
        }
    }

    pub(super) fn lower_expr(&mut self, program: &Program, node: NodeIndex) -> NodeIndex {
        let Some(expr) = program.ast.as_expr(node).cloned() else {
            return self.emit(ir::Op::Nop, TypeIndex::VOID);
        };
        let ty = self.node_type(node);
        match expr {
            Expr::Ident(name) => {
                if let Some(local) = self.lookup_local(&name) {
                    if self.is_aggregate(ty) {
                        self.emit(ir::Op::AddrLocal(local), TypeIndex::MEM)
                    } else {
                        self.emit(ir::Op::LoadLocal(local), ty)
                    }
                } else if let Some(&v) = self.folded_constants.get(&name) {
                    self.emit(ir::Op::ConstInt(v), ty)
                } else if self.function_names.contains(&name) {
                    self.emit(ir::Op::FuncAddr(name), ty)
                } else {
                    self.emit(ir::Op::LoadGlobal(name), ty)
                }
            }
            Expr::Literal(lit) => self.lower_literal(&lit, ty),
            Expr::Binary { op, left, right } => self.lower_binary(program, op, left, right, ty),
            Expr::Unary { op, operand } => {
                let v = self.lower_expr(program, operand);
                let un_op = match op {
                    UnaryOp::Neg => ir::UnOp::Neg,
                    UnaryOp::Not => ir::UnOp::Not,
                    UnaryOp::BitNot => ir::UnOp::BitNot,
                };
                self.emit(ir::Op::Unary { op: un_op, operand: v }, ty)
            }
            Expr::Call { callee, args } => self.lower_call(program, callee, &args, ty),
            Expr::PrintCall { kind, arg } => {
                let v = self.lower_expr(program, arg);
                let name = match kind {
                    PrintKind::Print => "__print",
                    PrintKind::Println => "__println",
                    PrintKind::EPrint => "__eprint",
                    PrintKind::EPrintln => "__eprintln",
                };
                self.emit(ir::Op::CallDirect { name: name.to_string(), args: vec![v] }, TypeIndex::VOID)
            }
            Expr::LenCall { arg } => {
                let base_ty = self.node_type(arg);
                if self.comp.types.is_array(base_ty) {
                    let len = self.comp.types.array_len(base_ty).unwrap_or(0);
                    self.emit(ir::Op::ConstInt(len as i64), TypeIndex::I64)
                } else {
                    let v = self.lower_expr(program, arg);
                    self.emit(ir::Op::SliceLen(v), TypeIndex::I64)
                }
            }
            Expr::BuiltinCall { name, type_arg, args } => self.lower_builtin_call(program, name, type_arg.as_ref(), &args, ty),
            Expr::Index { base, index } => self.lower_index(program, base, index, ty),
            Expr::SliceExpr { base, start, end } => self.lower_slice_expr(program, base, start, end, ty),
            Expr::FieldAccess { base, field } => self.lower_field_access(program, base, &field, ty),
            Expr::ArrayLiteral { elements } => self.lower_array_literal(program, &elements, ty),
            Expr::Paren(inner) => self.lower_expr(program, inner),
            Expr::IfExpr { cond, then_expr, else_expr } => self.lower_if_expr(program, cond, then_expr, else_expr, ty),
            Expr::SwitchExpr { subject, cases, else_body } => self.lower_switch_expr(program, subject, &cases, else_body, ty),
            Expr::BlockExpr { stmts, expr } => {
                self.push_scope();
                for s in stmts {
                    self.lower_stmt(program, s);
                }
                let v = match expr {
                    Some(e) => self.lower_expr(program, e),
                    None => self.emit(ir::Op::Nop, TypeIndex::VOID),
                };
                self.pop_scope();
                v
            }
            Expr::StructInit { type_name, fields } => self.lower_struct_init(program, &type_name, &fields, ty),
            Expr::NewExpr { type_node } => {
                let target_ty = self.resolve_type(&type_node).unwrap_or(TypeIndex::INVALID);
                let size = self.comp.types.size_of(target_ty);
                let size_v = self.emit(ir::Op::ConstInt(size as i64), TypeIndex::I64);
                self.emit(ir::Op::CallDirect { name: "__alloc".to_string(), args: vec![size_v] }, ty)
            }
            Expr::StringInterp { segments } => self.lower_string_interp(program, &segments),
            Expr::AddrOf(operand) => self.lower_addr(program, operand),
            Expr::Deref(operand) => {
                let addr = self.lower_expr(program, operand);
                if self.is_aggregate(ty) {
                    addr
                } else {
                    self.emit(ir::Op::PtrLoad(addr), ty)
                }
            }
            Expr::OptUnwrap(operand) => {
                let v = self.lower_expr(program, operand);
                self.emit(ir::Op::Convert { target: ty, operand: v }, ty)
            }
            Expr::TypeExpr(te) => {
                let resolved = self.resolve_type(&te).unwrap_or(TypeIndex::INVALID);
                let size = self.comp.types.size_of(resolved);
                self.emit(ir::Op::ConstInt(size as i64), TypeIndex::I64)
            }
            Expr::BadExpr => self.emit(ir::Op::Nop, TypeIndex::VOID),
        }
    }

    fn lower_literal(&mut self, lit: &LiteralValue, ty: TypeIndex) -> NodeIndex {
        match lit {
            LiteralValue::Int(v) => self.emit(ir::Op::ConstInt(*v), ty),
            LiteralValue::Float(v) => self.emit(ir::Op::ConstFloat(*v), ty),
            LiteralValue::Str(s) => {
                let idx = self.ir.add_string(s.clone().into_bytes());
                self.emit(ir::Op::ConstString(idx), TypeIndex::STRING)
            }
            LiteralValue::Char(c) => self.emit(ir::Op::ConstInt(*c as i64), TypeIndex::U8),
            LiteralValue::True => self.emit(ir::Op::ConstBool(true), TypeIndex::BOOL),
            LiteralValue::False => self.emit(ir::Op::ConstBool(false), TypeIndex::BOOL),
            LiteralValue::Null | LiteralValue::Undefined => self.emit(ir::Op::ConstNull, ty),
        }
    }

    /// `&&`/`||` still lower to a flat binary node; the SSA builder is what
    /// turns `LogicAnd`/`LogicOr` into a short-circuiting branch, since only
    /// it can carve the right-hand operand's already-converted nodes out of
    /// the unconditional conversion order (spec §4.5.6).
    fn lower_binary(&mut self, program: &Program, op: BinaryOp, left: NodeIndex, right: NodeIndex, ty: TypeIndex) -> NodeIndex {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let lv = self.lower_expr(program, left);
                let rv = self.lower_expr(program, right);
                let bin_op = if op == BinaryOp::And { ir::BinOp::LogicAnd } else { ir::BinOp::LogicOr };
                self.emit(ir::Op::Binary { op: bin_op, left: lv, right: rv }, ty)
            }
            BinaryOp::Coalesce => {
                let lv = self.lower_expr(program, left);
                let left_ty = self.node_type(left);
                let null_v = self.emit(ir::Op::ConstNull, left_ty);
                let is_null = self.emit(ir::Op::Binary { op: ir::BinOp::Eq, left: lv, right: null_v }, TypeIndex::BOOL);
                let rv = self.lower_expr(program, right);
                self.emit(ir::Op::CondSelect { cond: is_null, then_value: rv, else_value: lv }, ty)
            }
            _ => {
                let lv = self.lower_expr(program, left);
                let rv = self.lower_expr(program, right);
                let left_ty = self.node_type(left);
                if op == BinaryOp::Add && left_ty == TypeIndex::STRING {
                    return self.emit(ir::Op::StrConcat { left: lv, right: rv }, TypeIndex::STRING);
                }
                let bin_op = match op {
                    BinaryOp::Add => ir::BinOp::Add,
                    BinaryOp::Sub => ir::BinOp::Sub,
                    BinaryOp::Mul => ir::BinOp::Mul,
                    BinaryOp::Div => ir::BinOp::Div,
                    BinaryOp::Rem => ir::BinOp::Rem,
                    BinaryOp::Eq => ir::BinOp::Eq,
                    BinaryOp::Ne => ir::BinOp::Ne,
                    BinaryOp::Lt => ir::BinOp::Lt,
                    BinaryOp::Le => ir::BinOp::Le,
                    BinaryOp::Gt => ir::BinOp::Gt,
                    BinaryOp::Ge => ir::BinOp::Ge,
                    BinaryOp::BitAnd => ir::BinOp::BitAnd,
                    BinaryOp::BitOr => ir::BinOp::BitOr,
                    BinaryOp::BitXor => ir::BinOp::BitXor,
                    BinaryOp::Shl => ir::BinOp::Shl,
                    BinaryOp::Shr => ir::BinOp::Shr,
                    BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => unreachable!(),
                };
                self.emit(ir::Op::Binary { op: bin_op, left: lv, right: rv }, ty)
            }
        }
    }

    /// Maps a built-in container type to the `__{prefix}_{method}` runtime
    /// name the checker synthesized a signature for (`checker/expr.rs`'s
    /// `builtin_container_method`).
    fn container_runtime_prefix(&self, ty: TypeIndex) -> Option<&'static str> {
        match self.comp.types.get(ty) {
            Type::Map { .. } => Some("map"),
            Type::List { .. } => Some("list"),
            _ => None,
        }
    }

    /// `UnionName.Variant(payload)`: stores the tag and (if present) the
    /// payload into a fresh local and returns its address, the same
    /// aggregate-as-address convention every other union-typed value uses.
    fn lower_union_construct(&mut self, union_ty: TypeIndex, tag: i64, payload: Option<(TypeIndex, NodeIndex)>) -> NodeIndex {
        let tag_type = match self.comp.types.get(union_ty) {
            Type::Union { tag_type, .. } => *tag_type,
            _ => TypeIndex::I64,
        };
        let local = self.declare_local("__union_lit", union_ty, true);
        let addr = self.emit(ir::Op::AddrLocal(local), TypeIndex::MEM);
        let tag_v = self.emit(ir::Op::ConstInt(tag), tag_type);
        self.ir.emit(self.current, ir::Op::StoreField { addr, offset: 0, value: tag_v }, TypeIndex::VOID);
        if let Some((payload_ty, payload_v)) = payload {
            let tag_size = self.comp.types.size_of(tag_type);
            if self.is_aggregate(payload_ty) {
                let dest = self.emit(ir::Op::AddrOffset { base: addr, offset: tag_size }, TypeIndex::MEM);
                self.lower_aggregate_copy(dest, payload_v, payload_ty);
            } else {
                self.ir.emit(self.current, ir::Op::StoreField { addr, offset: tag_size, value: payload_v }, TypeIndex::VOID);
            }
        }
        addr
    }

    fn lower_call(&mut self, program: &Program, callee: NodeIndex, args: &[NodeIndex], ty: TypeIndex) -> NodeIndex {
        if let Some(Expr::FieldAccess { base: Some(base), field }) = program.ast.as_expr(callee).cloned() {
            // `UnionName.Variant(payload)`: `base` names the union type
            // itself, not a receiver value.
            if let Some(Expr::Ident(name)) = program.ast.as_expr(base) {
                if self.lookup_local(name).is_none() {
                    if let Some(union_ty) = self.comp.types.lookup_by_name(name) {
                        if let Type::Union { variants, .. } = self.comp.types.get(union_ty).clone() {
                            if let Some((tag, variant)) = variants.iter().enumerate().find(|(_, v)| v.name == field) {
                                let payload = variant.payload.map(|pty| (pty, self.lower_expr(program, args[0])));
                                return self.lower_union_construct(union_ty, tag as i64, payload);
                            }
                        }
                    }
                }
            }
            let base_ty = self.node_type(base);
            let lookup_ty = self.comp.types.pointer_elem(base_ty).unwrap_or(base_ty);
            if let Some(prefix) = self.container_runtime_prefix(lookup_ty) {
                let self_addr = if self.comp.types.is_pointer(base_ty) { self.lower_expr(program, base) } else { self.lower_addr(program, base) };
                let mut arg_vals = vec![self_addr];
                arg_vals.extend(args.iter().map(|&a| self.lower_expr(program, a)));
                return self.emit(ir::Op::CallDirect { name: format!("__{prefix}_{field}"), args: arg_vals }, ty);
            }
            let recv_name = self.comp.types.get(lookup_ty).nominal_name().map(|s| s.to_string());
            if let Some(recv_name) = recv_name {
                let self_addr = if self.comp.types.is_pointer(base_ty) { self.lower_expr(program, base) } else { self.lower_addr(program, base) };
                let mut arg_vals = vec![self_addr];
                arg_vals.extend(args.iter().map(|&a| self.lower_expr(program, a)));
                let synthesized = crate::types::TypeRegistry::synthesize_method_name(&recv_name, &field);
                return self.emit(ir::Op::CallDirect { name: synthesized, args: arg_vals }, ty);
            }
        }
        if let Some(Expr::Ident(name)) = program.ast.as_expr(callee).cloned() {
            if let Some(local) = self.lookup_local(&name) {
                let callee_v = self.emit(ir::Op::LoadLocal(local), self.node_type(callee));
                let arg_vals: Vec<NodeIndex> = args.iter().map(|&a| self.lower_expr(program, a)).collect();
                return self.emit(ir::Op::CallIndirect { callee: callee_v, args: arg_vals }, ty);
            }
            let arg_vals: Vec<NodeIndex> = args.iter().map(|&a| self.lower_expr(program, a)).collect();
            return self.emit(ir::Op::CallDirect { name, args: arg_vals }, ty);
        }
        let callee_v = self.lower_expr(program, callee);
        let arg_vals: Vec<NodeIndex> = args.iter().map(|&a| self.lower_expr(program, a)).collect();
        self.emit(ir::Op::CallIndirect { callee: callee_v, args: arg_vals }, ty)
    }

    fn lower_builtin_call(
        &mut self,
        program: &Program,
        name: BuiltinName,
        type_arg: Option<&ast::TypeExprKind>,
        args: &[NodeIndex],
        _ty: TypeIndex,
    ) -> NodeIndex {
        match name {
            BuiltinName::SizeOf => {
                let t = type_arg.and_then(|t| self.resolve_type(t)).unwrap_or(TypeIndex::INVALID);
                self.emit(ir::Op::ConstInt(self.comp.types.size_of(t) as i64), TypeIndex::I64)
            }
            BuiltinName::AlignOf => {
                let t = type_arg.and_then(|t| self.resolve_type(t)).unwrap_or(TypeIndex::INVALID);
                self.emit(ir::Op::ConstInt(self.comp.types.alignment_of(t) as i64), TypeIndex::I64)
            }
            BuiltinName::StringMake => {
                let ptr = self.lower_expr(program, args[0]);
                let len = self.lower_expr(program, args[1]);
                self.emit(ir::Op::StringHeader { ptr, len }, TypeIndex::STRING)
            }
            BuiltinName::IntCast | BuiltinName::PtrCast | BuiltinName::IntToPtr => {
                let target = type_arg.and_then(|t| self.resolve_type(t)).unwrap_or(TypeIndex::INVALID);
                let v = self.lower_expr(program, args[0]);
                self.emit(ir::Op::Convert { target, operand: v }, target)
            }
            BuiltinName::PtrToInt => {
                let v = self.lower_expr(program, args[0]);
                self.emit(ir::Op::Convert { target: TypeIndex::U64, operand: v }, TypeIndex::U64)
            }
            BuiltinName::Assert => {
                let v = self.lower_expr(program, args[0]);
                self.emit(ir::Op::CallDirect { name: "__assert".to_string(), args: vec![v] }, TypeIndex::VOID)
            }
        }
    }

    fn lower_index(&mut self, program: &Program, base: NodeIndex, index: NodeIndex, ty: TypeIndex) -> NodeIndex {
        let base_ty = self.node_type(base);
        let elem_size = self.comp.types.size_of(ty);
        let idx_v = self.lower_expr(program, index);
        if self.comp.types.is_array(base_ty) {
            if let Some(Expr::Ident(name)) = program.ast.as_expr(base) {
                if let Some(local) = self.lookup_local(name) {
                    return self.emit(ir::Op::IndexLocal { local, index: idx_v, elem_size }, ty);
                }
            }
        }
        let base_addr = if self.comp.types.is_slice(base_ty) {
            let sv = self.lower_expr(program, base);
            self.emit(ir::Op::SlicePtr(sv), TypeIndex::MEM)
        } else {
            self.lower_addr(program, base)
        };
        self.emit(ir::Op::IndexValue { base: base_addr, index: idx_v, elem_size }, ty)
    }

    fn lower_slice_expr(&mut self, program: &Program, base: NodeIndex, start: Option<NodeIndex>, end: Option<NodeIndex>, ty: TypeIndex) -> NodeIndex {
        let base_ty = self.node_type(base);
        let elem_ty = self.comp.types.elem_type(base_ty).unwrap_or(TypeIndex::INVALID);
        let elem_size = self.comp.types.size_of(elem_ty);
        let start_v = match start {
            Some(s) => self.lower_expr(program, s),
            None => self.emit(ir::Op::ConstInt(0), TypeIndex::I64),
        };
        let base_addr = if self.comp.types.is_slice(base_ty) {
            let sv = self.lower_expr(program, base);
            self.emit(ir::Op::SlicePtr(sv), TypeIndex::MEM)
        } else {
            self.lower_addr(program, base)
        };
        let ptr = self.emit(ir::Op::AddrIndex { base: base_addr, index: start_v, elem_size }, TypeIndex::MEM);
        let end_v = match end {
            Some(e) => self.lower_expr(program, e),
            None => {
                if self.comp.types.is_array(base_ty) {
                    let len = self.comp.types.array_len(base_ty).unwrap_or(0);
                    self.emit(ir::Op::ConstInt(len as i64), TypeIndex::I64)
                } else {
                    let sv = self.lower_expr(program, base);
                    self.emit(ir::Op::SliceLen(sv), TypeIndex::I64)
                }
            }
        };
        let len_v = self.emit(ir::Op::Binary { op: ir::BinOp::Sub, left: end_v, right: start_v }, TypeIndex::I64);
        self.emit(ir::Op::SliceValue { ptr, len: len_v }, ty)
    }

    fn lower_field_access(&mut self, program: &Program, base: Option<NodeIndex>, field: &str, ty: TypeIndex) -> NodeIndex {
        let Some(base) = base else {
            return self.emit(ir::Op::Nop, TypeIndex::VOID);
        };
        // `EnumType.Variant`/`UnionType.Variant`: `base` names the type
        // itself, not a value.
        if let Some(Expr::Ident(name)) = program.ast.as_expr(base) {
            if self.lookup_local(name).is_none() {
                if let Some(named_ty) = self.comp.types.lookup_by_name(name) {
                    match self.comp.types.get(named_ty).clone() {
                        Type::Enum { variants, .. } => {
                            if let Some(v) = variants.iter().find(|v| v.name == field) {
                                return self.emit(ir::Op::ConstInt(v.value), named_ty);
                            }
                        }
                        Type::Union { variants, .. } => {
                            if let Some((tag, v)) = variants.iter().enumerate().find(|(_, v)| v.name == field) {
                                if v.payload.is_none() {
                                    return self.lower_union_construct(named_ty, tag as i64, None);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        let base_ty = self.node_type(base);
        let lookup_ty = self.comp.types.pointer_elem(base_ty).unwrap_or(base_ty);
        if matches!(self.comp.types.get(lookup_ty), Type::Slice { .. }) || lookup_ty == TypeIndex::STRING {
            let base_v = if self.comp.types.is_pointer(base_ty) {
                let ptr = self.lower_expr(program, base);
                self.emit(ir::Op::PtrLoad(ptr), lookup_ty)
            } else {
                self.lower_expr(program, base)
            };
            return match field {
                "ptr" => self.emit(ir::Op::SlicePtr(base_v), TypeIndex::MEM),
                "len" => self.emit(ir::Op::SliceLen(base_v), TypeIndex::I64),
                _ => self.emit(ir::Op::Nop, TypeIndex::VOID),
            };
        }
        let offset = self.field_offset(lookup_ty, field);
        if !self.comp.types.is_pointer(base_ty) {
            if let Some(Expr::Ident(name)) = program.ast.as_expr(base) {
                if let Some(local) = self.lookup_local(name) {
                    return self.emit(ir::Op::FieldLocal { local, offset }, ty);
                }
            }
        }
        let addr = if self.comp.types.is_pointer(base_ty) { self.lower_expr(program, base) } else { self.lower_addr(program, base) };
        self.emit(ir::Op::FieldValue { base: addr, offset }, ty)
    }

    fn lower_array_literal(&mut self, program: &Program, elements: &[NodeIndex], ty: TypeIndex) -> NodeIndex {
        let elem_ty = self.comp.types.elem_type(ty).unwrap_or(TypeIndex::INVALID);
        let elem_size = self.comp.types.size_of(elem_ty);
        let local = self.declare_local("__array_lit", ty, true);
        for (i, &e) in elements.iter().enumerate() {
            let v = self.lower_expr(program, e);
            let idx = self.emit(ir::Op::ConstInt(i as i64), TypeIndex::I64);
            self.ir.emit(self.current, ir::Op::StoreIndexLocal { local, index: idx, elem_size, value: v }, TypeIndex::VOID);
        }
        self.emit(ir::Op::AddrLocal(local), TypeIndex::MEM)
    }

    fn lower_if_expr(&mut self, program: &Program, cond: NodeIndex, then_expr: NodeIndex, else_expr: Option<NodeIndex>, ty: TypeIndex) -> NodeIndex {
        let cond_v = self.lower_expr(program, cond);
        let result = self.declare_local("__if_result", ty, true);
        let then_b = self.ir.new_block("ifexpr.then");
        let else_b = self.ir.new_block("ifexpr.else");
        self.ir.terminate(self.current, Terminator::Branch { cond: cond_v, then_block: then_b, else_block: else_b });

        self.current = then_b;
        let tv = self.lower_expr(program, then_expr);
        self.ir.emit(self.current, ir::Op::StoreLocal { local: result, value: tv }, TypeIndex::VOID);
        let then_end = self.current;

        self.current = else_b;
        if let Some(e) = else_expr {
            let ev = self.lower_expr(program, e);
            self.ir.emit(self.current, ir::Op::StoreLocal { local: result, value: ev }, TypeIndex::VOID);
        }
        let else_end = self.current;

        let merge_b = self.ir.new_block("ifexpr.merge");
        if !self.ir.is_terminated(then_end) {
            self.ir.terminate(then_end, Terminator::Jump(merge_b));
        }
        if !self.ir.is_terminated(else_end) {
            self.ir.terminate(else_end, Terminator::Jump(merge_b));
        }
        self.current = merge_b;
        self.emit(ir::Op::LoadLocal(result), ty)
    }

    fn lower_switch_expr(
        &mut self,
        program: &Program,
        subject: NodeIndex,
        cases: &[ast::CaseArm],
        else_body: Option<NodeIndex>,
        ty: TypeIndex,
    ) -> NodeIndex {
        let subj_v = self.lower_expr(program, subject);
        let subj_ty = self.node_type(subject);
        let result = self.declare_local("__switch_result", ty, true);
        let merge_b = self.ir.new_block("switch.merge");

        for arm in cases {
            let arm_b = self.ir.new_block("switch.arm");
            let next_b = self.ir.new_block("switch.next");
            let mut cond_v: Option<NodeIndex> = None;
            for &p in &arm.patterns {
                let pat_v = self.lower_pattern_value(program, p, subj_ty);
                let eq = self.emit(ir::Op::Binary { op: ir::BinOp::Eq, left: subj_v, right: pat_v }, TypeIndex::BOOL);
                cond_v = Some(match cond_v {
                    Some(c) => self.emit(ir::Op::Binary { op: ir::BinOp::BitOr, left: c, right: eq }, TypeIndex::BOOL),
                    None => eq,
                });
            }
            let cond_v = cond_v.unwrap_or_else(|| self.emit(ir::Op::ConstBool(false), TypeIndex::BOOL));
            self.ir.terminate(self.current, Terminator::Branch { cond: cond_v, then_block: arm_b, else_block: next_b });

            self.current = arm_b;
            self.push_scope();
            if let Some(cap) = &arm.capture {
                self.declare_local(cap, subj_ty, false);
            }
            let body_v = self.lower_expr(program, arm.body);
            self.ir.emit(self.current, ir::Op::StoreLocal { local: result, value: body_v }, TypeIndex::VOID);
            if !self.ir.is_terminated(self.current) {
                self.ir.terminate(self.current, Terminator::Jump(merge_b));
            }
            self.pop_scope();
            self.current = next_b;
        }

        if let Some(else_node) = else_body {
            let body_v = self.lower_expr(program, else_node);
            self.ir.emit(self.current, ir::Op::StoreLocal { local: result, value: body_v }, TypeIndex::VOID);
        }
        if !self.ir.is_terminated(self.current) {
            self.ir.terminate(self.current, Terminator::Jump(merge_b));
        }
        self.current = merge_b;
        self.emit(ir::Op::LoadLocal(result), ty)
    }

    fn lower_pattern_value(&mut self, program: &Program, pattern: NodeIndex, subj_ty: TypeIndex) -> NodeIndex {
        if let Some(Expr::FieldAccess { base: None, field }) = program.ast.as_expr(pattern) {
            if let Type::Enum { variants, .. } = self.comp.types.get(subj_ty) {
                if let Some(v) = variants.iter().find(|v| v.name == *field) {
                    return self.emit(ir::Op::ConstInt(v.value), subj_ty);
                }
            }
        }
        self.lower_expr(program, pattern)
    }

    fn lower_struct_init(&mut self, program: &Program, type_name: &str, fields: &[ast::StructInitField], ty: TypeIndex) -> NodeIndex {
        let local = self.declare_local("__struct_init", ty, true);
        let addr = self.emit(ir::Op::AddrLocal(local), TypeIndex::MEM);
        let struct_fields = match self.comp.types.get(ty).clone() {
            Type::Struct { fields, .. } => fields,
            _ => Vec::new(),
        };
        for f in fields {
            let Some(sf) = struct_fields.iter().find(|sf| sf.name == f.name) else { continue };
            if self.is_aggregate(sf.ty) {
                let src_addr = self.lower_expr(program, f.value);
                let dest_addr = self.emit(ir::Op::AddrOffset { base: addr, offset: sf.offset }, TypeIndex::MEM);
                self.lower_aggregate_copy(dest_addr, src_addr, sf.ty);
            } else {
                let v = self.lower_expr(program, f.value);
                self.ir.emit(self.current, ir::Op::StoreLocalField { local, offset: sf.offset, value: v }, TypeIndex::VOID);
            }
        }
        addr
    }

    fn lower_string_interp(&mut self, program: &Program, segments: &[ast::InterpSegment]) -> NodeIndex {
        let mut acc: Option<NodeIndex> = None;
        for seg in segments {
            let piece = match seg {
                ast::InterpSegment::Text(s) => {
                    let idx = self.ir.add_string(s.clone().into_bytes());
                    self.emit(ir::Op::ConstString(idx), TypeIndex::STRING)
                }
                ast::InterpSegment::Expr(e) => self.lower_expr(program, *e),
            };
            acc = Some(match acc {
                Some(a) => self.emit(ir::Op::StrConcat { left: a, right: piece }, TypeIndex::STRING),
                None => piece,
            });
        }
        acc.unwrap_or_else(|| {
            let idx = self.ir.add_string(Vec::new());
            self.emit(ir::Op::ConstString(idx), TypeIndex::STRING)
        })
    }
}

