//! Expression type inference (spec §4.3): the `inferExprType` table. Every
//! node's result is memoized in [`super::TypeCache`] so a diamond of shared
//! sub-expressions (e.g. a `switch` subject read by several case arms) is
//! only ever evaluated once.

use super::Checker;
use crate::ast::{BinaryOp, Expr, LiteralValue, NodeIndex, Program, Span, UnaryOp};
use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::scope::SymbolKind;
use crate::types::{FuncParam, Type, TypeIndex, UnionVariant};

impl<'a, S: DiagnosticSink> Checker<'a, S> {
    /// Entry point: returns the memoized type for `node`, computing it on
    /// first access. A second call for the same node always returns the
    /// cached result (spec §5 ordering guarantee).
    pub(super) fn infer_expr(&mut self, program: &Program, node: NodeIndex) -> TypeIndex {
        if let Some(cached) = self.cache.get(node) {
            return cached;
        }
        let span = program.ast.span(node);
        let ty = self.infer_expr_uncached(program, node, span);
        self.cache_type(node, ty)
    }

    fn infer_expr_uncached(&mut self, program: &Program, node: NodeIndex, span: Span) -> TypeIndex {
        let Some(expr) = program.ast.as_expr(node).cloned() else {
            return TypeIndex::INVALID;
        };
        match expr {
            Expr::Ident(name) => self.infer_ident(&name, span),
            Expr::Literal(lit) => self.infer_literal(&lit),
            Expr::Binary { op, left, right } => self.infer_binary(program, op, left, right, span),
            Expr::Unary { op, operand } => self.infer_unary(program, op, operand, span),
            Expr::Call { callee, args } => self.infer_call(program, callee, &args, span),
            Expr::PrintCall { .. } => TypeIndex::VOID,
            Expr::LenCall { arg } => self.infer_len_call(program, arg, span),
            Expr::BuiltinCall { name, type_arg, args } => {
                self.infer_builtin_call(program, name, type_arg.as_ref(), &args, span)
            }
            Expr::Index { base, index } => self.infer_index(program, base, index, span),
            Expr::SliceExpr { base, start, end } => self.infer_slice_expr(program, base, start, end, span),
            Expr::FieldAccess { base, field } => self.infer_field_access(program, base, &field, span),
            Expr::ArrayLiteral { elements } => self.infer_array_literal(program, &elements, span),
            Expr::Paren(inner) => self.infer_expr(program, inner),
            Expr::IfExpr { cond, then_expr, else_expr } => {
                self.infer_if_expr(program, cond, then_expr, else_expr, span)
            }
            Expr::SwitchExpr { subject, cases, else_body } => {
                self.infer_switch_expr(program, subject, &cases, else_body, span)
            }
            Expr::BlockExpr { stmts, expr } => self.infer_block_expr(program, &stmts, expr),
            Expr::StructInit { type_name, fields } => {
                self.infer_struct_init(program, &type_name, &fields, span)
            }
            Expr::NewExpr { type_node } => self.resolve_type_expr(&type_node, span),
            Expr::StringInterp { segments } => {
                for seg in &segments {
                    if let crate::ast::InterpSegment::Expr(e) = seg {
                        self.infer_expr(program, *e);
                    }
                }
                TypeIndex::STRING
            }
            Expr::AddrOf(operand) => {
                let inner = self.infer_expr(program, operand);
                self.comp.types.make_pointer(inner)
            }
            Expr::Deref(operand) => {
                let inner = self.infer_expr(program, operand);
                match self.comp.types.pointer_elem(inner) {
                    Some(elem) => elem,
                    None => {
                        self.sink.error(span, DiagnosticCode::E300, "cannot dereference a non-pointer value");
                        TypeIndex::INVALID
                    }
                }
            }
            Expr::OptUnwrap(operand) => {
                let inner = self.infer_expr(program, operand);
                match self.comp.types.get(inner) {
                    Type::Optional { elem } => *elem,
                    _ => {
                        self.sink.error(span, DiagnosticCode::E300, "'.?' applied to a non-optional value");
                        TypeIndex::INVALID
                    }
                }
            }
            Expr::TypeExpr(te) => self.resolve_type_expr(&te, span),
            Expr::BadExpr => TypeIndex::INVALID,
        }
    }

    fn infer_ident(&mut self, name: &str, span: Span) -> TypeIndex {
        match self.scope.lookup(name) {
            Some(sym) => sym.type_idx,
            None => {
                self.sink.error(span, DiagnosticCode::E301, format!("undefined identifier '{name}'"));
                TypeIndex::INVALID
            }
        }
    }

    fn infer_literal(&mut self, lit: &LiteralValue) -> TypeIndex {
        match lit {
            LiteralValue::Int(_) => TypeIndex::UNTYPED_INT,
            LiteralValue::Float(_) => TypeIndex::UNTYPED_FLOAT,
            LiteralValue::Str(_) => TypeIndex::STRING,
            LiteralValue::Char(_) => TypeIndex::U8,
            LiteralValue::True | LiteralValue::False => TypeIndex::UNTYPED_BOOL,
            LiteralValue::Null => TypeIndex::UNTYPED_NULL,
            LiteralValue::Undefined => TypeIndex::UNTYPED_NULL,
        }
    }

    fn infer_binary(
        &mut self,
        program: &Program,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
        span: Span,
    ) -> TypeIndex {
        let lt = self.infer_expr(program, left);
        let rt = self.infer_expr(program, right);
        if self.comp.types.is_invalid(lt) || self.comp.types.is_invalid(rt) {
            return TypeIndex::INVALID;
        }
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                if op == BinaryOp::Add && (lt == TypeIndex::STRING || rt == TypeIndex::STRING) {
                    return TypeIndex::STRING;
                }
                self.numeric_result(lt, rt, span)
            }
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if !self.comp.types.is_assignable(lt, rt) && !self.comp.types.is_assignable(rt, lt) {
                    self.sink.error(span, DiagnosticCode::E300, "comparison operands have incompatible types");
                }
                TypeIndex::BOOL
            }
            BinaryOp::And | BinaryOp::Or => {
                if !self.comp.types.is_bool(lt) || !self.comp.types.is_bool(rt) {
                    self.sink.error(span, DiagnosticCode::E300, "logical operator requires bool operands");
                }
                TypeIndex::BOOL
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
                if !self.comp.types.is_integer(lt) || !self.comp.types.is_integer(rt) {
                    self.sink.error(span, DiagnosticCode::E300, "bitwise operator requires integer operands");
                    return TypeIndex::INVALID;
                }
                if self.comp.types.is_untyped(lt) { rt } else { lt }
            }
            BinaryOp::Coalesce => match self.comp.types.get(lt).clone() {
                Type::Optional { elem } => {
                    if !self.comp.types.is_assignable(rt, elem) {
                        self.sink.error(span, DiagnosticCode::E300, "'??' fallback type does not match");
                    }
                    elem
                }
                _ => {
                    self.sink.error(span, DiagnosticCode::E300, "'??' left operand must be optional");
                    TypeIndex::INVALID
                }
            },
        }
    }

    /// Arithmetic result type: materializes untyped operands toward the
    /// other side, widening int->float if the two disagree (spec §4.3).
    fn numeric_result(&mut self, lt: TypeIndex, rt: TypeIndex, span: Span) -> TypeIndex {
        if !self.comp.types.is_numeric(lt) || !self.comp.types.is_numeric(rt) {
            self.sink.error(span, DiagnosticCode::E300, "arithmetic operator requires numeric operands");
            return TypeIndex::INVALID;
        }
        let lt_untyped = self.comp.types.is_untyped(lt);
        let rt_untyped = self.comp.types.is_untyped(rt);
        match (lt_untyped, rt_untyped) {
            (true, true) => {
                if self.comp.types.is_float(lt) || self.comp.types.is_float(rt) {
                    TypeIndex::UNTYPED_FLOAT
                } else {
                    TypeIndex::UNTYPED_INT
                }
            }
            (true, false) => rt,
            (false, true) => lt,
            (false, false) => {
                if !self.comp.types.equal(lt, rt) {
                    self.sink.error(span, DiagnosticCode::E300, "mismatched operand types");
                }
                lt
            }
        }
    }

    fn infer_unary(&mut self, program: &Program, op: UnaryOp, operand: NodeIndex, span: Span) -> TypeIndex {
        let ty = self.infer_expr(program, operand);
        if self.comp.types.is_invalid(ty) {
            return TypeIndex::INVALID;
        }
        match op {
            UnaryOp::Neg => {
                if !self.comp.types.is_numeric(ty) {
                    self.sink.error(span, DiagnosticCode::E303, "unary '-' requires a numeric operand");
                    return TypeIndex::INVALID;
                }
                ty
            }
            UnaryOp::Not => {
                if !self.comp.types.is_bool(ty) {
                    self.sink.error(span, DiagnosticCode::E303, "unary '!' requires a bool operand");
                    return TypeIndex::INVALID;
                }
                TypeIndex::BOOL
            }
            UnaryOp::BitNot => {
                if !self.comp.types.is_integer(ty) {
                    self.sink.error(span, DiagnosticCode::E303, "unary '~' requires an integer operand");
                    return TypeIndex::INVALID;
                }
                ty
            }
        }
    }

    fn infer_call(&mut self, program: &Program, callee: NodeIndex, args: &[NodeIndex], span: Span) -> TypeIndex {
        let arg_types: Vec<TypeIndex> = args.iter().map(|&a| self.infer_expr(program, a)).collect();

        if let Some(Expr::FieldAccess { base: Some(base), field }) = program.ast.as_expr(callee).cloned() {
            let base_ty = self.infer_expr(program, base);
            let lookup_ty = self.comp.types.pointer_elem(base_ty).unwrap_or(base_ty);
            // `UnionName.Variant(payload)`: `base` names the union type
            // itself; this is a constructor call, not a method call.
            if let Type::Union { variants, .. } = self.comp.types.get(lookup_ty).clone() {
                if let Some(variant) = variants.iter().find(|v| v.name == field) {
                    return self.check_union_constructor(variant, &arg_types, lookup_ty, span);
                }
            }
            if let Some(func_ty) = self.builtin_container_method(lookup_ty, &field) {
                return self.check_call_signature(func_ty, &arg_types, span, true);
            }
            let recv_name = self.comp.types.get(lookup_ty).nominal_name().map(|s| s.to_string());
            if let Some(recv_name) = recv_name {
                if let Some(func_ty) = self.comp.types.lookup_method(&recv_name, &field) {
                    return self.check_call_signature(func_ty, &arg_types, span, true);
                }
            }
            self.sink.error(span, DiagnosticCode::E306, format!("no method '{field}' on this type"));
            return TypeIndex::INVALID;
        }

        if let Some(Expr::Ident(name)) = program.ast.as_expr(callee).cloned() {
            let sym = self.scope.lookup(&name).cloned();
            match sym {
                Some(sym) if sym.kind == SymbolKind::Function => {
                    return self.check_call_signature(sym.type_idx, &arg_types, span, false);
                }
                Some(_) => {
                    self.sink.error(span, DiagnosticCode::E305, format!("'{name}' is not callable"));
                    return TypeIndex::INVALID;
                }
                None => {
                    self.sink.error(span, DiagnosticCode::E301, format!("undefined identifier '{name}'"));
                    return TypeIndex::INVALID;
                }
            }
        }

        let callee_ty = self.infer_expr(program, callee);
        match self.comp.types.get(callee_ty).clone() {
            Type::Func { .. } => self.check_call_signature(callee_ty, &arg_types, span, false),
            _ => {
                self.sink.error(span, DiagnosticCode::E305, "callee is not callable");
                TypeIndex::INVALID
            }
        }
    }

    fn check_call_signature(
        &mut self,
        func_ty: TypeIndex,
        arg_types: &[TypeIndex],
        span: Span,
        implicit_self: bool,
    ) -> TypeIndex {
        let (params, return_type) = match self.comp.types.get(func_ty).clone() {
            Type::Func { params, return_type } => (params, return_type),
            _ => {
                self.sink.error(span, DiagnosticCode::E305, "callee is not callable");
                return TypeIndex::INVALID;
            }
        };
        let expected = if implicit_self { params.len().saturating_sub(1) } else { params.len() };
        if arg_types.len() != expected {
            self.sink.error(
                span,
                DiagnosticCode::E304,
                format!("expected {expected} argument(s), found {}", arg_types.len()),
            );
            return return_type;
        }
        let param_slice: &[_] = if implicit_self {
            params.get(1..).unwrap_or(&[])
        } else {
            &params[..]
        };
        for (arg_ty, param) in arg_types.iter().zip(param_slice.iter()) {
            if !self.comp.types.is_assignable(*arg_ty, param.ty) {
                self.sink.error(span, DiagnosticCode::E300, format!("argument type mismatch for '{}'", param.name));
            }
        }
        return_type
    }

    /// Validate a `UnionName.Variant(...)` constructor call: a unit variant
    /// takes no arguments, a payload variant takes exactly one assignable to
    /// the variant's payload type. Always yields the union type itself,
    /// since there is no separate constructor-function registration to
    /// route this through `check_call_signature`.
    fn check_union_constructor(
        &mut self,
        variant: &UnionVariant,
        arg_types: &[TypeIndex],
        union_ty: TypeIndex,
        span: Span,
    ) -> TypeIndex {
        match variant.payload {
            Some(payload_ty) => {
                if arg_types.len() != 1 {
                    self.sink.error(
                        span,
                        DiagnosticCode::E304,
                        format!("expected 1 argument(s), found {}", arg_types.len()),
                    );
                } else if !self.comp.types.is_assignable(arg_types[0], payload_ty) {
                    self.sink.error(span, DiagnosticCode::E300, format!("argument type mismatch for variant '{}'", variant.name));
                }
            }
            None => {
                if !arg_types.is_empty() {
                    self.sink.error(
                        span,
                        DiagnosticCode::E304,
                        format!("expected 0 argument(s), found {}", arg_types.len()),
                    );
                }
            }
        }
        union_ty
    }

    /// Synthesizes a `Type::Func` signature (with an implicit leading
    /// `self` pointer parameter, mirroring a real method) for `map`/`list`'s
    /// built-in methods. These receivers have no nominal name to key
    /// `TypeRegistry::lookup_method` by, so they're resolved here instead
    /// (spec.md's Field rule table).
    fn builtin_container_method(&mut self, recv_ty: TypeIndex, method: &str) -> Option<TypeIndex> {
        let self_ptr = self.comp.types.make_pointer(recv_ty);
        let self_param = || FuncParam { name: "self".to_string(), ty: self_ptr };
        match self.comp.types.get(recv_ty).clone() {
            Type::Map { key, value } => {
                let (params, return_type) = match method {
                    "set" => (
                        vec![self_param(), FuncParam { name: "key".to_string(), ty: key }, FuncParam { name: "value".to_string(), ty: value }],
                        TypeIndex::VOID,
                    ),
                    "get" => (vec![self_param(), FuncParam { name: "key".to_string(), ty: key }], value),
                    "has" => (vec![self_param(), FuncParam { name: "key".to_string(), ty: key }], TypeIndex::BOOL),
                    "len" => (vec![self_param()], TypeIndex::I64),
                    _ => return None,
                };
                Some(self.comp.types.make_func(params, return_type))
            }
            Type::List { elem } => {
                let (params, return_type) = match method {
                    "push" => (vec![self_param(), FuncParam { name: "value".to_string(), ty: elem }], TypeIndex::VOID),
                    "set" => (
                        vec![self_param(), FuncParam { name: "index".to_string(), ty: TypeIndex::I64 }, FuncParam { name: "value".to_string(), ty: elem }],
                        TypeIndex::VOID,
                    ),
                    "get" => (vec![self_param(), FuncParam { name: "index".to_string(), ty: TypeIndex::I64 }], elem),
                    "has" => (vec![self_param(), FuncParam { name: "index".to_string(), ty: TypeIndex::I64 }], TypeIndex::BOOL),
                    "len" => (vec![self_param()], TypeIndex::I64),
                    _ => return None,
                };
                Some(self.comp.types.make_func(params, return_type))
            }
            _ => None,
        }
    }

    fn infer_len_call(&mut self, program: &Program, arg: NodeIndex, span: Span) -> TypeIndex {
        let ty = self.infer_expr(program, arg);
        if !self.comp.types.is_slice(ty) && !self.comp.types.is_array(ty) {
            self.sink.error(span, DiagnosticCode::E300, "'len' requires a slice, array, or string");
        }
        TypeIndex::I64
    }

    fn infer_builtin_call(
        &mut self,
        program: &Program,
        name: crate::ast::BuiltinName,
        type_arg: Option<&crate::ast::TypeExprKind>,
        args: &[NodeIndex],
        span: Span,
    ) -> TypeIndex {
        use crate::ast::BuiltinName::*;
        for &a in args {
            self.infer_expr(program, a);
        }
        match name {
            SizeOf | AlignOf => TypeIndex::I64,
            StringMake => TypeIndex::STRING,
            IntCast => type_arg
                .map(|t| self.resolve_type_expr(t, span))
                .unwrap_or(TypeIndex::INVALID),
            PtrCast => type_arg
                .map(|t| self.resolve_type_expr(t, span))
                .unwrap_or(TypeIndex::INVALID),
            PtrToInt => TypeIndex::U64,
            IntToPtr => type_arg
                .map(|t| self.resolve_type_expr(t, span))
                .unwrap_or(TypeIndex::INVALID),
            Assert => TypeIndex::VOID,
        }
    }

    fn infer_index(&mut self, program: &Program, base: NodeIndex, index: NodeIndex, span: Span) -> TypeIndex {
        let base_ty = self.infer_expr(program, base);
        let index_ty = self.infer_expr(program, index);
        if !self.comp.types.is_integer(index_ty) {
            self.sink.error(span, DiagnosticCode::E300, "index must be an integer");
        }
        match self.comp.types.elem_type(base_ty) {
            Some(elem) => elem,
            None => {
                if let Type::Map { value, .. } = self.comp.types.get(base_ty) {
                    *value
                } else {
                    self.sink.error(span, DiagnosticCode::E300, "value is not indexable");
                    TypeIndex::INVALID
                }
            }
        }
    }

    fn infer_slice_expr(
        &mut self,
        program: &Program,
        base: NodeIndex,
        start: Option<NodeIndex>,
        end: Option<NodeIndex>,
        span: Span,
    ) -> TypeIndex {
        let base_ty = self.infer_expr(program, base);
        if let Some(s) = start {
            self.infer_expr(program, s);
        }
        if let Some(e) = end {
            self.infer_expr(program, e);
        }
        match self.comp.types.elem_type(base_ty) {
            Some(elem) => self.comp.types.make_slice(elem),
            None => {
                self.sink.error(span, DiagnosticCode::E300, "value cannot be sliced");
                TypeIndex::INVALID
            }
        }
    }

    fn infer_field_access(
        &mut self,
        program: &Program,
        base: Option<NodeIndex>,
        field: &str,
        span: Span,
    ) -> TypeIndex {
        let Some(base) = base else {
            self.sink.error(span, DiagnosticCode::E306, "bare field access outside of 'switch' pattern context");
            return TypeIndex::INVALID;
        };
        let base_ty = self.infer_expr(program, base);
        let lookup_ty = self.comp.types.pointer_elem(base_ty).unwrap_or(base_ty);
        match self.comp.types.get(lookup_ty).clone() {
            Type::Struct { fields, .. } => match fields.iter().find(|f| f.name == field) {
                Some(f) => f.ty,
                None => {
                    self.sink.error(span, DiagnosticCode::E306, format!("no field '{field}' on this struct"));
                    TypeIndex::INVALID
                }
            },
            Type::Enum { variants, .. } => {
                if variants.iter().any(|v| v.name == field) {
                    lookup_ty
                } else {
                    self.sink.error(span, DiagnosticCode::E306, format!("no variant '{field}' on this enum"));
                    TypeIndex::INVALID
                }
            }
            // `UnionType.Variant`: a unit variant reads as a value of the
            // union type itself; a payload variant reads as its (synthetic)
            // constructor function, callable as `UnionType.Variant(payload)`.
            Type::Union { variants, .. } => match variants.iter().find(|v| v.name == field) {
                Some(v) => match v.payload {
                    Some(payload_ty) => {
                        self.comp.types.make_func(vec![FuncParam { name: "value".to_string(), ty: payload_ty }], lookup_ty)
                    }
                    None => lookup_ty,
                },
                None => {
                    self.sink.error(span, DiagnosticCode::E306, format!("no variant '{field}' on this union"));
                    TypeIndex::INVALID
                }
            },
            Type::Slice { elem } => match field {
                "ptr" => self.comp.types.make_pointer(elem),
                "len" => TypeIndex::I64,
                _ => {
                    self.sink.error(span, DiagnosticCode::E306, format!("no field '{field}' on a slice"));
                    TypeIndex::INVALID
                }
            },
            Type::Map { .. } | Type::List { .. } => match self.builtin_container_method(lookup_ty, field) {
                Some(func_ty) => func_ty,
                None => {
                    self.sink.error(span, DiagnosticCode::E306, format!("no field '{field}' on this type"));
                    TypeIndex::INVALID
                }
            },
            _ => {
                self.sink.error(span, DiagnosticCode::E306, format!("no field '{field}' on this type"));
                TypeIndex::INVALID
            }
        }
    }

    fn infer_array_literal(&mut self, program: &Program, elements: &[NodeIndex], span: Span) -> TypeIndex {
        if elements.is_empty() {
            self.sink.error(span, DiagnosticCode::E300, "cannot infer type of an empty array literal");
            return self.comp.types.make_array(TypeIndex::INVALID, 0);
        }
        let elem_ty = self.infer_expr(program, elements[0]);
        for &e in &elements[1..] {
            let t = self.infer_expr(program, e);
            if !self.comp.types.is_assignable(t, elem_ty) {
                self.sink.error(span, DiagnosticCode::E300, "array literal elements must share a type");
            }
        }
        let elem_ty = if self.comp.config.materialize_untyped {
            self.comp.types.materialize(elem_ty)
        } else {
            elem_ty
        };
        self.comp.types.make_array(elem_ty, elements.len() as u64)
    }

    fn infer_if_expr(
        &mut self,
        program: &Program,
        cond: NodeIndex,
        then_expr: NodeIndex,
        else_expr: Option<NodeIndex>,
        span: Span,
    ) -> TypeIndex {
        let cond_ty = self.infer_expr(program, cond);
        if !self.comp.types.is_bool(cond_ty) {
            self.sink.error(span, DiagnosticCode::E300, "'if' condition must be bool");
        }
        let then_ty = self.infer_expr(program, then_expr);
        match else_expr {
            Some(e) => {
                let else_ty = self.infer_expr(program, e);
                if !self.comp.types.is_assignable(else_ty, then_ty) && !self.comp.types.is_assignable(then_ty, else_ty) {
                    self.sink.error(span, DiagnosticCode::E300, "'if' expression branches have incompatible types");
                }
                then_ty
            }
            None => TypeIndex::VOID,
        }
    }

    fn infer_switch_expr(
        &mut self,
        program: &Program,
        subject: NodeIndex,
        cases: &[crate::ast::CaseArm],
        else_body: Option<NodeIndex>,
        span: Span,
    ) -> TypeIndex {
        self.infer_expr(program, subject);
        let mut result_ty: Option<TypeIndex> = None;
        for arm in cases {
            for &p in &arm.patterns {
                self.infer_expr(program, p);
            }
            let body_ty = self.infer_expr(program, arm.body);
            result_ty = Some(result_ty.map_or(body_ty, |acc| acc));
        }
        if let Some(body) = else_body {
            let body_ty = self.infer_expr(program, body);
            result_ty = Some(result_ty.unwrap_or(body_ty));
        }
        result_ty.unwrap_or_else(|| {
            self.sink.error(span, DiagnosticCode::E300, "'switch' expression has no arms");
            TypeIndex::INVALID
        })
    }

    fn infer_block_expr(&mut self, program: &Program, stmts: &[NodeIndex], tail: Option<NodeIndex>) -> TypeIndex {
        self.push_scope();
        for &s in stmts {
            self.check_stmt(program, s);
        }
        let ty = match tail {
            Some(e) => self.infer_expr(program, e),
            None => TypeIndex::VOID,
        };
        self.pop_scope();
        ty
    }

    fn infer_struct_init(
        &mut self,
        program: &Program,
        type_name: &str,
        fields: &[crate::ast::StructInitField],
        span: Span,
    ) -> TypeIndex {
        let Some(ty) = self.comp.types.lookup_by_name(type_name) else {
            self.sink.error(span, DiagnosticCode::E301, format!("undefined type '{type_name}'"));
            for f in fields {
                self.infer_expr(program, f.value);
            }
            return TypeIndex::INVALID;
        };
        let struct_fields = match self.comp.types.get(ty).clone() {
            Type::Struct { fields, .. } => fields,
            _ => {
                self.sink.error(span, DiagnosticCode::E300, format!("'{type_name}' is not a struct"));
                Vec::new()
            }
        };
        for init in fields {
            let value_ty = self.infer_expr(program, init.value);
            match struct_fields.iter().find(|f| f.name == init.name) {
                Some(f) => {
                    if !self.comp.types.is_assignable(value_ty, f.ty) {
                        self.sink.error(span, DiagnosticCode::E300, format!("field '{}' type mismatch", init.name));
                    }
                }
                None => {
                    self.sink.error(span, DiagnosticCode::E306, format!("no field '{}' on '{type_name}'", init.name));
                }
            }
        }
        ty
    }
}
