//! Type checker (spec §4.3): deterministic multi-phase declaration
//! collection, expression type inference with a memoized per-node cache,
//! and compile-time constant folding.

mod const_eval;
mod expr;
mod stmt;

use crate::ast::{self, Decl, NodeIndex, Program, Span, TypeExprKind};
use crate::compilation::Compilation;
use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::scope::{Scope, Symbol, SymbolKind};
use crate::types::{EnumVariant, FuncParam, TypeIndex, UnionVariant};
use std::collections::HashMap;

/// Per-file cache of expression types, indexed by AST node. Writes are
/// memoized: the first observation for a node wins (spec §5 "Ordering
/// guarantees").
#[derive(Debug, Default)]
pub struct TypeCache {
    map: HashMap<NodeIndex, TypeIndex>,
}

impl TypeCache {
    pub fn get(&self, node: NodeIndex) -> Option<TypeIndex> {
        self.map.get(&node).copied()
    }

    /// Record `ty` for `node` unless already recorded; always returns the
    /// type now on file for `node` (first write wins, spec §5).
    fn record(&mut self, node: NodeIndex, ty: TypeIndex) -> TypeIndex {
        *self.map.entry(node).or_insert(ty)
    }
}

/// Result of a successful (possibly error-recovered) `check_program` call.
pub struct CheckOutput {
    pub cache: TypeCache,
    /// `const_value`s and folded constants keyed by top-level constant
    /// name, consumed by the lowerer so it never emits a global for a
    /// folded `const` (spec §4.4.4).
    pub folded_constants: HashMap<String, i64>,
}

pub struct Checker<'a, S: DiagnosticSink> {
    comp: &'a mut Compilation,
    sink: &'a mut S,
    cache: TypeCache,
    scope: Scope,
    folded_constants: HashMap<String, i64>,
    current_return_type: TypeIndex,
    current_fn_name: String,
    loop_depth: u32,
}

impl<'a, S: DiagnosticSink> Checker<'a, S> {
    pub fn new(comp: &'a mut Compilation, sink: &'a mut S) -> Self {
        Checker {
            comp,
            sink,
            cache: TypeCache::default(),
            scope: Scope::new_global(),
            folded_constants: HashMap::new(),
            current_return_type: TypeIndex::VOID,
            current_fn_name: String::new(),
            loop_depth: 0,
        }
    }

    pub fn check_program(mut self, program: &Program) -> CheckOutput {
        tracing::debug!(decls = program.decls.len(), "checker: phase 1a (types) starting");
        self.phase1a_types(program);
        tracing::debug!("checker: phase 1b (signatures) starting");
        self.phase1b_signatures(program);
        tracing::debug!("checker: phase 2 (bodies) starting");
        self.phase2_bodies(program);
        CheckOutput {
            cache: self.cache,
            folded_constants: self.folded_constants,
        }
    }

    // ---------------------------------------------------------------
    // Shared helpers
    // ---------------------------------------------------------------

    /// Define `sym` in the current scope, applying the duplicate-name rule
    /// (spec §4.3): `E302` unless both old and new are idempotent `extern`
    /// function declarations.
    fn define_checked(&mut self, sym: Symbol, span: Span, is_extern_fn: bool) {
        if let Some(existing) = self.scope.lookup_local(&sym.name) {
            let both_extern_fns =
                is_extern_fn && existing.is_extern && existing.kind == SymbolKind::Function;
            if !both_extern_fns {
                self.sink.error(
                    span,
                    DiagnosticCode::E302,
                    format!("'{}' is already defined in this scope", sym.name),
                );
                return;
            }
        }
        self.scope.define(sym);
    }

    fn push_scope(&mut self) {
        let cur = std::mem::replace(&mut self.scope, Scope::new_global());
        self.scope = cur.push();
    }

    fn pop_scope(&mut self) {
        let cur = std::mem::replace(&mut self.scope, Scope::new_global());
        self.scope = cur.pop();
    }

    fn cache_type(&mut self, node: NodeIndex, ty: TypeIndex) -> TypeIndex {
        self.cache.record(node, ty)
    }

    /// Resolve a syntactic type expression to a [`TypeIndex`], registering
    /// any newly-needed composite (pointer/slice/etc.) in the registry.
    fn resolve_type_expr(&mut self, te: &TypeExprKind, span: Span) -> TypeIndex {
        match te {
            TypeExprKind::Named(name) => match self.comp.types.lookup_by_name(name) {
                Some(idx) => idx,
                None => {
                    self.sink.error(
                        span,
                        DiagnosticCode::E301,
                        format!("undefined type '{name}'"),
                    );
                    TypeIndex::INVALID
                }
            },
            TypeExprKind::Pointer(elem) => {
                let elem = self.resolve_type_expr(elem, span);
                self.comp.types.make_pointer(elem)
            }
            TypeExprKind::Optional(elem) | TypeExprKind::ErrorUnion(elem) => {
                let elem = self.resolve_type_expr(elem, span);
                self.comp.types.make_optional(elem)
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.resolve_type_expr(elem, span);
                self.comp.types.make_slice(elem)
            }
            TypeExprKind::Array { size, elem } => {
                let elem = self.resolve_type_expr(elem, span);
                self.comp.types.make_array(elem, *size)
            }
            TypeExprKind::Map { key, value } => {
                let key = self.resolve_type_expr(key, span);
                let value = self.resolve_type_expr(value, span);
                self.comp.types.make_map(key, value)
            }
            TypeExprKind::List(elem) => {
                let elem = self.resolve_type_expr(elem, span);
                self.comp.types.make_list(elem)
            }
            TypeExprKind::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| FuncParam {
                        name: String::new(),
                        ty: self.resolve_type_expr(p, span),
                    })
                    .collect();
                let ret = match ret {
                    Some(r) => self.resolve_type_expr(r, span),
                    None => TypeIndex::VOID,
                };
                self.comp.types.make_func(params, ret)
            }
        }
    }

    // ---------------------------------------------------------------
    // Phase 1a: struct/enum/union/type-alias declarations
    // ---------------------------------------------------------------

    fn phase1a_types(&mut self, program: &Program) {
        for &decl_idx in &program.decls {
            let Some(decl) = program.ast.as_decl(decl_idx) else { continue };
            let span = program.ast.span(decl_idx);
            match decl {
                Decl::StructDecl { name, fields } => {
                    let field_types: Vec<(String, TypeIndex)> = fields
                        .iter()
                        .map(|f| (f.name.clone(), self.resolve_type_expr(&f.type_expr, span)))
                        .collect();
                    let idx = self.comp.types.register_struct(name.clone(), field_types);
                    self.define_checked(
                        Symbol::new(name.clone(), SymbolKind::TypeName, idx, decl_idx.0),
                        span,
                        false,
                    );
                }
                Decl::EnumDecl { name, backing_type, variants } => {
                    let backing = backing_type
                        .as_ref()
                        .map(|t| self.resolve_type_expr(t, span));
                    let mut next_value = 0i64;
                    let variants: Vec<EnumVariant> = variants
                        .iter()
                        .map(|v| {
                            let value = v.value.unwrap_or(next_value);
                            next_value = value + 1;
                            EnumVariant { name: v.name.clone(), value }
                        })
                        .collect();
                    let idx = self.comp.types.register_enum(name.clone(), variants, backing);
                    self.define_checked(
                        Symbol::new(name.clone(), SymbolKind::TypeName, idx, decl_idx.0),
                        span,
                        false,
                    );
                }
                Decl::UnionDecl { name, variants } => {
                    let variants: Vec<UnionVariant> = variants
                        .iter()
                        .map(|v| UnionVariant {
                            name: v.name.clone(),
                            payload: v.payload.as_ref().map(|p| self.resolve_type_expr(p, span)),
                        })
                        .collect();
                    let idx = self.comp.types.register_union(name.clone(), variants);
                    self.define_checked(
                        Symbol::new(name.clone(), SymbolKind::TypeName, idx, decl_idx.0),
                        span,
                        false,
                    );
                }
                Decl::TypeAlias { name, target } => {
                    let idx = self.resolve_type_expr(target, span);
                    self.comp.types.register_alias(name.clone(), idx);
                    self.define_checked(
                        Symbol::new(name.clone(), SymbolKind::TypeName, idx, decl_idx.0),
                        span,
                        false,
                    );
                }
                _ => {}
            }
        }
    }

    // ---------------------------------------------------------------
    // Phase 1b: function/global/method signatures
    // ---------------------------------------------------------------

    fn fn_signature_type(&mut self, params: &[ast::Param], return_type: &Option<TypeExprKind>, span: Span) -> (TypeIndex, Vec<TypeIndex>) {
        let param_types: Vec<TypeIndex> = params
            .iter()
            .map(|p| self.resolve_type_expr(&p.type_expr, span))
            .collect();
        let ret = match return_type {
            Some(t) => self.resolve_type_expr(t, span),
            None => TypeIndex::VOID,
        };
        let func_params = params
            .iter()
            .zip(param_types.iter())
            .map(|(p, ty)| FuncParam { name: p.name.clone(), ty: *ty })
            .collect();
        (self.comp.types.make_func(func_params, ret), param_types)
    }

    fn phase1b_signatures(&mut self, program: &Program) {
        for &decl_idx in &program.decls {
            let Some(decl) = program.ast.as_decl(decl_idx) else { continue };
            let span = program.ast.span(decl_idx);
            match decl {
                Decl::FnDecl { name, params, return_type, is_extern, .. } => {
                    let (func_ty, _) = self.fn_signature_type(params, return_type, span);
                    self.define_checked(
                        {
                            let mut s = Symbol::new(name.clone(), SymbolKind::Function, func_ty, decl_idx.0);
                            s.is_extern = *is_extern;
                            s.mutable = false;
                            s
                        },
                        span,
                        *is_extern,
                    );
                }
                Decl::VarDecl { name, type_expr, value, is_const } => {
                    let declared = type_expr.as_ref().map(|t| self.resolve_type_expr(t, span));
                    let inferred = value
                        .map(|v| self.infer_expr(program, v))
                        .unwrap_or(TypeIndex::UNTYPED_NULL);
                    let mut ty = declared.unwrap_or(inferred);
                    if declared.is_none() && self.comp.config.materialize_untyped {
                        ty = self.comp.types.materialize(ty);
                    }
                    let kind = if *is_const { SymbolKind::Constant } else { SymbolKind::Variable };
                    let mut sym = Symbol::new(name.clone(), kind, ty, decl_idx.0);
                    if *is_const {
                        if let Some(v) = value {
                            if self.comp.config.fold_constants {
                                if let Some(folded) = self.eval_const_expr(program, *v) {
                                    sym.const_value = Some(folded);
                                    self.folded_constants.insert(name.clone(), folded);
                                }
                            }
                        }
                    }
                    self.define_checked(sym, span, false);
                }
                Decl::ImplBlock { type_name, methods } => {
                    for &method_idx in methods {
                        let Some(Decl::FnDecl { name, params, return_type, is_extern, .. }) =
                            program.ast.as_decl(method_idx)
                        else {
                            continue;
                        };
                        let mspan = program.ast.span(method_idx);
                        let (func_ty, _) = self.fn_signature_type(params, return_type, mspan);
                        self.comp.types.register_method(type_name, name, func_ty);
                        let synthesized =
                            crate::types::TypeRegistry::synthesize_method_name(type_name, name);
                        self.define_checked(
                            {
                                let mut s = Symbol::new(synthesized, SymbolKind::Function, func_ty, method_idx.0);
                                s.is_extern = *is_extern;
                                s
                            },
                            mspan,
                            *is_extern,
                        );
                    }
                }
                _ => {}
            }
        }
    }

    // ---------------------------------------------------------------
    // Phase 2: body checking
    // ---------------------------------------------------------------

    fn phase2_bodies(&mut self, program: &Program) {
        for &decl_idx in &program.decls {
            let Some(decl) = program.ast.as_decl(decl_idx) else { continue };
            match decl {
                Decl::FnDecl { name, params, return_type, body, is_extern, .. } => {
                    if *is_extern {
                        continue;
                    }
                    if let Some(body) = body {
                        self.check_function_body(program, name, params, return_type, *body);
                    }
                }
                Decl::ImplBlock { type_name, methods } => {
                    for &method_idx in methods {
                        let Some(Decl::FnDecl { name, params, return_type, body, is_extern, .. }) =
                            program.ast.as_decl(method_idx)
                        else {
                            continue;
                        };
                        if *is_extern {
                            continue;
                        }
                        if let Some(body) = body {
                            let synthesized =
                                crate::types::TypeRegistry::synthesize_method_name(type_name, name);
                            self.check_function_body(program, &synthesized, params, return_type, *body);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn check_function_body(
        &mut self,
        program: &Program,
        name: &str,
        params: &[ast::Param],
        return_type: &Option<TypeExprKind>,
        body: NodeIndex,
    ) {
        let span = program.ast.span(body);
        let ret_ty = match return_type {
            Some(t) => self.resolve_type_expr(t, span),
            None => TypeIndex::VOID,
        };
        self.current_return_type = ret_ty;
        self.current_fn_name = name.to_string();
        self.push_scope();
        for p in params {
            let pty = self.resolve_type_expr(&p.type_expr, span);
            self.scope.define(Symbol::new(p.name.clone(), SymbolKind::Parameter, pty, 0));
        }
        let terminates = self.check_stmt(program, body);
        if ret_ty != TypeIndex::VOID && !terminates {
            self.sink.error(
                span,
                DiagnosticCode::E403,
                format!("function '{name}' is missing a return on some path"),
            );
        }
        self.pop_scope();
    }
}
