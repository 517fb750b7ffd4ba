//! AST-to-IR lowering (spec §4.4): turns one checked function body into a
//! flat [`ir::Func`] with control flow already linearized into basic
//! blocks. Consumes the checker's [`crate::checker::TypeCache`] so every
//! expression's type is a cheap lookup instead of being re-inferred; every
//! type mentioned in a lowered body was already interned by the checker,
//! so the lowerer (like the SSA builder after it) only ever reads the
//! registry, never writes it.

mod control_flow;
mod expr;

use crate::ast::{self, Decl, NodeIndex, Program};
use crate::checker::{CheckOutput, TypeCache};
use crate::compilation::Compilation;
use crate::ir;
use crate::types::{FuncParam, Type, TypeIndex};
use std::collections::{HashMap, HashSet};

/// Lower every non-extern function body (plain functions and impl-block
/// methods, under their synthesized `Type_method` name) into IR. Top-level
/// `struct`/`enum`/`union`/`type`/`import` declarations have no body and
/// produce nothing here; a folded top-level `const` never needs a global
/// slot (its uses were inlined as literals by the checker) and an
/// unfolded one is a linker/codegen concern this middle end doesn't model.
pub fn lower_program(comp: &Compilation, program: &Program, checked: &CheckOutput) -> Vec<ir::Func> {
    let function_names = collect_function_names(program);
    let mut funcs = Vec::new();
    for &decl_idx in &program.decls {
        let Some(decl) = program.ast.as_decl(decl_idx) else { continue };
        match decl {
            Decl::FnDecl { name, params, return_type, body, is_extern } => {
                if *is_extern {
                    continue;
                }
                if let Some(body) = body {
                    funcs.push(
                        Lowerer::new(comp, &checked.cache, &checked.folded_constants, &function_names)
                            .lower_function(program, name, params, return_type, *body),
                    );
                }
            }
            Decl::ImplBlock { type_name, methods } => {
                for &method_idx in methods {
                    let Some(Decl::FnDecl { name, params, return_type, body, is_extern }) =
                        program.ast.as_decl(method_idx)
                    else {
                        continue;
                    };
                    if *is_extern {
                        continue;
                    }
                    if let Some(body) = body {
                        let synthesized = crate::types::TypeRegistry::synthesize_method_name(type_name, name);
                        funcs.push(
                            Lowerer::new(comp, &checked.cache, &checked.folded_constants, &function_names)
                                .lower_function(program, &synthesized, params, return_type, *body),
                        );
                    }
                }
            }
            _ => {}
        }
    }
    funcs
}

/// Every plain function and synthesized method name, gathered up front so
/// the lowerer can tell a bare function reference (`ir::Op::FuncAddr`) apart
/// from a global-variable load (`ir::Op::LoadGlobal`) without a symbol table.
fn collect_function_names(program: &Program) -> HashSet<String> {
    let mut names = HashSet::new();
    for &decl_idx in &program.decls {
        match program.ast.as_decl(decl_idx) {
            Some(Decl::FnDecl { name, is_extern: false, .. }) => {
                names.insert(name.clone());
            }
            Some(Decl::ImplBlock { type_name, methods }) => {
                for &method_idx in methods {
                    if let Some(Decl::FnDecl { name, is_extern: false, .. }) = program.ast.as_decl(method_idx) {
                        names.insert(crate::types::TypeRegistry::synthesize_method_name(type_name, name));
                    }
                }
            }
            _ => {}
        }
    }
    names
}

struct LoopCx {
    continue_block: ir::BlockId,
    break_block: ir::BlockId,
}

pub(crate) struct Lowerer<'a> {
    comp: &'a Compilation,
    cache: &'a TypeCache,
    folded_constants: &'a HashMap<String, i64>,
    function_names: &'a HashSet<String>,
    ir: ir::Func,
    current: ir::BlockId,
    scopes: Vec<HashMap<String, ir::LocalIndex>>,
    loop_stack: Vec<LoopCx>,
}

impl<'a> Lowerer<'a> {
    fn new(
        comp: &'a Compilation,
        cache: &'a TypeCache,
        folded_constants: &'a HashMap<String, i64>,
        function_names: &'a HashSet<String>,
    ) -> Self {
        Lowerer {
            comp,
            cache,
            folded_constants,
            function_names,
            ir: ir::Func::new(String::new(), TypeIndex::VOID),
            current: ir::BlockId(0),
            scopes: vec![HashMap::new()],
            loop_stack: Vec::new(),
        }
    }

    fn lower_function(
        mut self,
        program: &Program,
        name: &str,
        params: &[ast::Param],
        return_type: &Option<ast::TypeExprKind>,
        body: NodeIndex,
    ) -> ir::Func {
        let ret_ty = return_type.as_ref().and_then(|t| self.resolve_type(t)).unwrap_or(TypeIndex::VOID);
        self.ir = ir::Func::new(name.to_string(), ret_ty);
        self.current = ir::BlockId(0);
        for p in params {
            let ty = self.resolve_type(&p.type_expr).unwrap_or(TypeIndex::INVALID);
            let size = self.comp.types.size_of(ty);
            let local = self.ir.add_local(ir::Local {
                name: p.name.clone(),
                ty,
                size,
                is_param: true,
                is_mutable: true,
            });
            self.scopes.last_mut().unwrap().insert(p.name.clone(), local);
        }
        tracing::debug!(func = name, params = params.len(), "lower: lowering function body");
        self.lower_stmt(program, body);
        if !self.ir.is_terminated(self.current) {
            self.ir.terminate(self.current, ir::Terminator::Ret(None));
        }
        self.ir
    }

    // ---------------------------------------------------------------
    // Local/scope management
    // ---------------------------------------------------------------

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare_local(&mut self, name: &str, ty: TypeIndex, is_mutable: bool) -> ir::LocalIndex {
        let size = self.comp.types.size_of(ty);
        let local = self.ir.add_local(ir::Local {
            name: name.to_string(),
            ty,
            size,
            is_param: false,
            is_mutable,
        });
        self.scopes.last_mut().unwrap().insert(name.to_string(), local);
        local
    }

    fn lookup_local(&self, name: &str) -> Option<ir::LocalIndex> {
        self.scopes.iter().rev().find_map(|s| s.get(name)).copied()
    }

    fn node_type(&self, node: NodeIndex) -> TypeIndex {
        self.cache.get(node).unwrap_or(TypeIndex::INVALID)
    }

    fn emit(&mut self, op: ir::Op, ty: TypeIndex) -> NodeIndex {
        self.ir.emit(self.current, op, ty)
    }

    /// Re-derive a type expression's interned index. Every shape here was
    /// already built once by the checker (spec §4.3 resolves every
    /// `type_expr` before a body can be checked), so this only ever looks
    /// an existing entry up; it never needs to mutate the registry.
    fn resolve_type(&self, te: &ast::TypeExprKind) -> Option<TypeIndex> {
        use ast::TypeExprKind::*;
        match te {
            Named(name) => self.comp.types.lookup_by_name(name),
            Pointer(elem) => {
                let elem = self.resolve_type(elem)?;
                self.comp.types.find(&Type::Pointer { elem })
            }
            Optional(elem) | ErrorUnion(elem) => {
                let elem = self.resolve_type(elem)?;
                self.comp.types.find(&Type::Optional { elem })
            }
            Slice(elem) => {
                let elem = self.resolve_type(elem)?;
                self.comp.types.find(&Type::Slice { elem })
            }
            Array { size, elem } => {
                let elem = self.resolve_type(elem)?;
                self.comp.types.find(&Type::Array { elem, length: *size })
            }
            Map { key, value } => {
                let key = self.resolve_type(key)?;
                let value = self.resolve_type(value)?;
                self.comp.types.find(&Type::Map { key, value })
            }
            List(elem) => {
                let elem = self.resolve_type(elem)?;
                self.comp.types.find(&Type::List { elem })
            }
            Function { params, ret } => {
                let param_tys: Option<Vec<TypeIndex>> = params.iter().map(|p| self.resolve_type(p)).collect();
                let param_tys = param_tys?;
                let return_type = match ret {
                    Some(r) => self.resolve_type(r)?,
                    None => TypeIndex::VOID,
                };
                let params = param_tys.into_iter().map(|ty| FuncParam { name: String::new(), ty }).collect();
                self.comp.types.find(&Type::Func { params, return_type })
            }
        }
    }
}
