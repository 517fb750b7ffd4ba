//! End-to-end pipeline tests: build a small program by hand with
//! [`AstBuilder`] (mirroring the teacher's hand-built fixtures, since
//! scanning/parsing is out of scope here), run it through `Checker` ->
//! `lower_program` -> `ssa::build`, and assert on externally observable
//! shape rather than internal IR details.

use quillc_middle::ast::{
    AssignOp, AstBuilder, BinaryOp, Decl, Expr, LiteralValue, Param, Program, Stmt, TypeExprKind,
};
use quillc_middle::diagnostics::VecDiagnosticSink;
use quillc_middle::{CheckerConfig, Checker, Compilation};

fn compile(b: AstBuilder, decls: Vec<quillc_middle::ast::NodeIndex>) -> (Vec<quillc_middle::ssa::Func>, VecDiagnosticSink) {
    let program = Program { ast: b.ast, decls };
    let mut comp = Compilation::new(CheckerConfig::default());
    let mut sink = VecDiagnosticSink::new();
    let checked = Checker::new(&mut comp, &mut sink).check_program(&program);
    assert!(!sink.has_errors(), "unexpected checker errors: {:?}", sink.diagnostics);
    let funcs = quillc_middle::lower_program(&comp, &program, &checked);
    let mut ssa_funcs = Vec::new();
    for f in &funcs {
        ssa_funcs.push(quillc_middle::ssa::build(&comp, &mut sink, f));
    }
    (ssa_funcs, sink)
}

#[test]
fn straight_line_function_returns_sum() {
    // fn add(a: i64, b: i64) -> i64 { return a + b; }
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let bb = b.ident("b");
    let sum = b.binary(BinaryOp::Add, a, bb);
    let ret = b.ret(Some(sum));
    let body = b.block(vec![ret]);
    let params = vec![
        Param { name: "a".to_string(), type_expr: TypeExprKind::Named("i64".to_string()), default_value: None },
        Param { name: "b".to_string(), type_expr: TypeExprKind::Named("i64".to_string()), default_value: None },
    ];
    let decl = b.fn_decl("add", params, Some(TypeExprKind::Named("i64".to_string())), body);

    let (funcs, sink) = compile(b, vec![decl]);
    assert!(sink.is_empty());
    assert_eq!(funcs.len(), 1);
    assert_eq!(funcs[0].name, "add");
    assert!(funcs[0].blocks.iter().any(|blk| !blk.controls.is_empty() || blk.kind == quillc_middle::ssa::BlockKind::Ret));
}

#[test]
fn if_else_both_branches_return_merge_is_unreachable() {
    // fn pick(cond: bool) -> i64 { if cond { return 1; } else { return 2; } }
    let mut b = AstBuilder::new();
    let cond = b.ident("cond");
    let one = b.int_lit(1);
    let two = b.int_lit(2);
    let then_ret = b.ret(Some(one));
    let then_block = b.block(vec![then_ret]);
    let else_ret = b.ret(Some(two));
    let else_block = b.block(vec![else_ret]);
    let if_stmt = b.push_stmt(Stmt::If { cond, then_block, else_block: Some(else_block) });
    let body = b.block(vec![if_stmt]);
    let params = vec![Param { name: "cond".to_string(), type_expr: TypeExprKind::Named("bool".to_string()), default_value: None }];
    let decl = b.fn_decl("pick", params, Some(TypeExprKind::Named("i64".to_string())), body);

    let (funcs, sink) = compile(b, vec![decl]);
    assert!(sink.is_empty());
    let merges_with_no_predecessors = funcs[0]
        .blocks
        .iter()
        .filter(|blk| blk.predecessors.is_empty() && blk.id.0 != 0)
        .count();
    assert_eq!(merges_with_no_predecessors, 1, "if.merge after two terminating arms should be unreachable");
}

#[test]
fn while_loop_counts_to_zero() {
    // fn count(n: i64) -> i64 {
    //   while n > 0 { n = n - 1; }
    //   return n;
    // }
    let mut b = AstBuilder::new();
    let n_cond = b.ident("n");
    let zero = b.int_lit(0);
    let cond = b.binary(BinaryOp::Gt, n_cond, zero);
    let n_target = b.ident("n");
    let n_rhs = b.ident("n");
    let one = b.int_lit(1);
    let sub = b.binary(BinaryOp::Sub, n_rhs, one);
    let assign = b.push_stmt(Stmt::Assign { target: n_target, op: AssignOp::Assign, value: sub });
    let while_body = b.block(vec![assign]);
    let while_stmt = b.push_stmt(Stmt::While { cond, body: while_body });
    let n_ret = b.ident("n");
    let ret = b.ret(Some(n_ret));
    let body = b.block(vec![while_stmt, ret]);
    let params = vec![Param { name: "n".to_string(), type_expr: TypeExprKind::Named("i64".to_string()), default_value: None }];
    let decl = b.fn_decl("count", params, Some(TypeExprKind::Named("i64".to_string())), body);

    let (funcs, sink) = compile(b, vec![decl]);
    assert!(sink.is_empty());
    assert!(funcs[0].blocks.len() >= 4, "while desugars into header/body/exit at minimum");
}

#[test]
fn short_circuit_and_does_not_always_evaluate_rhs() {
    // fn both(a: bool, b: bool) -> bool { return a && b; }
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let bb = b.ident("b");
    let and = b.binary(BinaryOp::And, a, bb);
    let ret = b.ret(Some(and));
    let body = b.block(vec![ret]);
    let params = vec![
        Param { name: "a".to_string(), type_expr: TypeExprKind::Named("bool".to_string()), default_value: None },
        Param { name: "b".to_string(), type_expr: TypeExprKind::Named("bool".to_string()), default_value: None },
    ];
    let decl = b.fn_decl("both", params, Some(TypeExprKind::Named("bool".to_string())), body);

    let (funcs, sink) = compile(b, vec![decl]);
    assert!(sink.is_empty());
    // `&&` desugars to real control flow, so more than one block is expected
    // even though the source is a single expression.
    assert!(funcs[0].blocks.len() > 1);
}

#[test]
fn struct_field_access_round_trips() {
    // struct Point { x: i64, y: i64 }
    // fn get_x(p: Point) -> i64 { return p.x; }
    let mut b = AstBuilder::new();
    let struct_decl = b.push_decl(Decl::StructDecl {
        name: "Point".to_string(),
        fields: vec![
            quillc_middle::ast::StructFieldSyntax { name: "x".to_string(), type_expr: TypeExprKind::Named("i64".to_string()) },
            quillc_middle::ast::StructFieldSyntax { name: "y".to_string(), type_expr: TypeExprKind::Named("i64".to_string()) },
        ],
    });
    let p = b.ident("p");
    let field = b.push_expr(Expr::FieldAccess { base: Some(p), field: "x".to_string() });
    let ret = b.ret(Some(field));
    let body = b.block(vec![ret]);
    let params = vec![Param { name: "p".to_string(), type_expr: TypeExprKind::Named("Point".to_string()), default_value: None }];
    let fn_decl = b.fn_decl("get_x", params, Some(TypeExprKind::Named("i64".to_string())), body);

    let (funcs, sink) = compile(b, vec![struct_decl, fn_decl]);
    assert!(sink.is_empty());
    assert_eq!(funcs.len(), 1);
    assert_eq!(funcs[0].name, "get_x");
}

#[test]
fn method_call_passes_receiver_as_implicit_first_argument() {
    // struct Counter { value: i64 }
    // impl Counter { fn get(self: Counter) -> i64 { return self.value; } }
    // fn read(c: Counter) -> i64 { return c.get(); }
    let mut b = AstBuilder::new();
    let struct_decl = b.push_decl(Decl::StructDecl {
        name: "Counter".to_string(),
        fields: vec![quillc_middle::ast::StructFieldSyntax {
            name: "value".to_string(),
            type_expr: TypeExprKind::Named("i64".to_string()),
        }],
    });
    let self_ident = b.ident("self");
    let field = b.push_expr(Expr::FieldAccess { base: Some(self_ident), field: "value".to_string() });
    let method_ret = b.ret(Some(field));
    let method_body = b.block(vec![method_ret]);
    let method_params = vec![Param { name: "self".to_string(), type_expr: TypeExprKind::Named("Counter".to_string()), default_value: None }];
    let method = b.fn_decl("get", method_params, Some(TypeExprKind::Named("i64".to_string())), method_body);
    let impl_block = b.push_decl(Decl::ImplBlock { type_name: "Counter".to_string(), methods: vec![method] });

    let c = b.ident("c");
    let callee = b.push_expr(Expr::FieldAccess { base: Some(c), field: "get".to_string() });
    let call = b.push_expr(Expr::Call { callee, args: vec![] });
    let ret = b.ret(Some(call));
    let body = b.block(vec![ret]);
    let params = vec![Param { name: "c".to_string(), type_expr: TypeExprKind::Named("Counter".to_string()), default_value: None }];
    let read_decl = b.fn_decl("read", params, Some(TypeExprKind::Named("i64".to_string())), body);

    let (funcs, sink) = compile(b, vec![struct_decl, impl_block, read_decl]);
    assert!(sink.is_empty());
    // One function for the method (synthesized `Counter_get`), one for `read`.
    assert!(funcs.iter().any(|f| f.name == "Counter_get"));
    assert!(funcs.iter().any(|f| f.name == "read"));
}

#[test]
fn array_literal_and_len_builtin() {
    // fn total() -> i64 {
    //   var xs: [3]i64 = [1, 2, 3];
    //   return len(xs);
    // }
    let mut b = AstBuilder::new();
    let one = b.int_lit(1);
    let two = b.int_lit(2);
    let three = b.int_lit(3);
    let arr = b.push_expr(Expr::ArrayLiteral { elements: vec![one, two, three] });
    let var_stmt = b.push_stmt(Stmt::Var {
        name: "xs".to_string(),
        type_expr: Some(TypeExprKind::Array { size: 3, elem: Box::new(TypeExprKind::Named("i64".to_string())) }),
        value: Some(arr),
        is_const: false,
    });
    let xs = b.ident("xs");
    let len_call = b.push_expr(Expr::LenCall { arg: xs });
    let ret = b.ret(Some(len_call));
    let body = b.block(vec![var_stmt, ret]);
    let decl = b.fn_decl("total", vec![], Some(TypeExprKind::Named("i64".to_string())), body);

    let (funcs, sink) = compile(b, vec![decl]);
    assert!(sink.is_empty());
    assert_eq!(funcs.len(), 1);
}

#[test]
fn missing_return_on_some_path_is_an_error() {
    // fn bad(cond: bool) -> i64 { if cond { return 1; } }
    let mut b = AstBuilder::new();
    let cond = b.ident("cond");
    let one = b.int_lit(1);
    let then_ret = b.ret(Some(one));
    let then_block = b.block(vec![then_ret]);
    let if_stmt = b.push_stmt(Stmt::If { cond, then_block, else_block: None });
    let body = b.block(vec![if_stmt]);
    let params = vec![Param { name: "cond".to_string(), type_expr: TypeExprKind::Named("bool".to_string()), default_value: None }];
    let decl = b.fn_decl("bad", params, Some(TypeExprKind::Named("i64".to_string())), body);

    let program = Program { ast: b.ast, decls: vec![decl] };
    let mut comp = Compilation::new(CheckerConfig::default());
    let mut sink = VecDiagnosticSink::new();
    Checker::new(&mut comp, &mut sink).check_program(&program);
    assert!(sink.has_errors());
    assert!(sink.diagnostics.iter().any(|d| d.code == quillc_middle::DiagnosticCode::E403));
}
