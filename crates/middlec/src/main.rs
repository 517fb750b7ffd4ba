//! `middlec` CLI: drives the three middle-end stages (spec §1) over an
//! externally produced AST and dumps their output. There is no scanner or
//! parser in this crate, so the input is already-parsed JSON (spec §3.3)
//! rather than `.quill` source text.

use clap::Parser as ClapParser;
use quillc_middle::ast::Program;
use quillc_middle::diagnostics::{DiagnosticSink, VecDiagnosticSink};
use quillc_middle::{CheckerConfig, Checker, Compilation};
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "middlec")]
#[command(about = "Quill compiler middle end - type-check, lower, and build SSA for a parsed program", long_about = None)]
struct Cli {
    /// Input JSON-encoded AST (`ast::Program`)
    input: PathBuf,

    /// Print the lowered IR for each function in addition to its SSA form
    #[arg(long)]
    dump_ir: bool,

    /// Run the checker only; skip lowering and SSA construction
    #[arg(long)]
    check_only: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let text = match std::fs::read_to_string(&cli.input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: could not read '{}': {e}", cli.input.display());
            process::exit(1);
        }
    };
    let program: Program = match serde_json::from_str(&text) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: invalid AST JSON in '{}': {e}", cli.input.display());
            process::exit(1);
        }
    };

    process::exit(run(&program, cli.dump_ir, cli.check_only));
}

fn run(program: &Program, dump_ir: bool, check_only: bool) -> i32 {
    let mut comp = Compilation::new(CheckerConfig::default());
    let mut sink = VecDiagnosticSink::new();

    let checked = Checker::new(&mut comp, &mut sink).check_program(program);
    if sink.has_errors() {
        for diag in &sink.diagnostics {
            eprintln!("{diag}");
        }
        return 1;
    }
    if check_only {
        println!("ok: no type errors");
        return 0;
    }

    let funcs = quillc_middle::lower_program(&comp, program, &checked);
    for func in &funcs {
        if dump_ir {
            println!("--- ir {} ---", func.name);
            dump_ir_func(func);
        }
        let ssa = quillc_middle::ssa::build(&comp, &mut sink, func);
        println!("--- ssa {} ---", ssa.name);
        dump_ssa_func(&ssa);
    }

    if sink.has_errors() {
        for diag in &sink.diagnostics {
            eprintln!("{diag}");
        }
        return 1;
    }
    0
}

fn dump_ir_func(func: &quillc_middle::ir::Func) {
    for (i, block) in func.blocks.iter().enumerate() {
        println!("  block{i} ({}):", block.label);
        for &n in &block.nodes {
            let node = func.node(n);
            println!("    %{} = {:?} : {:?}", n.0, node.op, node.ty);
        }
        println!("    {:?}", block.terminator);
    }
}

fn dump_ssa_func(func: &quillc_middle::ssa::Func) {
    for block in &func.blocks {
        println!("  b{} ({:?}):", block.id.0, block.kind);
        for &id in &block.values {
            let v = func.value(id);
            println!("    v{} = {:?} {:?} : {:?}", id.0, v.op, v.args, v.ty);
        }
    }
}
