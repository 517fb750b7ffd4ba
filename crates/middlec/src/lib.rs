//! Middle end of the Quill compiler: type checker, AST-to-IR lowerer, and
//! SSA builder (spec §1). Scanning/parsing, error formatting with source
//! excerpts, codegen, and object-file emission live outside this crate;
//! `middlec` (see `main.rs`) only drives the three stages below and dumps
//! their output.

pub mod ast;
pub mod checker;
pub mod compilation;
pub mod config;
pub mod diagnostics;
pub mod ir;
pub mod lower;
pub mod scope;
pub mod ssa;
pub mod types;

pub use checker::{CheckOutput, Checker, TypeCache};
pub use compilation::Compilation;
pub use config::CheckerConfig;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, VecDiagnosticSink};
pub use lower::lower_program;
