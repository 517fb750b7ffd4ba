//! Error reporter interface consumed by the checker/lowerer/SSA builder
//! (spec §6.2, §7), modeled on the teacher's `LintDiagnostic`/`Severity`
//! pattern in `lint.rs` but extended with spec.md's categorized code ranges.
//!
//! The reporter is best-effort: `record` never panics and never aborts the
//! caller. Checking continues past individual errors with `invalid_type`
//! propagating through subsequent operations (spec §7).

use crate::ast::Span;
use std::fmt;

/// Numeric diagnostic codes, organized by the ranges spec §6.2/§7 define.
/// Type errors (3xx) are this crate's main range; semantic errors (4xx)
/// cover control-flow misuse; 5xx is this crate's own extension for the
/// SSA-construction-only failures spec §7's taxonomy names but §6.2 doesn't
/// assign a surface code to (`unresolved-forward-ref`, `unreachable-predecessor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// Generic type mismatch or invalid operation.
    E300,
    /// Undefined identifier.
    E301,
    /// Redefined identifier.
    E302,
    /// Invalid unary operand.
    E303,
    /// Wrong argument count.
    E304,
    /// Callee is not callable.
    E305,
    /// Field not found.
    E306,
    /// `break` outside a loop.
    E400,
    /// `continue` outside a loop.
    E401,
    /// Return type mismatch.
    E402,
    /// Missing return in a non-void function.
    E403,
    /// SSA verification: a `fwd_ref` survived construction.
    E500,
    /// SSA verification: a φ read an unreachable predecessor.
    E501,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::E300 => "E300",
            DiagnosticCode::E301 => "E301",
            DiagnosticCode::E302 => "E302",
            DiagnosticCode::E303 => "E303",
            DiagnosticCode::E304 => "E304",
            DiagnosticCode::E305 => "E305",
            DiagnosticCode::E306 => "E306",
            DiagnosticCode::E400 => "E400",
            DiagnosticCode::E401 => "E401",
            DiagnosticCode::E402 => "E402",
            DiagnosticCode::E403 => "E403",
            DiagnosticCode::E500 => "E500",
            DiagnosticCode::E501 => "E501",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub pos: Span,
    pub code: DiagnosticCode,
    pub message: String,
}

impl Diagnostic {
    pub fn new(pos: Span, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            pos,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 0-indexed line/column in storage, 1-indexed for humans (teacher:
        // `SourceLocation`'s `Display` impl in `ast.rs`).
        write!(
            f,
            "{}:{}: {}: {}",
            self.pos.line + 1,
            self.pos.column + 1,
            self.code.as_str(),
            self.message
        )
    }
}

/// The fixed external "error reporter" collaborator (spec §6.2). Recording
/// an error never raises; the sink only accumulates.
pub trait DiagnosticSink {
    fn record(&mut self, diag: Diagnostic);

    fn error(&mut self, pos: Span, code: DiagnosticCode, message: impl Into<String>) {
        self.record(Diagnostic::new(pos, code, message));
    }
}

/// Default `Vec`-backed sink used by the checker/lowerer/SSA builder's own
/// tests and by the `middlec` CLI.
#[derive(Debug, Default)]
pub struct VecDiagnosticSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl VecDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for VecDiagnosticSink {
    fn record(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_accumulates_without_raising() {
        let mut sink = VecDiagnosticSink::new();
        sink.error(Span::default(), DiagnosticCode::E301, "undefined identifier 'x'");
        sink.error(Span::default(), DiagnosticCode::E302, "redefined identifier 'x'");
        assert_eq!(sink.len(), 2);
        assert!(sink.has_errors());
    }

    #[test]
    fn display_uses_one_indexed_position() {
        let diag = Diagnostic::new(
            Span { line: 4, column: 7, length: 1 },
            DiagnosticCode::E301,
            "undefined identifier 'x'",
        );
        assert_eq!(diag.to_string(), "5:8: E301: undefined identifier 'x'");
    }
}
