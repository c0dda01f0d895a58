//! The analyzer as individual stages (to enable testing).

use cminus_dsl::{ast::Program, core::FileId, diagnostic::Diagnostic};
use cminus_parser::parse_program;
use log::debug;

use crate::{xform_label_strings, xform_resolve_bindings, xform_resolve_types};

/// Analyze runs the semantic stages on a parsed program: name resolution,
/// then type checking, then string labeling.
///
/// Returns `Ok(Program)` with every annotation slot filled if analysis
/// succeeded.
/// Returns `Err(Diagnostic)` with the first problem found otherwise.
pub fn analyze(program: Program) -> Result<Program, Diagnostic> {
    let xforms: Vec<fn(Program) -> Result<Program, Diagnostic>> = vec![
        xform_resolve_bindings::apply,
        xform_resolve_types::apply,
        xform_label_strings::apply,
    ];

    let mut program = program;
    for xform in xforms {
        program = xform(program)?;
    }

    debug!(
        "Analyzed {} declarations and {} string literals",
        program.decls.len(),
        program.string_literals.len()
    );
    Ok(program)
}

/// Parses and analyzes the source text, producing a program that is ready
/// for code generation.
pub fn parse_and_analyze(source: &str, file_id: &FileId) -> Result<Program, Diagnostic> {
    analyze(parse_program(source, file_id)?)
}
