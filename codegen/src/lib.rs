//! Code generation for C-minus.
//!
//! This crate transforms an analyzed C-minus program (`Program`) into
//! x86-64 assembly text in AT&T syntax. The text links against the C
//! runtime, which provides `printf` for `write` and `writeln`.
//!
//! # Example
//!
//! ```ignore
//! use cminus_analyzer::stages::parse_and_analyze;
//! use cminus_codegen::generate;
//!
//! let source = "void main(void) { write(2 + 3 * 4); }";
//! let program = parse_and_analyze(source, &FileId::default()).unwrap();
//! let mut asm = vec![];
//! generate(&program, &mut asm).unwrap();
//! ```

mod compile;
mod emit;
mod error;

pub use compile::generate;
pub use error::CodegenError;
