// Allow large errors because this is a compiler - we expect large errors.
#![allow(clippy::result_large_err)]

mod lexer;
mod parser;
pub mod token;

#[cfg(test)]
mod tests;

use cminus_dsl::{ast::Program, core::FileId, diagnostic::Diagnostic};
use log::debug;

pub use crate::lexer::Lexer;
pub use crate::parser::Parser;
use token::Token;

/// Tokenize a C-minus program.
///
/// Returns the tokens through the end of file marker, or the first
/// lexical error.
pub fn tokenize_program(source: &str, file_id: &FileId) -> Result<Vec<Token>, Diagnostic> {
    lexer::tokenize(source, file_id)
}

/// Parse a full C-minus program.
pub fn parse_program(source: &str, file_id: &FileId) -> Result<Program, Diagnostic> {
    debug!("Parsing {}", file_id);
    Parser::new(Lexer::new(source, file_id))?.parse()
}
