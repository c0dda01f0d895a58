//! Error types for code generation.

use std::io;

use thiserror::Error;

/// Errors that can occur during code generation.
///
/// The generator expects a program that passed analysis. Reaching a node
/// without its annotations is a `Contract` error rather than a diagnostic
/// about the source.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The sink rejected the generated text.
    #[error("unable to write assembly: {0}")]
    Io(#[from] io::Error),
    /// The program is missing an annotation that analysis provides.
    #[error("program was not analyzed: {0}")]
    Contract(String),
    /// A frame or the static area cannot be addressed with a 32-bit
    /// displacement.
    #[error("variables too large: {0}")]
    TooLarge(String),
}
