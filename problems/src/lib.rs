//! Problem codes for the C-minus compiler.
//!
//! The set of problems is defined in `resources/problem-codes.csv` and
//! turned into the `Problem` enumeration by the build script.
use std::fmt;

/// The family of a problem. Each family corresponds to the stage of the
/// compiler that detects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Lexical,
    Syntax,
    Resolution,
    Type,
    Io,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Lexical => "lexical",
            Category::Syntax => "syntax",
            Category::Resolution => "resolution",
            Category::Type => "type",
            Category::Io => "io",
        };
        f.write_str(name)
    }
}

include!(concat!(env!("OUT_DIR"), "/problems.rs"));
