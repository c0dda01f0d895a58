//! Provides definition for diagnostics, which are the errors associated
//! with compilation.
//!
//! Every stage of the compiler stops at the first problem it finds and
//! returns a single diagnostic. Rendering the diagnostic against the source
//! text is left to the front end.

use std::fmt;

use cminus_problems::{Category, Problem};

use crate::core::{FileId, Id, Located, SourceSpan};

/// A label that refers to some range in a file and is associated with a
/// message related to that range.
///
/// Normally this indicates the location of an error along with a text
/// message describing that position.
#[derive(Debug, Clone)]
pub struct Label {
    /// The position of label.
    pub span: SourceSpan,

    /// A message describing this label.
    pub message: String,
}

impl Label {
    pub fn span(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    pub fn located(item: &dyn Located, message: impl Into<String>) -> Self {
        Label::span(item.span(), message)
    }

    /// A "position" that is a file in it's entirety rather that a
    /// particular line.
    pub fn file(file_id: &FileId, message: impl Into<String>) -> Self {
        Self {
            span: SourceSpan::new(0, 0, 0).with_file_id(file_id),
            message: message.into(),
        }
    }
}

/// A diagnostic. Diagnostic have a problem that is indicative of the
/// category, a primary location and possibly non-zero set of secondary
/// locations.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub problem: Problem,

    /// The primary or first diagnostic.
    pub primary: Label,

    /// Additional descriptions to the constant description.
    pub described: Vec<String>,

    /// Additional information about the diagnostic.
    pub secondary: Vec<Label>,
}

impl Diagnostic {
    /// Creates a diagnostic from the problem code and with the specified label.
    pub fn problem(problem: Problem, primary: Label) -> Self {
        Self {
            problem,
            primary,
            described: vec![],
            secondary: vec![],
        }
    }

    /// Adds to the problem description additional context about the
    /// problem that is not related to a position in a source file.
    pub fn with_context(mut self, description: &str, item: &str) -> Self {
        self.described.push(format!("{}={}", description, item));
        self
    }

    pub fn with_context_id(mut self, description: &str, item: &Id) -> Self {
        self.described.push(format!("{}={}", description, item));
        self
    }

    pub fn with_secondary(mut self, label: Label) -> Self {
        self.secondary.push(label);
        self
    }

    pub fn code(&self) -> &'static str {
        self.problem.code()
    }

    pub fn category(&self) -> Category {
        self.problem.category()
    }

    /// The message specific to this instance of the problem.
    pub fn message(&self) -> &str {
        &self.primary.message
    }

    /// The line (1-indexed) where the problem starts.
    pub fn line(&self) -> usize {
        self.primary.span.line
    }

    /// Returns the description for the diagnostic. This may add in other
    /// data in addition that is part of the diagnostic.
    pub fn description(&self) -> String {
        if self.described.is_empty() {
            self.problem.message().to_string()
        } else {
            format!("{} ({})", self.problem.message(), self.described.join(", "))
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} error {}: {}",
            self.primary.span.file_id,
            self.line(),
            self.category(),
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for Diagnostic {}
