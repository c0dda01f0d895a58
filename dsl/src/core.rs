//! Common items useful for working with C-minus elements: the origin of
//! source text, positions within it and identifiers.
use core::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::{hash::Hash, hash::Hasher};

static EMPTY_FILE_ID: LazyLock<Arc<str>> = LazyLock::new(|| Arc::from(""));

/// FileId identifies the origin of source code.
///
/// FileId is normally useful in the context of source positions
/// where a source position is in a file.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FileId(Arc<str>);

impl FileId {
    /// Creates an empty file identifier.
    pub fn new() -> Self {
        FileId::default()
    }

    /// Creates a file identifier from the path.
    pub fn from_path(path: &Path) -> Self {
        FileId(Arc::from(path.to_string_lossy().as_ref()))
    }

    /// Creates a file identifier from the slice. The slice
    /// is normally the file path.
    pub fn from_string(path: &str) -> Self {
        FileId(Arc::from(path))
    }
}

impl Default for FileId {
    fn default() -> Self {
        FileId(EMPTY_FILE_ID.clone())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location in a file of a language element instance.
///
/// The location is defined by byte indices in the source file and the
/// line on which the element starts.
#[derive(Debug, Clone)]
pub struct SourceSpan {
    /// The position of the starting character (0-indexed).
    pub start: usize,
    /// The position one past the ending character (0-indexed).
    pub end: usize,
    /// The line of the starting character (1-indexed).
    pub line: usize,
    pub file_id: FileId,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self {
            start,
            end,
            line,
            file_id: FileId::default(),
        }
    }

    /// Creates a span that covers both spans. The line is the line of
    /// the start span.
    pub fn join(start: &SourceSpan, end: &SourceSpan) -> Self {
        Self {
            start: start.start,
            end: end.end,
            line: start.line,
            file_id: start.file_id.clone(),
        }
    }

    pub fn with_file_id(mut self, file_id: &FileId) -> Self {
        self.file_id = file_id.clone();
        self
    }
}

impl Default for SourceSpan {
    fn default() -> Self {
        SourceSpan::new(0, 0, 1)
    }
}

impl PartialEq for SourceSpan {
    fn eq(&self, _other: &Self) -> bool {
        // Comparing syntax trees should not depend on where the items were
        // written, so all spans compare equal.
        true
    }
}
impl Eq for SourceSpan {}

/// Defines an element that has a location in source code.
pub trait Located {
    /// Get the source code position of the object.
    fn span(&self) -> SourceSpan;
}

/// An identifier. Unlike keywords, identifiers are case sensitive.
#[derive(Clone)]
pub struct Id {
    pub name: String,
    pub span: SourceSpan,
}

impl Id {
    /// Converts a `&str` into an `Id` without a meaningful position.
    pub fn from(name: &str) -> Self {
        Id {
            name: String::from(name),
            span: SourceSpan::default(),
        }
    }

    pub fn with_position(mut self, span: SourceSpan) -> Self {
        self.span = span;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Located for Id {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}
