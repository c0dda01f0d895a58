//! Semantic types of expressions.
//!
//! Types are names. Base types are the declared type specifiers and
//! derived types prefix a qualifier to another type name, for example
//! `pointer_int` or `array_string`.
use std::fmt;

const POINTER_PREFIX: &str = "pointer_";
const ARRAY_PREFIX: &str = "array_";

/// A type specifier written in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Void,
    String,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Int => "int",
            BaseType::Void => "void",
            BaseType::String => "string",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type derived for an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type(String);

impl Type {
    pub fn base(base: BaseType) -> Self {
        Type(base.as_str().to_string())
    }

    pub fn int() -> Self {
        Type::base(BaseType::Int)
    }

    pub fn string() -> Self {
        Type::base(BaseType::String)
    }

    pub fn void() -> Self {
        Type::base(BaseType::Void)
    }

    /// Returns the type of a pointer to this type.
    pub fn pointer_to(&self) -> Self {
        Type(format!("{POINTER_PREFIX}{}", self.0))
    }

    /// Returns the type of an array with elements of this type.
    pub fn array_of(&self) -> Self {
        Type(format!("{ARRAY_PREFIX}{}", self.0))
    }

    /// Returns the type that this pointer type points to, or `None`
    /// if this is not a pointer type.
    pub fn pointee(&self) -> Option<Type> {
        self.0.strip_prefix(POINTER_PREFIX).map(|t| Type(t.to_string()))
    }

    /// Returns the element type of this array type, or `None` if this is
    /// not an array type.
    pub fn element(&self) -> Option<Type> {
        self.0.strip_prefix(ARRAY_PREFIX).map(|t| Type(t.to_string()))
    }

    pub fn is_int(&self) -> bool {
        self.0 == BaseType::Int.as_str()
    }

    pub fn is_string(&self) -> bool {
        self.0 == BaseType::String.as_str()
    }

    pub fn is_void(&self) -> bool {
        self.0 == BaseType::Void.as_str()
    }

    pub fn is_pointer(&self) -> bool {
        self.0.starts_with(POINTER_PREFIX)
    }

    pub fn is_array(&self) -> bool {
        self.0.starts_with(ARRAY_PREFIX)
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
