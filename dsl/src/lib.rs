//! Provides definitions of objects from the C-minus language and the
//! diagnostics that every compilation stage reports.

pub mod ast;
pub mod core;
pub mod diagnostic;
pub mod types;
