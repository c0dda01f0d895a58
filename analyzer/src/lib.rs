// Allow large errors because this is a compiler - we expect large errors.
#![allow(clippy::result_large_err)]

//! Semantic analysis for C-minus.
//!
//! Analysis is a sequence of transforms over the syntax tree. Each
//! transform takes the program, annotates it in place and returns it, or
//! stops at the first problem.

mod symbol_table;
pub mod stages;
pub mod xform_label_strings;
pub mod xform_resolve_bindings;
pub mod xform_resolve_types;

#[cfg(test)]
mod test_helpers;
