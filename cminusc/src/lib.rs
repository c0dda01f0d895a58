//! Command line front end for the C-minus compiler.
//!
//! The binary is a thin wrapper over the functions in [`cli`] so that the
//! behavior can be tested without spawning a process.

// Allow large errors because this is a compiler - we expect large errors.
#![allow(clippy::result_large_err)]

pub mod cli;
pub mod logger;
mod source;
