//! Fatal compiler errors
//!
//! These are caller contract violations, not document defects. Problems in the document
//! itself are reported as [`Diagnostic`](super::Diagnostic)s.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// `compile` was called without a macro registry
    MissingRegistry,
    /// The registry lacks a macro the compiler synthesizes itself
    MissingMacro(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::MissingRegistry => write!(f, "no macro registry was supplied"),
            CompileError::MissingMacro(name) => {
                write!(f, "macro registry does not define required macro '{}'", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}
