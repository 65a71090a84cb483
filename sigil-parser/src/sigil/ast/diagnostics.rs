//! Diagnostic collection
//!
//! Document defects never abort a compilation. Every stage pushes a [`Diagnostic`] and
//! keeps going, and the renderer puts a visible marker at the error site instead of the
//! broken construct.
//!
//! ## Categories
//!
//! 1. **Lexical**: unterminated literal arguments, runs of blank lines
//! 2. **Syntactic**: unknown macros, bad argument names, mismatched closers
//! 3. **Semantic**: duplicate ids, header level problems, unresolved references

use super::range::Position;
use serde::Serialize;
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// Which compiler stage found the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Lexical,
    Syntactic,
    Semantic,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Lexical => write!(f, "lexical"),
            DiagnosticCategory::Syntactic => write!(f, "syntactic"),
            DiagnosticCategory::Semantic => write!(f, "semantic"),
        }
    }
}

/// A located compiler message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub position: Position,
    pub severity: DiagnosticSeverity,
    pub category: DiagnosticCategory,
    pub code: Option<String>,
    /// Document the diagnostic belongs to, empty for anonymous input
    pub document: String,
}

impl Diagnostic {
    pub fn new(
        category: DiagnosticCategory,
        position: Position,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            position,
            severity: DiagnosticSeverity::Error,
            category,
            code: None,
            document: String::new(),
        }
    }

    pub fn lexical(position: Position, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Lexical, position, message)
    }

    pub fn syntactic(position: Position, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Syntactic, position, message)
    }

    pub fn semantic(position: Position, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Semantic, position, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.severity = DiagnosticSeverity::Warning;
        self
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.document.is_empty() {
            write!(f, "{}:", self.document)?;
        }
        write!(
            f,
            "{}: {} {}: {}",
            self.position, self.category, self.severity, self.message
        )
    }
}
