//! Abstract syntax tree
//!
//!     The AST is stored in an arena ([`Ast`]) and nodes refer to each other by [`NodeId`].
//!     Children are owned by their parent's argument lists; every node keeps a non-owning
//!     parent index so ancestor queries do not need reference counting.
//!
//!     The parser only builds the shape of the tree. The assembling stage then attaches
//!     identifiers, counts and header tree links exactly once.

pub mod diagnostics;
pub mod error;
pub mod node;
pub mod range;
pub mod treeviz;

pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity};
pub use error::CompileError;
pub use node::{Argument, Ast, AstNode, MacroNode, NodeId, NodeKind};
pub use range::{Position, SourceLocation};
pub use treeviz::to_treeviz_str;
