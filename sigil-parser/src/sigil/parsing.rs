//! Parsing module for the sigil markup
//!
//!     Turns the flat token stream into the arena AST. The parser is a single recursive
//!     descent over a token index: every macro name token starts a `parse_macro` call that
//!     consumes the argument start/end pairs following it. There is no backtracking and no
//!     lookahead beyond the next token.
//!
//!     The parser validates argument names against the [`MacroRegistry`] and fills every
//!     declared argument the author did not write with an empty plaintext node, so later
//!     stages can rely on every declared argument being present.
//!
//!     Problems never abort parsing. Unknown macros become `Error` nodes, everything else is
//!     reported as a [`Diagnostic`] and the parser carries on with the next token.
//!
//! Terminology
//!
//!     - parse: tokens to raw AST only. Post-processing lives in
//!       [assembling](crate::sigil::assembling).
//!     - compile: the whole pipeline, see [pipeline](crate::sigil::pipeline).

pub mod parser;

pub use parser::{parse, ParseOutput, Parser};

pub use crate::sigil::ast::{Ast, Diagnostic, NodeId};
pub use crate::sigil::registry::MacroRegistry;
