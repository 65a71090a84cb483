//! Lexer
//!
//!     This module turns a sigil document into the flat token stream the parser walks.
//!
//! The Lexing Pipeline
//!
//!     1. Raw lexemes from the logos lexer. See [raw](raw). These are context free: an
//!        escape, a macro name, a run of opening brackets, a single closing bracket, a
//!        newline run or a text run.
//!
//!     2. The stateful [tokenizer](tokenizer). It groups text lexemes into plaintext tokens,
//!        reads named argument names, and takes over from logos for literal arguments,
//!        whose content is scanned verbatim until the matching closing run.
//!
//! Implicit Toplevel
//!
//!     The token stream always starts with a `toplevel` macro name and a positional
//!     argument start, and always ends with the matching end token. The parser therefore
//!     sees a whole document as the content argument of one macro.

pub mod raw;
pub mod tokenizer;

pub use tokenizer::{tokenize, LexerOutput, Tokenizer};

/// Name of the implicit macro wrapping every document
pub const TOPLEVEL_MACRO: &str = "toplevel";

/// The escape character
pub const ESCAPE_CHAR: char = '\\';

/// Characters that can be escaped to appear as plaintext
pub fn is_escapable(ch: char) -> bool {
    matches!(ch, '\\' | '[' | ']' | '{' | '}')
}

/// Characters allowed in macro and named argument names
pub fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
