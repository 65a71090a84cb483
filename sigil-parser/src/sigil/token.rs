//! Token types shared by the tokenizer and the parser.
//!
//!     The tokenizer produces a flat sequence of [`Token`]s. Argument nesting is expressed by
//!     start/end token pairs, much like braces in c-style languages, so the parser can walk
//!     the sequence with a single index and never backtrack.
//!
//!     Literal arguments never produce nested tokens: their whole content arrives as one
//!     plaintext token between the start and end tokens.

use super::ast::Position;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Plaintext,
    MacroName,
    ParagraphBreak,
    PositionalArgumentStart,
    PositionalArgumentEnd,
    NamedArgumentStart,
    NamedArgumentEnd,
    NamedArgumentName,
}

impl TokenKind {
    pub fn is_argument_start(self) -> bool {
        matches!(
            self,
            TokenKind::PositionalArgumentStart | TokenKind::NamedArgumentStart
        )
    }

    pub fn is_argument_end(self) -> bool {
        matches!(
            self,
            TokenKind::PositionalArgumentEnd | TokenKind::NamedArgumentEnd
        )
    }

    /// The end kind that closes an argument opened by `self`
    pub fn closer(self) -> Option<TokenKind> {
        match self {
            TokenKind::PositionalArgumentStart => Some(TokenKind::PositionalArgumentEnd),
            TokenKind::NamedArgumentStart => Some(TokenKind::NamedArgumentEnd),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Plaintext => "PLAINTEXT",
            TokenKind::MacroName => "MACRO_NAME",
            TokenKind::ParagraphBreak => "PARAGRAPH",
            TokenKind::PositionalArgumentStart => "POSITIONAL_ARGUMENT_START",
            TokenKind::PositionalArgumentEnd => "POSITIONAL_ARGUMENT_END",
            TokenKind::NamedArgumentStart => "NAMED_ARGUMENT_START",
            TokenKind::NamedArgumentEnd => "NAMED_ARGUMENT_END",
            TokenKind::NamedArgumentName => "NAMED_ARGUMENT_NAME",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self {
            kind,
            position,
            value: None,
        }
    }

    pub fn with_value(kind: TokenKind, position: Position, value: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            value: Some(value.into()),
        }
    }

    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.position, self.kind)?;
        if let Some(value) = &self.value {
            write!(f, " {:?}", value)?;
        }
        Ok(())
    }
}

/// One token per line, used by the `show-tokens` dump
pub fn tokens_to_string(tokens: &[Token]) -> String {
    tokens.iter().map(|t| format!("{}\n", t)).collect()
}
