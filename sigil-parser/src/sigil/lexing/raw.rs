//! Raw lexemes produced by the logos lexer
//!
//! This is the context free layer of tokenization. Argument state, literal arguments and
//! plaintext grouping are handled by the [tokenizer](super::tokenizer).

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
    /// Backslash followed by an escapable character
    #[regex(r"\\[\\\[\]{}]")]
    Escaped,

    /// Backslash followed by a (possibly empty) identifier run
    #[regex(r"\\[A-Za-z0-9_]*")]
    MacroName,

    /// One or more `[`; the run length selects literal arguments
    #[regex(r"\[+")]
    PositionalOpen,

    #[token("]")]
    PositionalClose,

    /// One or more `{`
    #[regex(r"\{+")]
    NamedOpen,

    #[token("}")]
    NamedClose,

    /// Two or more newlines
    #[regex(r"\n\n+")]
    ParagraphBreak,

    #[token("\n")]
    Newline,

    #[regex(r"[^\\\[\]{}\n]+")]
    Text,
}

/// Lex a single lexeme at the start of `input`, returning it with its byte length
pub fn next_lexeme(input: &str) -> Option<(RawToken, usize)> {
    let mut lexer = RawToken::lexer(input);
    match lexer.next()? {
        Ok(token) => Some((token, lexer.span().end)),
        // Every character is covered by some rule, keep the fallback total anyway
        Err(()) => {
            let len = input.chars().next().map(char::len_utf8).unwrap_or(0);
            Some((RawToken::Text, len))
        }
    }
}
