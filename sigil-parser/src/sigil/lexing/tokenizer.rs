//! Stateful tokenizer
//!
//!     Walks the source one raw lexeme at a time and emits spec level [`Token`]s. Logos is
//!     re-seeded at the current byte offset for every lexeme, which lets the tokenizer take
//!     over the cursor whenever the grammar becomes context sensitive:
//!
//!         - after a `{` run, to read the argument name and its `=`
//!         - after a `[[`/`{{` run, to scan a literal argument up to the matching closing run
//!
//! Literal Arguments
//!
//!     An opening run of N > 1 characters starts a literal argument. Its content is taken
//!     verbatim until exactly N closing characters. An escape directly before an N-run of
//!     openers or closers keeps that run as text and drops the escape. A newline directly
//!     after the opener or directly before the terminator is not part of the content.

use super::raw::{next_lexeme, RawToken};
use super::{is_identifier_char, ESCAPE_CHAR, TOPLEVEL_MACRO};
use crate::sigil::ast::{Diagnostic, Position, SourceLocation};
use crate::sigil::token::{Token, TokenKind};

/// Tokens plus the lexical and syntactic problems found while producing them
#[derive(Debug, Clone, Default)]
pub struct LexerOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Tokenize a whole document
pub fn tokenize(source: &str) -> LexerOutput {
    let output = Tokenizer::new(source).run();
    tracing::debug!(
        tokens = output.tokens.len(),
        diagnostics = output.diagnostics.len(),
        "tokenized document"
    );
    output
}

pub struct Tokenizer<'a> {
    source: &'a str,
    locator: SourceLocation<'a>,
    pos: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    text: String,
    text_start: Option<usize>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        // A single trailing newline is not content
        let source = source.strip_suffix('\n').unwrap_or(source);
        Self {
            source,
            locator: SourceLocation::new(source),
            pos: 0,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
            text: String::new(),
            text_start: None,
        }
    }

    pub fn run(mut self) -> LexerOutput {
        let origin = Position::new(1, 1);
        self.tokens.push(Token::with_value(
            TokenKind::MacroName,
            origin,
            TOPLEVEL_MACRO,
        ));
        self.tokens
            .push(Token::new(TokenKind::PositionalArgumentStart, origin));

        let source = self.source;
        while let Some((raw, len)) = next_lexeme(&source[self.pos..]) {
            let start = self.pos;
            let slice = &source[start..start + len];
            self.pos += len;

            match raw {
                RawToken::Escaped => self.push_text(start, &slice[ESCAPE_CHAR.len_utf8()..]),
                RawToken::Text => self.push_text(start, slice),
                RawToken::Newline => self.push_text(start, "\n"),
                RawToken::MacroName => {
                    let name = &slice[ESCAPE_CHAR.len_utf8()..];
                    self.emit_value(TokenKind::MacroName, start, name);
                }
                RawToken::ParagraphBreak => {
                    if len > 2 {
                        self.diagnostics.push(
                            Diagnostic::lexical(
                                self.position_at(start),
                                format!(
                                    "paragraphs must be separated by exactly one blank line, found {} consecutive newlines",
                                    len
                                ),
                            )
                            .with_code("too-many-newlines"),
                        );
                    }
                    self.emit(TokenKind::ParagraphBreak, start);
                }
                RawToken::PositionalOpen => {
                    self.emit(TokenKind::PositionalArgumentStart, start);
                    if len > 1 {
                        self.literal_argument(
                            start,
                            len,
                            '[',
                            ']',
                            TokenKind::PositionalArgumentEnd,
                        );
                    }
                }
                RawToken::PositionalClose => self.emit(TokenKind::PositionalArgumentEnd, start),
                RawToken::NamedOpen => {
                    self.emit(TokenKind::NamedArgumentStart, start);
                    self.named_argument_name();
                    if len > 1 {
                        self.literal_argument(start, len, '{', '}', TokenKind::NamedArgumentEnd);
                    }
                }
                RawToken::NamedClose => self.emit(TokenKind::NamedArgumentEnd, start),
            }
        }

        let end = self.source.len();
        self.emit(TokenKind::PositionalArgumentEnd, end);

        LexerOutput {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    fn position_at(&self, byte_offset: usize) -> Position {
        self.locator.byte_to_position(byte_offset)
    }

    fn push_text(&mut self, start: usize, text: &str) {
        if self.text_start.is_none() {
            self.text_start = Some(start);
        }
        self.text.push_str(text);
    }

    fn flush_text(&mut self) {
        if let Some(start) = self.text_start.take() {
            let value = std::mem::take(&mut self.text);
            let position = self.position_at(start);
            self.tokens
                .push(Token::with_value(TokenKind::Plaintext, position, value));
        }
    }

    fn emit(&mut self, kind: TokenKind, start: usize) {
        self.flush_text();
        let position = self.position_at(start);
        self.tokens.push(Token::new(kind, position));
    }

    fn emit_value(&mut self, kind: TokenKind, start: usize, value: &str) {
        self.flush_text();
        let position = self.position_at(start);
        self.tokens.push(Token::with_value(kind, position, value));
    }

    /// Read `name=` right after a named argument opener
    fn named_argument_name(&mut self) {
        let source = self.source;
        let start = self.pos;
        let rest = &source[start..];
        let name_len: usize = rest
            .chars()
            .take_while(|c| is_identifier_char(*c))
            .map(char::len_utf8)
            .sum();
        let name = &rest[..name_len];
        self.emit_value(TokenKind::NamedArgumentName, start, name);
        self.pos += name_len;

        if self.source[self.pos..].starts_with('=') {
            self.pos += 1;
        } else {
            self.diagnostics.push(
                Diagnostic::syntactic(
                    self.position_at(self.pos),
                    format!("expected '=' after named argument name \"{}\"", name),
                )
                .with_code("missing-equals"),
            );
        }
    }

    /// Scan a literal argument body and emit it followed by the closing token
    fn literal_argument(
        &mut self,
        arg_start: usize,
        run: usize,
        open: char,
        close: char,
        end_kind: TokenKind,
    ) {
        let open_seq: String = std::iter::repeat(open).take(run).collect();
        let close_seq: String = std::iter::repeat(close).take(run).collect();
        let source = self.source;
        let content_start = self.pos;
        let rest = &source[content_start..];

        let mut content = String::new();
        let mut i = 0;
        let mut terminator = None;
        while i < rest.len() {
            let tail = &rest[i..];
            if let Some(after_escape) = tail.strip_prefix(ESCAPE_CHAR) {
                if after_escape.starts_with(&open_seq) {
                    content.push_str(&open_seq);
                    i += ESCAPE_CHAR.len_utf8() + open_seq.len();
                    continue;
                }
                if after_escape.starts_with(&close_seq) {
                    content.push_str(&close_seq);
                    i += ESCAPE_CHAR.len_utf8() + close_seq.len();
                    continue;
                }
            }
            if tail.starts_with(&close_seq) {
                terminator = Some(content_start + i);
                break;
            }
            let ch = tail.chars().next().unwrap_or(ESCAPE_CHAR);
            content.push(ch);
            i += ch.len_utf8();
        }

        if content.starts_with('\n') {
            content.remove(0);
        }
        if content.ends_with('\n') {
            content.pop();
        }

        if !content.is_empty() {
            let position = self.position_at(content_start);
            self.tokens
                .push(Token::with_value(TokenKind::Plaintext, position, content));
        }

        match terminator {
            Some(end) => {
                self.pos = end + close_seq.len();
                self.emit(end_kind, end);
            }
            None => {
                self.diagnostics.push(
                    Diagnostic::lexical(
                        self.position_at(arg_start),
                        format!(
                            "unterminated literal argument, expected \"{}\" before the end of input",
                            close_seq
                        ),
                    )
                    .with_code("unterminated-literal"),
                );
                self.pos = self.source.len();
                self.emit(end_kind, self.source.len());
            }
        }
    }
}
