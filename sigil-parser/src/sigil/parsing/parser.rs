//! Recursive descent parser
//!
//!     The token stream always has the shape `toplevel [ ... ]` because the tokenizer wraps
//!     the document. The last token is therefore the toplevel closer, and any other closer
//!     that reaches toplevel content is a stray one.
//!
//!     Nested arguments never steal the toplevel closer: if a nested argument runs into it,
//!     the argument is reported as unclosed and the closer is left for the toplevel.

use crate::sigil::ast::{Argument, Ast, Diagnostic, MacroNode, NodeId, NodeKind, Position};
use crate::sigil::registry::{MacroDef, MacroRegistry};
use crate::sigil::token::{Token, TokenKind};

/// Raw AST plus what went wrong while building it
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub ast: Ast,
    pub diagnostics: Vec<Diagnostic>,
    /// One line per `parse_macro` call, only filled when tracing was requested
    pub trace: Vec<String>,
}

/// Parse a token stream produced by [`tokenize`](crate::sigil::lexing::tokenize)
pub fn parse(tokens: &[Token], registry: &MacroRegistry, trace: bool) -> ParseOutput {
    let output = Parser::new(tokens, registry, trace).run();
    tracing::debug!(
        nodes = output.ast.len(),
        diagnostics = output.diagnostics.len(),
        "parsed document"
    );
    output
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    registry: &'a MacroRegistry,
    index: usize,
    depth: usize,
    ast: Ast,
    diagnostics: Vec<Diagnostic>,
    trace: Option<Vec<String>>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], registry: &'a MacroRegistry, trace: bool) -> Self {
        Self {
            tokens,
            registry,
            index: 0,
            depth: 0,
            ast: Ast::new(),
            diagnostics: Vec::new(),
            trace: trace.then(Vec::new),
        }
    }

    pub fn run(mut self) -> ParseOutput {
        let root = match self.peek() {
            Some(token) if token.kind == TokenKind::MacroName => self.parse_macro(),
            _ => {
                // Hand built token streams may lack the wrapper
                let id = self.ast.push(
                    NodeKind::Error {
                        message: "document does not start with a macro".to_string(),
                    },
                    Position::default(),
                );
                self.index = self.tokens.len();
                id
            }
        };
        self.ast.set_root(root);

        while let Some(token) = self.next() {
            self.diagnostics.push(
                Diagnostic::syntactic(
                    token.position,
                    format!("unexpected {} after the end of the document", token.kind),
                )
                .with_code("trailing-token"),
            );
        }

        ParseOutput {
            ast: self.ast,
            diagnostics: self.diagnostics,
            trace: self.trace.unwrap_or_default(),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token)
    }

    fn is_final_token(&self) -> bool {
        self.index + 1 == self.tokens.len()
    }

    fn error(&mut self, position: Position, message: String, code: &str) {
        self.diagnostics
            .push(Diagnostic::syntactic(position, message).with_code(code));
    }

    /// Parse one macro starting at its name token
    fn parse_macro(&mut self) -> NodeId {
        let is_root = self.index == 0;
        let Some(name_token) = self.next() else {
            return self.ast.push(
                NodeKind::Error {
                    message: "unexpected end of input".to_string(),
                },
                Position::default(),
            );
        };
        let name = name_token.value_str();
        let position = name_token.position;
        if let Some(trace) = self.trace.as_mut() {
            trace.push(format!(
                "{}parse_macro {} {}",
                "  ".repeat(self.depth),
                name,
                position
            ));
        }
        tracing::trace!(name, %position, "parse_macro");

        let registry = self.registry;
        let def = registry.get(name);
        let mut node = MacroNode::new(name);
        let mut positional_index = 0;

        self.depth += 1;
        while let Some(opener) = self.peek().filter(|t| t.kind.is_argument_start()) {
            self.index += 1;
            let toplevel = is_root && positional_index == 0;
            let arg_name = match opener.kind {
                TokenKind::PositionalArgumentStart => {
                    let slot = positional_index;
                    positional_index += 1;
                    def.and_then(|d| self.positional_name(d, slot, opener.position))
                }
                _ => {
                    let explicit = match self.peek() {
                        Some(t) if t.kind == TokenKind::NamedArgumentName => {
                            self.index += 1;
                            t.value_str()
                        }
                        _ => "",
                    };
                    def.and_then(|d| self.named_name(d, &node, explicit, opener.position))
                }
            };
            let children = self.parse_argument(opener, toplevel && def.is_some());
            if let Some(arg_name) = arg_name {
                let mut argument = Argument::new(arg_name, opener.position, true);
                argument.children = children;
                node.args.push(argument);
            }
        }
        self.depth -= 1;

        let Some(def) = def else {
            let message = format!("unknown macro name: \"{}\"", name);
            self.diagnostics.push(
                Diagnostic::syntactic(position, message.clone()).with_code("unknown-macro"),
            );
            return self.ast.push(NodeKind::Error { message }, position);
        };

        self.fill_defaults(def, &mut node, position);
        self.ast.push_macro(node, position)
    }

    fn positional_name(&mut self, def: &MacroDef, slot: usize, at: Position) -> Option<String> {
        match def.positional.get(slot) {
            Some(name) => Some(name.clone()),
            None => {
                self.error(
                    at,
                    format!(
                        "too many positional arguments for macro \"{}\": expected at most {}",
                        def.name,
                        def.positional.len()
                    ),
                    "too-many-positional",
                );
                None
            }
        }
    }

    fn named_name(
        &mut self,
        def: &MacroDef,
        node: &MacroNode,
        name: &str,
        at: Position,
    ) -> Option<String> {
        if !def.named.contains(name) {
            self.error(
                at,
                format!(
                    "unknown named argument \"{}\" for macro \"{}\"",
                    name, def.name
                ),
                "unknown-argument",
            );
            return None;
        }
        if node.arg(name).is_some() {
            self.error(
                at,
                format!(
                    "duplicate named argument \"{}\" for macro \"{}\"",
                    name, def.name
                ),
                "duplicate-argument",
            );
            return None;
        }
        Some(name.to_string())
    }

    /// Children of one argument, up to and including its closer
    fn parse_argument(&mut self, opener: &Token, toplevel: bool) -> Vec<NodeId> {
        let expected = opener.kind.closer();
        let mut children = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                self.error(
                    opener.position,
                    "unterminated argument: reached the end of the document".to_string(),
                    "unclosed-argument",
                );
                break;
            };
            match token.kind {
                kind if kind.is_argument_end() => {
                    if toplevel {
                        if self.is_final_token() {
                            self.index += 1;
                            break;
                        }
                        self.index += 1;
                        self.error(
                            token.position,
                            format!("unmatched {}", closer_char(kind)),
                            "stray-closer",
                        );
                        continue;
                    }
                    if self.is_final_token() {
                        self.error(
                            opener.position,
                            format!(
                                "unclosed argument: missing {}",
                                expected.map(closer_char).unwrap_or("]")
                            ),
                            "unclosed-argument",
                        );
                        break;
                    }
                    self.index += 1;
                    if Some(kind) != expected {
                        self.error(
                            token.position,
                            format!(
                                "mismatched argument closer: expected {} but found {}",
                                expected.map(closer_char).unwrap_or("]"),
                                closer_char(kind)
                            ),
                            "mismatched-closer",
                        );
                    }
                    break;
                }
                kind if kind.is_argument_start() => {
                    // An argument list with no macro in front of it; keep its content
                    self.index += 1;
                    self.error(
                        token.position,
                        "argument without a macro name".to_string(),
                        "orphan-argument",
                    );
                    if token.kind == TokenKind::NamedArgumentStart
                        && self.peek().map(|t| t.kind) == Some(TokenKind::NamedArgumentName)
                    {
                        self.index += 1;
                    }
                    children.extend(self.parse_argument(token, false));
                }
                TokenKind::Plaintext => {
                    self.index += 1;
                    children.push(self.ast.push_plaintext(token.value_str(), token.position));
                }
                TokenKind::ParagraphBreak => {
                    self.index += 1;
                    children.push(self.ast.push(NodeKind::ParagraphBreak, token.position));
                }
                TokenKind::MacroName => children.push(self.parse_macro()),
                _ => {
                    self.index += 1;
                    self.error(
                        token.position,
                        format!("unexpected {}", token.kind),
                        "unexpected-token",
                    );
                }
            }
        }
        children
    }

    /// Fill missing declared arguments and order them positional first
    fn fill_defaults(&mut self, def: &MacroDef, node: &mut MacroNode, position: Position) {
        let mut ordered = Vec::with_capacity(def.positional.len() + def.named.len());
        for name in def.argument_names() {
            match node.args.iter().position(|a| a.name == name) {
                Some(i) => ordered.push(node.args.swap_remove(i)),
                None => {
                    let mut argument = Argument::new(name, position, false);
                    argument.children = vec![self.ast.push_plaintext("", position)];
                    ordered.push(argument);
                }
            }
        }
        node.args = ordered;
    }
}

fn closer_char(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::NamedArgumentEnd => "}",
        _ => "]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigil::lexing::tokenize;

    fn parse_str(source: &str) -> ParseOutput {
        let registry = MacroRegistry::with_defaults();
        parse(&tokenize(source).tokens, &registry, true)
    }

    fn content_types(output: &ParseOutput) -> Vec<String> {
        let ast = &output.ast;
        let root = ast.macro_node(ast.root()).expect("toplevel");
        root.children("content")
            .iter()
            .map(|c| ast.get(*c).node_type().to_string())
            .collect()
    }

    #[test]
    fn test_parse_simple_macro() {
        let output = parse_str("ab \\b[cd] ef");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert_eq!(content_types(&output), vec!["plaintext", "b", "plaintext"]);
    }

    #[test]
    fn test_defaults_filled_in_declaration_order() {
        let output = parse_str("\\h[1][Intro]");
        let ast = &output.ast;
        let root = ast.macro_node(ast.root()).expect("toplevel");
        let h = ast.macro_node(root.children("content")[0]).expect("h");
        let names: Vec<_> = h.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["level", "title", "id", "scope", "synonym"]);
        assert_eq!(h.supplied_args().collect::<Vec<_>>(), vec!["level", "title"]);
        let id = h.arg("id").expect("id");
        assert_eq!(ast.get(id.children[0]).as_plaintext(), Some(""));
    }

    #[test]
    fn test_named_argument() {
        let output = parse_str("\\h[1][Intro]{id=start}");
        let ast = &output.ast;
        let root = ast.macro_node(ast.root()).expect("toplevel");
        let h = ast.macro_node(root.children("content")[0]).expect("h");
        assert!(h.is_supplied("id"));
        assert_eq!(ast.get(h.children("id")[0]).as_plaintext(), Some("start"));
    }

    #[test]
    fn test_unknown_macro_becomes_error_node() {
        let output = parse_str("a \\foo[x] b");
        assert_eq!(content_types(&output), vec!["plaintext", "error", "plaintext"]);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].message, "unknown macro name: \"foo\"");
        assert_eq!(output.diagnostics[0].column(), 3);
    }

    #[test]
    fn test_too_many_positional_arguments() {
        let output = parse_str("\\b[x][y]");
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0]
            .message
            .starts_with("too many positional arguments for macro \"b\""));
    }

    #[test]
    fn test_unknown_and_duplicate_named_arguments() {
        let output = parse_str("\\C[x]{nope=1}{id=a}{id=b}");
        let messages: Vec<_> = output.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "unknown named argument \"nope\" for macro \"C\"",
                "duplicate named argument \"id\" for macro \"C\"",
            ]
        );
    }

    #[test]
    fn test_stray_closer_at_top_level() {
        let output = parse_str("a ] b");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].message, "unmatched ]");
        assert_eq!(output.diagnostics[0].column(), 3);
        assert_eq!(content_types(&output), vec!["plaintext", "plaintext"]);
    }

    #[test]
    fn test_unclosed_argument_reported_at_opener() {
        let output = parse_str("\\b[x");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].message, "unclosed argument: missing ]");
        assert_eq!(output.diagnostics[0].column(), 3);
        assert_eq!(content_types(&output), vec!["b"]);
    }

    #[test]
    fn test_mismatched_closer() {
        let output = parse_str("\\b[x} y");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(
            output.diagnostics[0].message,
            "mismatched argument closer: expected ] but found }"
        );
    }

    #[test]
    fn test_parse_trace() {
        let output = parse_str("\\b[\\i[x]]");
        assert_eq!(
            output.trace,
            vec![
                "parse_macro toplevel 1:1",
                "  parse_macro b 1:1",
                "    parse_macro i 1:4",
            ]
        );
    }

    #[test]
    fn test_parent_links_after_parse() {
        let output = parse_str("\\b[\\i[x]]");
        let ast = &output.ast;
        let root = ast.root();
        let b = ast.macro_node(root).expect("toplevel").children("content")[0];
        let i = ast.macro_node(b).expect("b").children("content")[0];
        assert_eq!(ast.parent(i), Some(b));
        assert_eq!(ast.parent(b), Some(root));
    }
}
