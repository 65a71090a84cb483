//! Testing utilities for AST assertions
//!
//!     Tests that walk the arena by hand end up indexing `NodeId`s and matching on
//!     `NodeKind` everywhere, and they break as soon as post-processing inserts a wrapper.
//!     The fluent API here names what a test cares about instead: which macro, which
//!     argument, which child, what text.
//!
//! Usage Example
//!
//!     ```rust,ignore
//!     use sigil_parser::sigil::testing::{assemble, assert_ast};
//!
//!     let doc = assemble("\\h[1][Intro]\n\nHello \\b[world]");
//!     assert_ast(&doc.ast, &doc.registry)
//!         .child_count(2)
//!         .child(0, |h| h.is_macro("h").id("intro").count(1))
//!         .child(1, |p| {
//!             p.is_macro("p")
//!                 .text("Hello world")
//!                 .child(1, |b| b.is_macro("b"))
//!         });
//!     ```
//!
//!     `child` and `child_count` look at the `content` argument, which is where nearly all
//!     structure lives; use `arg` to step into any other argument.

use crate::sigil::assembling::{post_process, PostProcessOutput};
use crate::sigil::ast::{Ast, NodeId, NodeKind};
use crate::sigil::lexing::tokenize;
use crate::sigil::parsing::parse;
use crate::sigil::registry::MacroRegistry;
use crate::sigil::render::TextContext;

/// A document run through the front end with the default registry
pub struct Assembled {
    pub ast: Ast,
    pub registry: MacroRegistry,
    pub output: PostProcessOutput,
}

/// Tokenize, parse and post-process `source` as an anonymous document
pub fn assemble(source: &str) -> Assembled {
    let registry = MacroRegistry::with_defaults();
    let mut ast = parse(&tokenize(source).tokens, &registry, false).ast;
    let output = post_process(&mut ast, &registry, "");
    Assembled {
        ast,
        registry,
        output,
    }
}

/// Create an assertion builder for the toplevel node
pub fn assert_ast<'a>(ast: &'a Ast, registry: &'a MacroRegistry) -> NodeAssertion<'a> {
    NodeAssertion {
        ast,
        registry,
        node: ast.root(),
        context: "toplevel".to_string(),
    }
}

pub struct NodeAssertion<'a> {
    ast: &'a Ast,
    registry: &'a MacroRegistry,
    node: NodeId,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    fn at(&self, node: NodeId, context: String) -> NodeAssertion<'a> {
        NodeAssertion {
            ast: self.ast,
            registry: self.registry,
            node,
            context,
        }
    }

    fn args_children(&self, arg: &str) -> &'a [NodeId] {
        match self.ast.macro_node(self.node) {
            Some(m) => match m.arg(arg) {
                Some(a) => &a.children,
                None => panic!("{}: macro '{}' has no argument '{}'", self.context, m.name, arg),
            },
            None => panic!(
                "{}: Expected a macro, found {}",
                self.context,
                self.ast.get(self.node).node_type()
            ),
        }
    }

    fn summary(&self, children: &[NodeId]) -> String {
        children
            .iter()
            .map(|c| self.ast.get(*c).node_type().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_macro(self, name: &str) -> Self {
        let actual = self.ast.get(self.node).node_type();
        assert_eq!(
            actual, name,
            "{}: Expected macro '{}', found '{}'",
            self.context, name, actual
        );
        self
    }

    pub fn is_plaintext(self, expected: &str) -> Self {
        match &self.ast.get(self.node).kind {
            NodeKind::Plaintext { text } => assert_eq!(
                text, expected,
                "{}: Expected plaintext {:?}, found {:?}",
                self.context, expected, text
            ),
            _ => panic!(
                "{}: Expected plaintext, found {}",
                self.context,
                self.ast.get(self.node).node_type()
            ),
        }
        self
    }

    pub fn is_error_containing(self, fragment: &str) -> Self {
        match &self.ast.get(self.node).kind {
            NodeKind::Error { message } => assert!(
                message.contains(fragment),
                "{}: Expected error mentioning {:?}, found {:?}",
                self.context,
                fragment,
                message
            ),
            _ => panic!(
                "{}: Expected an error node, found {}",
                self.context,
                self.ast.get(self.node).node_type()
            ),
        }
        self
    }

    pub fn id(self, expected: &str) -> Self {
        let actual = self.ast.macro_node(self.node).and_then(|m| m.id.as_deref());
        assert_eq!(
            actual,
            Some(expected),
            "{}: Expected id '{}', found {:?}",
            self.context,
            expected,
            actual
        );
        self
    }

    pub fn no_id(self) -> Self {
        let actual = self.ast.macro_node(self.node).and_then(|m| m.id.as_deref());
        assert!(actual.is_none(), "{}: Expected no id, found {:?}", self.context, actual);
        self
    }

    pub fn count(self, expected: usize) -> Self {
        let actual = self.ast.macro_node(self.node).and_then(|m| m.count);
        assert_eq!(
            actual,
            Some(expected),
            "{}: Expected count {}, found {:?}",
            self.context,
            expected,
            actual
        );
        self
    }

    /// Plain text of the node, as used for titles and identifiers
    pub fn text(self, expected: &str) -> Self {
        let actual = TextContext::new(self.ast, self.registry).node_text(self.node);
        assert_eq!(
            actual, expected,
            "{}: Expected text {:?}, found {:?}",
            self.context, expected, actual
        );
        self
    }

    pub fn supplied(self, arg: &str) -> Self {
        let supplied = self
            .ast
            .macro_node(self.node)
            .map(|m| m.is_supplied(arg))
            .unwrap_or(false);
        assert!(supplied, "{}: Expected argument '{}' to be supplied", self.context, arg);
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        let children = self.args_children("content");
        assert_eq!(
            children.len(),
            expected,
            "{}: Expected {} children, found {} [{}]",
            self.context,
            expected,
            children.len(),
            self.summary(children)
        );
        self
    }

    pub fn child<F>(self, index: usize, f: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>) -> NodeAssertion<'a>,
    {
        self.arg_child("content", index, f)
    }

    /// Step into the `index`th child of argument `arg`
    pub fn arg_child<F>(self, arg: &str, index: usize, f: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>) -> NodeAssertion<'a>,
    {
        let children = self.args_children(arg);
        let Some(child) = children.get(index) else {
            panic!(
                "{}: argument '{}' has no child {} [{}]",
                self.context,
                arg,
                index,
                self.summary(children)
            );
        };
        let context = format!("{}.{}[{}]", self.context, arg, index);
        f(self.at(*child, context));
        self
    }

    /// Node types of the children of argument `arg`, in order
    pub fn arg_types(self, arg: &str, expected: &[&str]) -> Self {
        let children = self.args_children(arg);
        let actual: Vec<&str> = children
            .iter()
            .map(|c| self.ast.get(*c).node_type())
            .collect();
        assert_eq!(
            actual, expected,
            "{}: unexpected children of '{}'",
            self.context, arg
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluent_walk() {
        let doc = assemble("\\h[1][Intro]\n\nHello \\b[world]");
        assert_ast(&doc.ast, &doc.registry)
            .child_count(2)
            .child(0, |h| h.is_macro("h").id("intro").count(1).supplied("title"))
            .child(1, |p| {
                p.is_macro("p")
                    .text("Hello world")
                    .arg_types("content", &["plaintext", "b"])
                    .child(1, |b| b.is_macro("b").no_id())
            });
    }

    #[test]
    #[should_panic(expected = "Expected macro 'h'")]
    fn test_wrong_macro_panics() {
        let doc = assemble("text");
        assert_ast(&doc.ast, &doc.registry).child(0, |p| p.is_macro("h"));
    }
}
