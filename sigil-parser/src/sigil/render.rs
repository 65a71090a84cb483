//! HTML rendering
//!
//!     Rendering walks the finished AST from the toplevel node. Each macro's output comes
//!     from the [`MacroRender`] attached to its definition, so this module only knows about
//!     plaintext, error nodes and escaping; everything macro specific lives in
//!     [`macros`].
//!
//!     Escaping depends on where text lands. Element content escapes `&`, `<` and `>`,
//!     attribute values additionally escape `"`. Attribute values are built from the plain
//!     text of an argument, never from its rendered HTML.
//!
//!     Problems found while rendering (bad link styles, empty link bodies) become
//!     diagnostics and an inline `<span class="error-message">` marker in place of the
//!     construct. Unknown link targets are reported earlier, by disambiguation, and only
//!     get the marker here.

pub mod macros;

use crate::sigil::assembling::headers::HeaderTree;
use crate::sigil::ast::{Ast, Diagnostic, NodeId, NodeKind, Position};
use crate::sigil::index::{IdIndex, IdRecord};
use crate::sigil::pipeline::DEFAULT_EXTENSION;
use crate::sigil::registry::MacroRegistry;
use crate::sigil::resolving::Resolution;
use crate::sigil::store::IdStore;
use std::collections::BTreeMap;

static NO_RESOLUTIONS: BTreeMap<NodeId, Resolution> = BTreeMap::new();

/// Render behavior of one macro
pub trait MacroRender: Send + Sync {
    /// HTML for the macro node at `node`
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String;

    /// Plain text of the node, used for identifiers, titles and attribute values
    fn render_text(&self, node: NodeId, text: &TextContext<'_>) -> String {
        text.arg_text(node, "content")
    }
}

/// Escape text placed in element content
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text placed inside a double quoted attribute value
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// The inline marker shown in place of a broken construct
pub fn error_marker(message: &str) -> String {
    format!("<span class=\"error-message\">{}</span>", escape_text(message))
}

/// Plain text extraction over the AST, no HTML involved
#[derive(Clone, Copy)]
pub struct TextContext<'a> {
    pub ast: &'a Ast,
    pub registry: &'a MacroRegistry,
}

impl<'a> TextContext<'a> {
    pub fn new(ast: &'a Ast, registry: &'a MacroRegistry) -> Self {
        Self { ast, registry }
    }

    pub fn node_text(&self, node: NodeId) -> String {
        match &self.ast.get(node).kind {
            NodeKind::Plaintext { text } => text.clone(),
            NodeKind::ParagraphBreak => "\n\n".to_string(),
            NodeKind::Error { .. } => String::new(),
            NodeKind::Macro(m) => match self.registry.get(&m.name) {
                Some(def) => def.render.render_text(node, self),
                None => String::new(),
            },
        }
    }

    pub fn text(&self, nodes: &[NodeId]) -> String {
        nodes.iter().map(|n| self.node_text(*n)).collect()
    }

    /// Text of one argument, empty when the macro does not declare it
    pub fn arg_text(&self, node: NodeId, arg: &str) -> String {
        match self.ast.macro_node(node) {
            Some(m) => self.text(m.children(arg)),
            None => String::new(),
        }
    }
}

/// Everything a [`MacroRender`] can see while rendering one document
pub struct RenderContext<'a> {
    pub ast: &'a Ast,
    pub registry: &'a MacroRegistry,
    pub index: &'a IdIndex,
    pub headers: &'a HeaderTree,
    pub store: Option<&'a dyn IdStore>,
    pub document: &'a str,
    pub resolutions: &'a BTreeMap<NodeId, Resolution>,
    /// Extension other documents are linked with
    pub extension: &'a str,
    /// Set while a header renders its title
    pub in_header_title: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        ast: &'a Ast,
        registry: &'a MacroRegistry,
        index: &'a IdIndex,
        headers: &'a HeaderTree,
        document: &'a str,
    ) -> Self {
        Self {
            ast,
            registry,
            index,
            headers,
            store: None,
            document,
            resolutions: &NO_RESOLUTIONS,
            extension: DEFAULT_EXTENSION,
            in_header_title: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_store(mut self, store: Option<&'a dyn IdStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_resolutions(mut self, resolutions: &'a BTreeMap<NodeId, Resolution>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn with_extension(mut self, extension: &'a str) -> Self {
        self.extension = extension;
        self
    }

    pub fn text_context(&self) -> TextContext<'a> {
        TextContext::new(self.ast, self.registry)
    }

    pub fn render_node(&mut self, node: NodeId) -> String {
        let ast = self.ast;
        match &ast.get(node).kind {
            NodeKind::Plaintext { text } => escape_text(text),
            NodeKind::ParagraphBreak => String::new(),
            NodeKind::Error { message } => error_marker(message),
            NodeKind::Macro(m) => match self.registry.get(&m.name) {
                Some(def) => {
                    let render = def.render.clone();
                    render.render(node, self)
                }
                None => error_marker(&format!("unknown macro name: \"{}\"", m.name)),
            },
        }
    }

    pub fn render_children(&mut self, nodes: &[NodeId]) -> String {
        nodes.iter().map(|n| self.render_node(*n)).collect()
    }

    /// Rendered HTML of one argument
    pub fn render_arg(&mut self, node: NodeId, arg: &str) -> String {
        let ast = self.ast;
        match ast.macro_node(node) {
            Some(m) => self.render_children(m.children(arg)),
            None => String::new(),
        }
    }

    pub fn arg_text(&self, node: NodeId, arg: &str) -> String {
        self.text_context().arg_text(node, arg)
    }

    /// Argument text escaped for an attribute value
    pub fn arg_attr(&self, node: NodeId, arg: &str) -> String {
        escape_attr(&self.arg_text(node, arg))
    }

    /// ` id="..."` when the node was given an identifier
    pub fn id_attr(&self, node: NodeId) -> String {
        match self.ast.macro_node(node).and_then(|m| m.id.as_deref()) {
            Some(id) => format!(" id=\"{}\"", escape_attr(id)),
            None => String::new(),
        }
    }

    /// Report a problem and return the marker to put in its place
    pub fn error(&mut self, position: Position, message: impl Into<String>) -> String {
        let message = message.into();
        let marker = error_marker(&message);
        self.diagnostics.push(
            Diagnostic::semantic(position, message).with_document(self.document.to_string()),
        );
        marker
    }

    /// Record for `id`: this document first, then the store
    pub fn record(&self, id: &str) -> Option<IdRecord> {
        if let Some(record) = self.index.record(id) {
            return Some(record.clone());
        }
        let store = self.store?;
        store
            .lookup(&[id.to_string()], &[self.document.to_string()])
            .into_iter()
            .next()
    }

    /// Link target for a record, relative to the document being rendered
    pub fn href_for(&self, record: &IdRecord) -> String {
        if record.document == self.document {
            format!("#{}", escape_attr(&record.id))
        } else if record.is_document() {
            format!("{}.{}", escape_attr(&record.document), self.extension)
        } else {
            format!(
                "{}.{}#{}",
                escape_attr(&record.document),
                self.extension,
                escape_attr(&record.id)
            )
        }
    }

    pub fn resolution(&self, node: NodeId) -> Option<&'a Resolution> {
        self.resolutions.get(&node)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Title of the document: the toplevel `title`, else the first header's title
pub fn document_title(ast: &Ast, registry: &MacroRegistry, headers: &HeaderTree) -> String {
    let text = TextContext::new(ast, registry);
    let own = text.arg_text(ast.root(), "title");
    if !own.trim().is_empty() {
        return own;
    }
    headers
        .headers()
        .filter_map(|(_, h)| h.node)
        .map(|node| text.arg_text(node, "title"))
        .next()
        .unwrap_or_default()
}

/// Render the whole document, wrapped in an HTML shell unless `body_only`
pub fn render_document(mut ctx: RenderContext<'_>, body_only: bool) -> (String, Vec<Diagnostic>) {
    let root = ctx.ast.root();
    let body = if ctx.ast.is_empty() {
        String::new()
    } else {
        ctx.render_node(root)
    };
    tracing::debug!(
        document = ctx.document,
        bytes = body.len(),
        "rendered document"
    );
    let output = if body_only {
        body
    } else {
        let title = document_title(ctx.ast, ctx.registry, ctx.headers);
        format!(
            "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
            escape_text(title.trim()),
            body
        )
    };
    (output, ctx.into_diagnostics())
}
