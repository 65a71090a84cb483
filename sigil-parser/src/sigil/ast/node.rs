//! Arena AST nodes
//!
//!     All nodes of a document live in one [`Ast`] vector. A macro node owns its children
//!     through its argument lists; the `parent` field is only a back index and never owns
//!     anything, so there are no reference cycles to manage.
//!
//!     Post-processing rewrites argument lists in place (wrapping runs of siblings in
//!     synthetic containers or paragraphs). Nodes that drop out of every argument list stay
//!     in the arena but are unreachable from the root.

use super::range::Position;
use crate::sigil::assembling::headers::HeaderId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// One argument of a macro node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub name: String,
    pub children: Vec<NodeId>,
    /// Where the argument opener was, or the macro position for defaulted arguments
    pub position: Position,
    /// Whether the author wrote this argument
    pub supplied: bool,
}

impl Argument {
    pub fn new(name: impl Into<String>, position: Position, supplied: bool) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            position,
            supplied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroNode {
    pub name: String,
    /// Positional arguments first in declaration order, then named ones
    pub args: Vec<Argument>,
    pub id: Option<String>,
    pub count: Option<usize>,
    #[serde(skip)]
    pub header: Option<HeaderId>,
    /// True for containers and paragraphs inserted by post-processing
    pub synthetic: bool,
}

impl MacroNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            id: None,
            count: None,
            header: None,
            synthetic: false,
        }
    }

    pub fn arg(&self, name: &str) -> Option<&Argument> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn arg_mut(&mut self, name: &str) -> Option<&mut Argument> {
        self.args.iter_mut().find(|a| a.name == name)
    }

    /// Children of an argument, empty when the macro does not declare it
    pub fn children(&self, name: &str) -> &[NodeId] {
        self.arg(name).map(|a| a.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_supplied(&self, name: &str) -> bool {
        self.arg(name).map(|a| a.supplied).unwrap_or(false)
    }

    /// Names of the arguments the author actually wrote
    pub fn supplied_args(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter(|a| a.supplied)
            .map(|a| a.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Macro(MacroNode),
    Plaintext { text: String },
    ParagraphBreak,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub position: Position,
    #[serde(skip)]
    pub parent: Option<NodeId>,
}

impl AstNode {
    pub fn as_macro(&self) -> Option<&MacroNode> {
        match &self.kind {
            NodeKind::Macro(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_plaintext(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Plaintext { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_paragraph_break(&self) -> bool {
        matches!(self.kind, NodeKind::ParagraphBreak)
    }

    /// Short name used in dumps and assertions
    pub fn node_type(&self) -> &str {
        match &self.kind {
            NodeKind::Macro(m) => &m.name,
            NodeKind::Plaintext { .. } => "plaintext",
            NodeKind::ParagraphBreak => "paragraph_break",
            NodeKind::Error { .. } => "error",
        }
    }
}

/// Index addressed tree of one document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode {
            kind,
            position,
            parent: None,
        });
        id
    }

    /// Push a macro node and point the parent index of all its children at it
    pub fn push_macro(&mut self, node: MacroNode, position: Position) -> NodeId {
        let children: Vec<NodeId> = node
            .args
            .iter()
            .flat_map(|a| a.children.iter().copied())
            .collect();
        let id = self.push(NodeKind::Macro(node), position);
        for child in children {
            self.nodes[child.0].parent = Some(id);
        }
        id
    }

    pub fn push_plaintext(&mut self, text: impl Into<String>, position: Position) -> NodeId {
        self.push(NodeKind::Plaintext { text: text.into() }, position)
    }

    /// The toplevel node
    ///
    /// Every parsed document has one; an empty `Ast` built by hand does not.
    pub fn root(&self) -> NodeId {
        self.root.unwrap_or(NodeId(0))
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.0]
    }

    pub fn macro_node(&self, id: NodeId) -> Option<&MacroNode> {
        self.get(id).as_macro()
    }

    pub fn macro_node_mut(&mut self, id: NodeId) -> Option<&mut MacroNode> {
        match &mut self.get_mut(id).kind {
            NodeKind::Macro(m) => Some(m),
            _ => None,
        }
    }

    /// Name of the macro at `id`, if it is a macro node
    pub fn macro_name(&self, id: NodeId) -> Option<&str> {
        self.macro_node(id).map(|m| m.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// Replace the children of an argument and re-point their parent index
    pub fn set_children(&mut self, owner: NodeId, arg: &str, children: Vec<NodeId>) {
        for child in &children {
            self.nodes[child.0].parent = Some(owner);
        }
        if let Some(argument) = self.macro_node_mut(owner).and_then(|m| m.arg_mut(arg)) {
            argument.children = children;
        }
    }

    /// Walk up the parent chain, nearest ancestor first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            next: self.parent(id),
        }
    }

    /// Pre-order traversal of everything reachable from `start`
    pub fn descendants(&self, start: NodeId) -> Descendants<'_> {
        Descendants {
            ast: self,
            stack: vec![start],
        }
    }

    /// The reachable node carrying identifier `id`
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|n| self.macro_node(*n).and_then(|m| m.id.as_deref()) == Some(id))
    }
}

pub struct Ancestors<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ast.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        if let Some(m) = self.ast.macro_node(current) {
            for arg in m.args.iter().rev() {
                self.stack.extend(arg.children.iter().rev());
            }
        }
        Some(current)
    }
}
