//! Header tree
//!
//! Headers are written flat (`\h[1]`, `\h[2]`, ...) and nested by level. The tree keeps a
//! stack of open headers: a new header closes every open header at the same or a deeper
//! level and attaches under whatever is left on top.
//!
//! ```text
//! \h[1][A]        root (0)
//! \h[2][B]        └─ A (1)
//! \h[1][C]           └─ B (2)
//!                 └─ C (1)
//! ```
//!
//! The root entry stands for the toplevel node at level 0, so every header has a parent.

use crate::sigil::ast::NodeId;
use serde::Serialize;

/// Parse the text of a header's `level` argument
pub fn parse_level(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok().filter(|level| *level > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HeaderId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderTreeNode {
    /// The header macro, or the toplevel node for the root entry
    pub node: Option<NodeId>,
    pub parent: Option<HeaderId>,
    pub children: Vec<HeaderId>,
    pub level: usize,
}

/// Result of linking one header into the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linked {
    pub id: HeaderId,
    pub parent: HeaderId,
    /// `(previous, current)` levels when the header skipped levels
    pub skipped: Option<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderTree {
    nodes: Vec<HeaderTreeNode>,
    #[serde(skip)]
    open: Vec<HeaderId>,
    #[serde(skip)]
    previous_level: Option<usize>,
}

impl HeaderTree {
    pub fn new(root: Option<NodeId>) -> Self {
        Self {
            nodes: vec![HeaderTreeNode {
                node: root,
                parent: None,
                children: Vec::new(),
                level: 0,
            }],
            open: vec![HeaderId(0)],
            previous_level: None,
        }
    }

    pub fn root(&self) -> HeaderId {
        HeaderId(0)
    }

    pub fn get(&self, id: HeaderId) -> &HeaderTreeNode {
        &self.nodes[id.0]
    }

    /// Number of headers, not counting the root entry
    pub fn header_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// The most recently linked header that is still open
    pub fn current(&self) -> HeaderId {
        self.open.last().copied().unwrap_or(HeaderId(0))
    }

    /// Open headers from the root down to the current one
    pub fn open_chain(&self) -> &[HeaderId] {
        &self.open
    }

    /// Link a header at `level` under the closest open header with a lower level
    pub fn link(&mut self, node: NodeId, level: usize) -> Linked {
        let skipped = match self.previous_level {
            Some(previous) if level > previous + 1 => Some((previous, level)),
            _ => None,
        };
        self.previous_level = Some(level);

        while self.open.len() > 1 {
            let top = self.current();
            if self.get(top).level >= level {
                self.open.pop();
            } else {
                break;
            }
        }
        let parent = self.current();
        let id = HeaderId(self.nodes.len());
        self.nodes.push(HeaderTreeNode {
            node: Some(node),
            parent: Some(parent),
            children: Vec::new(),
            level,
        });
        self.nodes[parent.0].children.push(id);
        self.open.push(id);

        Linked {
            id,
            parent,
            skipped,
        }
    }

    /// Headers in document order, root excluded
    pub fn headers(&self) -> impl Iterator<Item = (HeaderId, &HeaderTreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, n)| (HeaderId(i), n))
    }

    /// Walk up from `id` to the root, `id` excluded
    pub fn ancestors(&self, id: HeaderId) -> impl Iterator<Item = HeaderId> + '_ {
        std::iter::successors(self.get(id).parent, move |p| self.get(*p).parent)
    }
}

impl Default for HeaderTree {
    fn default() -> Self {
        Self::new(None)
    }
}
