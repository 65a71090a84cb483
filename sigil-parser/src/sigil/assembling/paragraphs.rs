//! Implicit paragraphs
//!
//! Paragraph break markers split an argument into chunks. A chunk whose first child is
//! phrasing content (plaintext or a phrasing macro) becomes a `p`; any other chunk is
//! block content and stays as it is. Newlines at the edges of a chunk are trimmed and
//! the markers themselves are removed.
//!
//! ```text
//! "ab\n\n"          ->  p["ab"]
//! "\np1\n\np2"      ->  p["p1"], p["p2"]
//! ```

use super::synthetic_macro;
use crate::sigil::ast::{Ast, NodeId, NodeKind};
use crate::sigil::registry::{MacroRegistry, PARAGRAPH_MACRO};

pub fn has_paragraph_break(ast: &Ast, children: &[NodeId]) -> bool {
    children.iter().any(|c| ast.get(*c).is_paragraph_break())
}

fn is_phrasing(ast: &Ast, registry: &MacroRegistry, node: NodeId) -> bool {
    match &ast.get(node).kind {
        NodeKind::Plaintext { .. } | NodeKind::Error { .. } => true,
        NodeKind::Macro(m) => registry.is_phrasing(&m.name),
        NodeKind::ParagraphBreak => false,
    }
}

/// Strip newlines from the chunk edges, dropping plaintext that ends up empty
fn trim_chunk(ast: &mut Ast, mut chunk: Vec<NodeId>) -> Vec<NodeId> {
    while let Some(first) = chunk.first().copied() {
        let Some(text) = ast.get(first).as_plaintext() else {
            break;
        };
        let trimmed = text.trim_start_matches('\n').to_string();
        if trimmed.is_empty() {
            chunk.remove(0);
            continue;
        }
        ast.get_mut(first).kind = NodeKind::Plaintext { text: trimmed };
        break;
    }
    while let Some(last) = chunk.last().copied() {
        let Some(text) = ast.get(last).as_plaintext() else {
            break;
        };
        let trimmed = text.trim_end_matches('\n').to_string();
        if trimmed.is_empty() {
            chunk.pop();
            continue;
        }
        ast.get_mut(last).kind = NodeKind::Plaintext { text: trimmed };
        break;
    }
    chunk
}

/// Split `children` at paragraph breaks and wrap phrasing chunks in paragraphs
pub fn insert_paragraphs(
    ast: &mut Ast,
    registry: &MacroRegistry,
    children: Vec<NodeId>,
) -> Vec<NodeId> {
    let mut chunks: Vec<Vec<NodeId>> = vec![Vec::new()];
    for child in children {
        if ast.get(child).is_paragraph_break() {
            chunks.push(Vec::new());
        } else if let Some(chunk) = chunks.last_mut() {
            chunk.push(child);
        }
    }

    let mut out = Vec::new();
    for chunk in chunks {
        let chunk = trim_chunk(ast, chunk);
        let Some(first) = chunk.first().copied() else {
            continue;
        };
        if is_phrasing(ast, registry, first) {
            let position = ast.get(first).position;
            match synthetic_macro(ast, registry, PARAGRAPH_MACRO, chunk.clone(), position) {
                Some(paragraph) => out.push(paragraph),
                None => out.extend(chunk),
            }
        } else {
            out.extend(chunk);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigil::ast::Position;

    fn text(ast: &mut Ast, value: &str) -> NodeId {
        ast.push_plaintext(value, Position::default())
    }

    fn paragraph_break(ast: &mut Ast) -> NodeId {
        ast.push(NodeKind::ParagraphBreak, Position::default())
    }

    #[test]
    fn test_single_paragraph_trimmed() {
        let registry = MacroRegistry::with_defaults();
        let mut ast = Ast::new();
        let ab = text(&mut ast, "ab\n");
        let out = insert_paragraphs(&mut ast, &registry, vec![ab]);
        assert_eq!(out.len(), 1);
        let p = ast.macro_node(out[0]).expect("p");
        assert_eq!(p.name, "p");
        assert_eq!(ast.get(p.children("content")[0]).as_plaintext(), Some("ab"));
    }

    #[test]
    fn test_breaks_split_and_disappear() {
        let registry = MacroRegistry::with_defaults();
        let mut ast = Ast::new();
        let p1 = text(&mut ast, "\np1");
        let b1 = paragraph_break(&mut ast);
        let p2 = text(&mut ast, "p2");
        let b2 = paragraph_break(&mut ast);
        let p3 = text(&mut ast, "p3");
        let out = insert_paragraphs(&mut ast, &registry, vec![p1, b1, p2, b2, p3]);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|n| ast.macro_name(*n) == Some("p")));
        assert_eq!(ast.get(p1).as_plaintext(), Some("p1"));
    }

    #[test]
    fn test_block_chunk_not_wrapped() {
        let registry = MacroRegistry::with_defaults();
        let mut ast = Ast::new();
        let content = text(&mut ast, "code");
        let code = synthetic_macro(&mut ast, &registry, "C", vec![content], Position::default())
            .expect("C");
        let newline = text(&mut ast, "\n");
        let out = insert_paragraphs(&mut ast, &registry, vec![code, newline]);
        assert_eq!(out, vec![code]);
    }

    #[test]
    fn test_empty_chunks_skipped() {
        let registry = MacroRegistry::with_defaults();
        let mut ast = Ast::new();
        let b1 = paragraph_break(&mut ast);
        let nl = text(&mut ast, "\n");
        let b2 = paragraph_break(&mut ast);
        assert!(insert_paragraphs(&mut ast, &registry, vec![b1, nl, b2]).is_empty());
    }
}
