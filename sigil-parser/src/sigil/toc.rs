//! Table of contents
//!
//!     The TOC mirrors the header tree. Each entry carries its hierarchical number
//!     (`1`, `1.2`, `1.2.1`) which is the position of the header among its siblings, not
//!     the per-macro count used by cross references.

use crate::sigil::assembling::headers::{HeaderId, HeaderTree};
use crate::sigil::ast::Ast;
use crate::sigil::registry::MacroRegistry;
use crate::sigil::render::{escape_attr, escape_text, TextContext};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    pub id: Option<String>,
    pub title: String,
    pub level: usize,
    pub number: String,
    pub children: Vec<TocEntry>,
}

/// Nested entries for every header of the document
pub fn build_toc(ast: &Ast, registry: &MacroRegistry, headers: &HeaderTree) -> Vec<TocEntry> {
    let text = TextContext::new(ast, registry);
    entries_under(&text, headers, headers.root(), "")
}

fn entries_under(
    text: &TextContext<'_>,
    headers: &HeaderTree,
    parent: HeaderId,
    prefix: &str,
) -> Vec<TocEntry> {
    headers
        .get(parent)
        .children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let header = headers.get(*child);
            let number = if prefix.is_empty() {
                format!("{}", i + 1)
            } else {
                format!("{}.{}", prefix, i + 1)
            };
            let (id, title) = match header.node {
                Some(node) => (
                    text.ast.macro_node(node).and_then(|m| m.id.clone()),
                    text.arg_text(node, "title").trim().to_string(),
                ),
                None => (None, String::new()),
            };
            TocEntry {
                id,
                title,
                level: header.level,
                children: entries_under(text, headers, *child, &number),
                number,
            }
        })
        .collect()
}

fn push_list(out: &mut String, entries: &[TocEntry]) {
    if entries.is_empty() {
        return;
    }
    out.push_str("<ul>");
    for entry in entries {
        out.push_str("<li>");
        let label = format!("{}. {}", entry.number, escape_text(&entry.title));
        match &entry.id {
            Some(id) => {
                out.push_str(&format!("<a href=\"#{}\">{}</a>", escape_attr(id), label))
            }
            None => out.push_str(&label),
        }
        push_list(out, &entry.children);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

/// HTML navigation for a table of contents
pub fn render_toc(entries: &[TocEntry]) -> String {
    let mut out = String::from("<nav class=\"toc\">");
    push_list(&mut out, entries);
    out.push_str("</nav>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigil::assembling::post_process;
    use crate::sigil::lexing::tokenize;
    use crate::sigil::parsing::parse;

    fn toc_for(source: &str) -> Vec<TocEntry> {
        let registry = MacroRegistry::with_defaults();
        let mut ast = parse(&tokenize(source).tokens, &registry, false).ast;
        let output = post_process(&mut ast, &registry, "");
        build_toc(&ast, &registry, &output.headers)
    }

    #[test]
    fn test_numbers_follow_tree() {
        let toc = toc_for("\\h[1][A]\n\n\\h[2][B]\n\n\\h[2][C]\n\n\\h[1][D]");
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].number, "1");
        let children: Vec<_> = toc[0].children.iter().map(|c| c.number.as_str()).collect();
        assert_eq!(children, vec!["1.1", "1.2"]);
        assert_eq!(toc[1].title, "D");
        assert_eq!(toc[1].id.as_deref(), Some("d"));
    }

    #[test]
    fn test_render_toc() {
        let toc = toc_for("\\h[1][A & B]\n\n\\h[2][C]");
        assert_eq!(
            render_toc(&toc),
            "<nav class=\"toc\"><ul><li><a href=\"#a-and-b\">1. A &amp; B</a><ul><li><a href=\"#c\">1.1. C</a></li></ul></li></ul></nav>\n"
        );
    }

    #[test]
    fn test_empty_document_has_empty_toc() {
        assert!(toc_for("just text").is_empty());
        assert_eq!(render_toc(&[]), "<nav class=\"toc\"></nav>\n");
    }
}
