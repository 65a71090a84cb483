//! Post-processing of the raw AST
//!
//!     Parsing gives a tree that mirrors what the author typed. Assembling turns it into
//!     the tree the renderer needs and extracts everything the shared namespace needs:
//!
//!         1. Identifiers: explicit `id` arguments, or derived from `title`. See [ids].
//!         2. Numbering: identified nodes are counted per macro in document order.
//!         3. Header linkage: headers form a tree by level. See [headers].
//!         4. References: structural, synonym and candidate cross reference rows.
//!         5. Implicit containers and paragraphs. See [grouping] and [paragraphs].
//!
//!     A header looks up its parent before deriving its identifier, because the parent
//!     decides the scope prefix.
//!
//! Traversal
//!
//!     The pass runs over an explicit worklist, never recursing over sibling lists, so
//!     long flat documents cannot exhaust the stack. A node is handled, then its argument
//!     lists are rewritten (containers first, paragraphs second), then the rewritten
//!     children are pushed so synthetic wrappers are visited like any other node.
//!
//!     The worklist is a stack popped in document pre-order, not a level by level queue.
//!     Numbering, the header tree and the "current header" used for scopes and link
//!     sources all follow the order the author wrote things in: in
//!     `\Q[\C[[x]]{title=A}]\C[[y]]{title=B}` block A is number 1.
//!
//! Scopes
//!
//!     A header with a truthy `scope` argument prefixes every identifier defined below it
//!     in the header tree with `<its id>/`. Links are tried in every enclosing scope, the
//!     innermost first, which is why one `\x` may produce several candidate rows.

pub mod grouping;
pub mod headers;
pub mod ids;
pub mod paragraphs;

use crate::sigil::ast::{Argument, Ast, Diagnostic, MacroNode, NodeId, Position};
use crate::sigil::index::{Extraction, IdIndex, IdRecord, RefType, Reference, Site};
use crate::sigil::lexing::TOPLEVEL_MACRO;
use crate::sigil::registry::defaults::{HEADER_MACRO, INCLUDE_MACRO, XREF_MACRO};
use crate::sigil::registry::{MacroDef, MacroRegistry};
use crate::sigil::render::{document_title, TextContext};
use crate::sigil::resolving::inflection;
use headers::{parse_level, HeaderId, HeaderTree};
use std::collections::{BTreeMap, HashMap};

/// Build a synthetic macro node whose `content` argument holds `content`
///
/// Returns `None` when the registry does not know `name` or the macro has no `content`.
pub fn synthetic_macro(
    ast: &mut Ast,
    registry: &MacroRegistry,
    name: &str,
    content: Vec<NodeId>,
    position: Position,
) -> Option<NodeId> {
    let def = registry.get(name)?;
    if !def.declares("content") {
        return None;
    }
    let mut node = MacroNode::new(name);
    node.synthetic = true;
    let mut content = Some(content);
    for arg in def.argument_names() {
        let mut argument = Argument::new(arg, position, false);
        if arg == "content" {
            if let Some(children) = content.take() {
                argument.children = children;
                argument.supplied = true;
            }
        }
        if argument.children.is_empty() {
            argument.children = vec![ast.push_plaintext("", position)];
        }
        node.args.push(argument);
    }
    Some(ast.push_macro(node, position))
}

/// Truthy value of a flag argument: supplied with anything but empty or `0`
pub fn is_truthy(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text != "0"
}

#[derive(Debug, Clone, Default)]
pub struct PostProcessOutput {
    pub index: IdIndex,
    pub headers: HeaderTree,
    pub extraction: Extraction,
    /// Position of each link's target argument, mapped to the `x` node
    pub xref_sites: BTreeMap<Position, NodeId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the whole post-processing pass over a freshly parsed document
pub fn post_process(ast: &mut Ast, registry: &MacroRegistry, document: &str) -> PostProcessOutput {
    let output = PostProcessor::new(ast, registry, document).run();
    tracing::debug!(
        document,
        ids = output.index.len(),
        headers = output.headers.header_count(),
        references = output.extraction.references.len(),
        diagnostics = output.diagnostics.len(),
        "post-processed document"
    );
    output
}

struct Visit {
    node: NodeId,
    /// Identifier of the header whose title this node sits in
    title_of: Option<String>,
}

pub struct PostProcessor<'a> {
    ast: &'a mut Ast,
    registry: &'a MacroRegistry,
    document: &'a str,
    index: IdIndex,
    headers: HeaderTree,
    references: Vec<Reference>,
    xref_sites: BTreeMap<Position, NodeId>,
    diagnostics: Vec<Diagnostic>,
    counters: HashMap<String, usize>,
    header_ids: HashMap<HeaderId, String>,
    scopes: HashMap<HeaderId, String>,
    last_header_id: Option<String>,
    toplevel_id: Option<String>,
}

impl<'a> PostProcessor<'a> {
    pub fn new(ast: &'a mut Ast, registry: &'a MacroRegistry, document: &'a str) -> Self {
        let root = (!ast.is_empty()).then(|| ast.root());
        Self {
            ast,
            registry,
            document,
            index: IdIndex::new(),
            headers: HeaderTree::new(root),
            references: Vec::new(),
            xref_sites: BTreeMap::new(),
            diagnostics: Vec::new(),
            counters: HashMap::new(),
            header_ids: HashMap::new(),
            scopes: HashMap::new(),
            last_header_id: None,
            toplevel_id: None,
        }
    }

    pub fn run(mut self) -> PostProcessOutput {
        if self.ast.is_empty() {
            return PostProcessOutput {
                extraction: Extraction::new(self.document),
                ..PostProcessOutput::default()
            };
        }
        let root = self.ast.root();
        self.register_toplevel(root);

        let mut stack = vec![Visit {
            node: root,
            title_of: None,
        }];
        while let Some(visit) = stack.pop() {
            let Some(name) = self.ast.macro_name(visit.node).map(str::to_string) else {
                continue;
            };
            let title_of = if visit.node == root {
                None
            } else {
                self.visit_macro(visit.node, &name, visit.title_of.as_deref())
            };
            self.rewrite_arguments(visit.node, &name, visit.node == root);

            let Some(node) = self.ast.macro_node(visit.node) else {
                continue;
            };
            for arg in node.args.iter().rev() {
                let context = if name == HEADER_MACRO && arg.name == "title" {
                    Some(title_of.clone().unwrap_or_default())
                } else {
                    visit.title_of.clone()
                };
                for child in arg.children.iter().rev() {
                    stack.push(Visit {
                        node: *child,
                        title_of: context.clone(),
                    });
                }
            }
        }

        self.finish_toplevel();
        let mut extraction = Extraction::new(self.document);
        extraction.ids = self
            .index
            .records()
            .map(|r| (r.id.clone(), r.clone()))
            .collect();
        extraction.references = self.references;
        PostProcessOutput {
            index: self.index,
            headers: self.headers,
            extraction,
            xref_sites: self.xref_sites,
            diagnostics: self.diagnostics,
        }
    }

    fn text(&self, node: NodeId, arg: &str) -> String {
        TextContext::new(&*self.ast, self.registry).arg_text(node, arg)
    }

    fn site(&self, position: Position) -> Site {
        Site::new(self.document, position)
    }

    fn error(&mut self, position: Position, message: String, code: &str) {
        self.diagnostics.push(
            Diagnostic::semantic(position, message)
                .with_code(code)
                .with_document(self.document),
        );
    }

    fn register_toplevel(&mut self, root: NodeId) {
        if self.document.is_empty() {
            return;
        }
        let position = self.ast.get(root).position;
        let record = IdRecord::new(self.document, TOPLEVEL_MACRO, self.site(position));
        if self.index.insert(root, record).is_ok() {
            if let Some(m) = self.ast.macro_node_mut(root) {
                m.id = Some(self.document.to_string());
            }
            self.toplevel_id = Some(self.document.to_string());
        }
    }

    fn finish_toplevel(&mut self) {
        let Some(id) = self.toplevel_id.clone() else {
            return;
        };
        let title = document_title(self.ast, self.registry, &self.headers);
        if let Some(record) = self.index.record_mut(&id) {
            record.title = title.trim().to_string();
        }
    }

    /// Returns the node's identifier when it is a header, for its title children
    fn visit_macro(&mut self, node: NodeId, name: &str, title_of: Option<&str>) -> Option<String> {
        let registry = self.registry;
        let def = registry.get(name)?;
        match name {
            HEADER_MACRO => return self.visit_header(node, def),
            XREF_MACRO => self.extract_xref(node, title_of),
            INCLUDE_MACRO => self.extract_include(node),
            _ => {}
        }
        let scope = self.scope(false);
        self.assign_id(node, def, scope.as_deref(), true);
        None
    }

    /// Identifier of the nearest scoped header on the open chain
    fn scope(&self, skip_current: bool) -> Option<String> {
        let skip = usize::from(skip_current);
        self.headers
            .open_chain()
            .iter()
            .rev()
            .skip(skip)
            .find_map(|h| self.scopes.get(h).cloned())
    }

    /// All enclosing scopes, innermost first
    fn scope_chain(&self) -> Vec<String> {
        self.headers
            .open_chain()
            .iter()
            .rev()
            .filter_map(|h| self.scopes.get(h).cloned())
            .collect()
    }

    /// Identifier links written at this point originate from
    fn current_source(&self) -> String {
        let current = self.headers.current();
        self.header_ids
            .get(&current)
            .cloned()
            .or_else(|| self.toplevel_id.clone())
            .unwrap_or_default()
    }

    fn assign_id(
        &mut self,
        node: NodeId,
        def: &MacroDef,
        scope: Option<&str>,
        numbered: bool,
    ) -> Option<String> {
        if !(def.declares("id") || def.declares("title")) {
            return None;
        }
        let m = self.ast.macro_node(node)?;
        let local = if m.is_supplied("id") {
            self.text(node, "id")
        } else if m.is_supplied("title") {
            ids::prefixed_title_to_id(&self.text(node, "title"), &def.id_prefix)
        } else {
            return None;
        };
        if local.is_empty() {
            return None;
        }
        let id = ids::scoped(scope, &local);
        let position = self.ast.get(node).position;

        let mut record = IdRecord::new(id.clone(), def.name.clone(), self.site(position));
        record.title = self.text(node, "title").trim().to_string();
        record.caption_prefix = def.caption_prefix.clone();
        record.xref_style = def.xref_style;
        record.is_header = def.name == HEADER_MACRO;

        if let Err(previous) = self.index.insert(node, record) {
            let message = format!(
                "duplicate id \"{}\", previous definition at {}",
                id, previous.location
            );
            self.error(position, message, "duplicate-id");
            return None;
        }

        let count = if numbered {
            let counter = self.counters.entry(def.name.clone()).or_insert(0);
            *counter += 1;
            Some(*counter)
        } else {
            None
        };
        if let Some(record) = self.index.record_mut(&id) {
            record.count = count;
        }
        if let Some(m) = self.ast.macro_node_mut(node) {
            m.id = Some(id.clone());
            m.count = count;
        }
        Some(id)
    }

    fn visit_header(&mut self, node: NodeId, def: &MacroDef) -> Option<String> {
        let position = self.ast.get(node).position;
        let level_text = self.text(node, "level");
        let level = match parse_level(&level_text) {
            Some(level) => level,
            None => {
                self.error(
                    position,
                    format!(
                        "header level must be a positive integer, found \"{}\"",
                        level_text.trim()
                    ),
                    "bad-header-level",
                );
                1
            }
        };
        let synonym = is_truthy(&self.text(node, "synonym"));
        let scoped = is_truthy(&self.text(node, "scope"));

        if synonym {
            return self.visit_synonym(node, def, level, position);
        }

        let linked = self.headers.link(node, level);
        if let Some((previous, current)) = linked.skipped {
            self.error(
                position,
                format!("header level skipped: {} -> {}", previous, current),
                "header-level-skipped",
            );
        }
        if let Some(m) = self.ast.macro_node_mut(node) {
            m.header = Some(linked.id);
        }

        let scope = self.scope(true);
        let id = self.assign_id(node, def, scope.as_deref(), true)?;
        if let Some(record) = self.index.record_mut(&id) {
            record.level = Some(level);
            record.scope = scoped;
        }
        self.header_ids.insert(linked.id, id.clone());
        if scoped {
            self.scopes.insert(linked.id, id.clone());
        }
        self.last_header_id = Some(id.clone());

        let parent = if linked.parent == self.headers.root() {
            self.toplevel_id.clone()
        } else {
            self.header_ids.get(&linked.parent).cloned()
        };
        self.references.push(Reference::new(
            parent.unwrap_or_default(),
            id.clone(),
            RefType::StructuralParent,
            self.site(position),
        ));
        Some(id)
    }

    fn visit_synonym(
        &mut self,
        node: NodeId,
        def: &MacroDef,
        level: usize,
        position: Position,
    ) -> Option<String> {
        let scope = self.scope(true);
        let id = self.assign_id(node, def, scope.as_deref(), false)?;
        let target = self.last_header_id.clone();
        if let Some(record) = self.index.record_mut(&id) {
            record.level = Some(level);
            record.synonym_of = target.clone();
        }
        match target {
            Some(target) => self.references.push(Reference::new(
                id.clone(),
                target,
                RefType::Synonym,
                self.site(position),
            )),
            None => self.error(
                position,
                "synonym header without a previous header".to_string(),
                "orphan-synonym",
            ),
        }
        Some(id)
    }

    fn extract_xref(&mut self, node: NodeId, title_of: Option<&str>) {
        let Some(href) = self.ast.macro_node(node).and_then(|m| m.arg("href")) else {
            return;
        };
        let at = href.position;
        let text = self.text(node, "href");
        let magic = is_truthy(&self.text(node, "magic"));
        let base = if magic {
            ids::title_to_id(&text)
        } else {
            text
        };

        let mut candidates: Vec<(String, bool)> = Vec::new();
        let mut push = |to: String, inflected: bool| {
            if !candidates.iter().any(|(c, _)| *c == to) {
                candidates.push((to, inflected));
            }
        };
        if base.is_empty() {
            push(String::new(), false);
        } else {
            let variants = if magic {
                inflection::variants(&base)
            } else {
                Vec::new()
            };
            let scopes = self.scope_chain();
            let all_scopes = scopes.iter().map(|s| Some(s.as_str())).chain([None]);
            for scope in all_scopes {
                push(ids::scoped(scope, &base), false);
                for variant in &variants {
                    push(ids::scoped(scope, variant), true);
                }
            }
        }

        let from = match title_of {
            Some(header) => header.to_string(),
            None => self.current_source(),
        };
        let site = self.site(at);
        for (to, inflected) in &candidates {
            self.references.push(
                Reference::new(from.clone(), to.clone(), RefType::CrossReference, site.clone())
                    .inflected(*inflected),
            );
            if title_of.is_some() {
                self.references.push(
                    Reference::new(from.clone(), to.clone(), RefType::TitleInTitle, site.clone())
                        .inflected(*inflected),
                );
            }
        }
        self.xref_sites.insert(at, node);
    }

    fn extract_include(&mut self, node: NodeId) {
        let Some(href) = self.ast.macro_node(node).and_then(|m| m.arg("href")) else {
            return;
        };
        let at = href.position;
        let target = self.text(node, "href").trim().to_string();
        let from = self.current_source();
        self.references.push(Reference::new(
            from,
            target,
            RefType::StructuralParent,
            self.site(at),
        ));
    }

    fn rewrite_arguments(&mut self, node: NodeId, name: &str, is_root: bool) {
        let Some(m) = self.ast.macro_node(node) else {
            return;
        };
        let args: Vec<(String, Vec<NodeId>)> = m
            .args
            .iter()
            .map(|a| (a.name.clone(), a.children.clone()))
            .collect();
        for (arg, children) in args {
            let had_break = paragraphs::has_paragraph_break(self.ast, &children);
            let mut rewritten =
                grouping::group_auto_parent(self.ast, self.registry, name, children.clone());
            if had_break || (is_root && arg == "content") {
                rewritten = paragraphs::insert_paragraphs(self.ast, self.registry, rewritten);
            }
            if rewritten != children {
                self.ast.set_children(node, &arg, rewritten);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigil::lexing::tokenize;
    use crate::sigil::parsing::parse;

    fn process(source: &str, document: &str) -> (Ast, PostProcessOutput) {
        let registry = MacroRegistry::with_defaults();
        let mut ast = parse(&tokenize(source).tokens, &registry, false).ast;
        let output = post_process(&mut ast, &registry, document);
        (ast, output)
    }

    fn content_names(ast: &Ast) -> Vec<String> {
        let root = ast.macro_node(ast.root()).expect("toplevel");
        root.children("content")
            .iter()
            .map(|c| ast.get(*c).node_type().to_string())
            .collect()
    }

    #[test]
    fn test_ids_and_counts() {
        let (ast, output) = process("\\h[1][Intro]\n\n\\h[2][Details]{id=more}", "");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let intro = output.index.node("intro").expect("intro");
        assert_eq!(ast.macro_node(intro).and_then(|m| m.count), Some(1));
        let more = output.index.record("more").expect("more");
        assert_eq!(more.count, Some(2));
        assert_eq!(more.level, Some(2));
        assert_eq!(more.title, "Details");
    }

    #[test]
    fn test_header_skip_diagnostic() {
        let (_, output) = process("\\h[1][a]\n\\h[3][b]", "");
        assert_eq!(output.diagnostics.len(), 1);
        let d = &output.diagnostics[0];
        assert_eq!(d.message, "header level skipped: 1 -> 3");
        assert_eq!((d.line(), d.column()), (2, 1));
    }

    #[test]
    fn test_bad_level() {
        let (_, output) = process("\\h[x][a]", "");
        assert_eq!(
            output.diagnostics[0].message,
            "header level must be a positive integer, found \"x\""
        );
        assert_eq!(output.index.record("a").and_then(|r| r.level), Some(1));
    }

    #[test]
    fn test_duplicate_id_names_previous() {
        let (_, output) = process("\\h[1][A]\n\n\\h[1][A]", "doc");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(
            output.diagnostics[0].message,
            "duplicate id \"a\", previous definition at doc:1:1"
        );
        assert_eq!(output.diagnostics[0].line(), 3);
    }

    #[test]
    fn test_prefixed_ids() {
        let (_, output) = process("\\C[[x]]{title=Hello World}", "");
        let record = output.index.record("code-hello-world").expect("code");
        assert_eq!(record.caption_prefix, "Code");
        assert_eq!(record.count, Some(1));
    }

    #[test]
    fn test_nested_nodes_numbered_in_document_order() {
        let (_, output) = process("\\Q[\\C[[x]]{title=A}]\n\n\\C[[y]]{title=B}", "");
        let nested = output.index.record("code-a").expect("nested code");
        let later = output.index.record("code-b").expect("later code");
        assert_eq!(nested.count, Some(1));
        assert_eq!(later.count, Some(2));
    }

    #[test]
    fn test_paragraphs_at_toplevel() {
        let (ast, _) = process("\np1\n\np2\n\np3\n", "");
        assert_eq!(content_names(&ast), vec!["p", "p", "p"]);
    }

    #[test]
    fn test_header_not_wrapped() {
        let (ast, _) = process("\\h[1][A]\n\nbody", "");
        assert_eq!(content_names(&ast), vec!["h", "p"]);
    }

    #[test]
    fn test_auto_parent_list() {
        let (ast, _) = process("\\L[a]\n\\L[b]", "");
        assert_eq!(content_names(&ast), vec!["Ul"]);
    }

    #[test]
    fn test_scope_prefixes_descendants() {
        let (_, output) = process(
            "\\h[1][Animals]{scope=1}\n\n\\h[2][Dog]\n\n\\C[[x]]{id=bark}\n\n\\h[1][Plants]",
            "",
        );
        assert!(output.index.contains("animals"));
        assert!(output.index.contains("animals/dog"));
        assert!(output.index.contains("animals/bark"));
        assert!(output.index.contains("plants"));
    }

    #[test]
    fn test_structural_rows() {
        let (_, output) = process("\\h[1][A]\n\n\\h[2][B]", "doc");
        let rows: Vec<(&str, &str)> = output
            .extraction
            .references
            .iter()
            .filter(|r| r.ref_type == RefType::StructuralParent)
            .map(|r| (r.from.as_str(), r.to.as_str()))
            .collect();
        assert_eq!(rows, vec![("doc", "a"), ("a", "b")]);
        assert_eq!(output.index.record("doc").map(|r| r.title.as_str()), Some("A"));
    }

    #[test]
    fn test_synonym_header() {
        let (_, output) = process("\\h[1][Dog]\n\n\\h[1][Doggo]{synonym=1}", "");
        let synonym = output.index.record("doggo").expect("synonym");
        assert_eq!(synonym.synonym_of.as_deref(), Some("dog"));
        assert_eq!(synonym.count, None);
        assert_eq!(output.headers.header_count(), 1);
        assert!(output
            .extraction
            .references
            .iter()
            .any(|r| r.ref_type == RefType::Synonym && r.from == "doggo" && r.to == "dog"));
    }

    #[test]
    fn test_magic_candidates() {
        let (ast, output) = process(
            "\\h[1][Zoo]{scope=1}\n\nsee \\x[Dogs]{magic=1}",
            "",
        );
        let candidates: Vec<(&str, bool)> = output
            .extraction
            .references
            .iter()
            .filter(|r| r.ref_type == RefType::CrossReference)
            .map(|r| (r.to.as_str(), r.inflected))
            .collect();
        assert_eq!(
            candidates,
            vec![
                ("zoo/dogs", false),
                ("zoo/dog", true),
                ("dogs", false),
                ("dog", true),
            ]
        );
        let site = output
            .extraction
            .references
            .iter()
            .find(|r| r.ref_type == RefType::CrossReference)
            .map(|r| r.defined_at.position);
        let node = site.and_then(|p| output.xref_sites.get(&p).copied()).expect("site");
        assert_eq!(ast.macro_name(node), Some("x"));
    }

    #[test]
    fn test_title_in_title_rows() {
        let (_, output) = process("\\h[1][A]\n\n\\h[2][About \\x[a]]", "");
        let row = output
            .extraction
            .references
            .iter()
            .find(|r| r.ref_type == RefType::TitleInTitle)
            .expect("title row");
        assert_eq!(row.from, "about-a");
        assert_eq!(row.to, "a");
    }

    #[test]
    fn test_include_row() {
        let (_, output) = process("\\Include[other]", "index");
        let row = output
            .extraction
            .references
            .iter()
            .find(|r| r.ref_type == RefType::StructuralParent)
            .expect("include row");
        assert_eq!((row.from.as_str(), row.to.as_str()), ("index", "other"));
    }
}
