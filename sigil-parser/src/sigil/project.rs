//! Multi document batches
//!
//!     A project compiles several documents that share one identifier namespace. The
//!     batch runs in four phases:
//!
//!         1. Parse and post-process every document, in parallel.
//!         2. Merge each extraction into the store, one at a time under the store lock.
//!            An identifier already defined by another document is reported on the later
//!            document and dropped from its extraction.
//!         3. Once every merge is done, disambiguate all reference rows of the project
//!            against the store, deleting the rows that lose.
//!         4. Render every document, in parallel, against the now read-only store.
//!
//!     Phase 3 is the barrier: a link may target a document that merges after the one
//!     writing it, so nothing is resolved before the store holds the whole project.
//!
//! Reachability
//!
//!     `Include` rows form the document graph. Documents the index document cannot reach
//!     get a warning; they still compile.

use crate::sigil::ast::{CompileError, Diagnostic, Position};
use crate::sigil::index::{RefType, Reference};
use crate::sigil::pipeline::{
    analyze, check_registry, finish, render, Analysis, CompileOptions, CompileOutput,
};
use crate::sigil::registry::MacroRegistry;
use crate::sigil::resolving::{disambiguate, resolutions, unresolved_diagnostics};
use crate::sigil::store::{IdStore, MemoryStore};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Name of the document reachability starts from, unless configured otherwise
pub const DEFAULT_INDEX_DOCUMENT: &str = "index";

#[derive(Debug, Clone)]
pub struct DocumentOutput {
    pub name: String,
    pub output: CompileOutput,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectOutput {
    pub documents: Vec<DocumentOutput>,
    /// Problems of the project as a whole rather than of one construct
    pub diagnostics: Vec<Diagnostic>,
}

impl ProjectOutput {
    pub fn document(&self, name: &str) -> Option<&CompileOutput> {
        self.documents
            .iter()
            .find(|d| d.name == name)
            .map(|d| &d.output)
    }

    /// Every diagnostic, document ones first
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.documents
            .iter()
            .flat_map(|d| d.output.diagnostics.iter())
            .chain(self.diagnostics.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.all_diagnostics().any(Diagnostic::is_error)
    }
}

pub struct Project<S: IdStore = MemoryStore> {
    registry: Arc<MacroRegistry>,
    store: Mutex<S>,
    documents: Vec<(String, String)>,
    index_document: Option<String>,
}

impl<S: IdStore> Project<S> {
    pub fn new(registry: Arc<MacroRegistry>, store: S) -> Self {
        Self {
            registry,
            store: Mutex::new(store),
            documents: Vec::new(),
            index_document: None,
        }
    }

    /// Add or replace a document
    pub fn add_document(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        let source = source.into();
        match self.documents.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = source,
            None => self.documents.push((name, source)),
        }
    }

    pub fn with_index_document(mut self, name: impl Into<String>) -> Self {
        self.index_document = Some(name.into());
        self
    }

    pub fn document_names(&self) -> Vec<String> {
        self.documents.iter().map(|(n, _)| n.clone()).collect()
    }

    /// The document reachability starts from
    pub fn index_document(&self) -> Option<String> {
        let names = self.document_names();
        let configured = self
            .index_document
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX_DOCUMENT.to_string());
        if names.contains(&configured) {
            Some(configured)
        } else {
            names.into_iter().next()
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_store(self) -> S {
        self.store
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Structural ancestors of `id`, nearest first
    ///
    /// Follows header parents up to the toplevel, then the `Include` that pulled the
    /// document in, and so on.
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let store = self.lock();
        let mut seen = BTreeSet::from([id.to_string()]);
        let mut out = Vec::new();
        let mut current = id.to_string();
        loop {
            let rows = store.references_to(RefType::StructuralParent, &[current.clone()], false);
            let Some(parent) = rows
                .into_iter()
                .map(|row| row.reference.from)
                .find(|from| !from.is_empty())
            else {
                break;
            };
            if !seen.insert(parent.clone()) {
                break;
            }
            out.push(parent.clone());
            current = parent;
        }
        out
    }

    pub fn compile(&self, options: &CompileOptions) -> Result<ProjectOutput, CompileError> {
        check_registry(&self.registry)?;
        let names = self.document_names();
        tracing::debug!(documents = names.len(), "compiling project");

        let registry = &*self.registry;
        let mut analyses: Vec<Analysis> = self
            .documents
            .par_iter()
            .map(|(name, source)| analyze(source, name, registry, options.show_parse))
            .collect();

        self.lock().clear(&names);
        for analysis in &mut analyses {
            self.merge(analysis);
        }

        let (references, outcome) = {
            let mut store = self.lock();
            let rows = store.references_in(&names);
            let references: Vec<Reference> = rows.iter().map(|r| r.reference.clone()).collect();
            let outcome = disambiguate(&references, |r| {
                let known = |id: &str| !store.lookup(&[id.to_string()], &[]).is_empty();
                (r.from.is_empty() || known(&r.from)) && known(&r.to)
            });
            let rejected: Vec<_> = outcome.rejected.iter().map(|i| rows[*i].id).collect();
            store.delete(&rejected);
            tracing::debug!(
                rows = rows.len(),
                rejected = rejected.len(),
                unresolved = outcome.unresolved.len(),
                "disambiguated project references"
            );
            (references, outcome)
        };

        let mut unresolved: BTreeMap<String, Vec<Diagnostic>> = BTreeMap::new();
        for diagnostic in unresolved_diagnostics(&outcome) {
            unresolved
                .entry(diagnostic.document.clone())
                .or_default()
                .push(diagnostic);
        }

        let store = self.lock();
        let store_ref: &dyn IdStore = &*store;
        let rendered: Vec<(String, Vec<Diagnostic>)> = analyses
            .par_iter()
            .map(|analysis| {
                let links = resolutions(
                    &analysis.document,
                    &analysis.xref_sites,
                    &references,
                    &outcome,
                );
                render(analysis, registry, Some(store_ref), &links, options)
            })
            .collect();

        let diagnostics = self.reachability(&*store, &names);
        drop(store);

        let documents = analyses
            .into_iter()
            .zip(rendered)
            .map(|(analysis, (output, render_diagnostics))| {
                let name = analysis.document.clone();
                let mut extra = unresolved.remove(&name).unwrap_or_default();
                extra.extend(render_diagnostics);
                let options = CompileOptions {
                    document: name.clone(),
                    ..options.clone()
                };
                DocumentOutput {
                    output: finish(analysis, output, extra, &options),
                    name,
                }
            })
            .collect();

        Ok(ProjectOutput {
            documents,
            diagnostics,
        })
    }

    /// Phase 2 for one document
    fn merge(&self, analysis: &mut Analysis) {
        let mut store = self.lock();
        let ids: Vec<String> = analysis.extraction.ids.keys().cloned().collect();
        let taken = store.lookup(&ids, std::slice::from_ref(&analysis.document));
        for previous in taken {
            let Some(ours) = analysis.extraction.ids.remove(&previous.id) else {
                continue;
            };
            analysis.diagnostics.push(
                Diagnostic::semantic(
                    ours.location.position,
                    format!(
                        "duplicate id \"{}\", previous definition at {}",
                        previous.id, previous.location
                    ),
                )
                .with_code("duplicate-id")
                .with_document(analysis.document.clone()),
            );
        }
        let stored = store.update(&analysis.extraction);
        tracing::trace!(
            document = %analysis.document,
            ids = analysis.extraction.ids.len(),
            references = stored.len(),
            "merged extraction"
        );
    }

    fn reachability(&self, store: &S, names: &[String]) -> Vec<Diagnostic> {
        let Some(start) = self.index_document() else {
            return Vec::new();
        };
        let documents: BTreeSet<&String> = names.iter().collect();
        let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in store.references_in(names) {
            let reference = row.reference;
            if reference.ref_type == RefType::StructuralParent
                && documents.contains(&reference.to)
            {
                edges
                    .entry(reference.defined_at.document)
                    .or_default()
                    .push(reference.to);
            }
        }

        let mut reached = BTreeSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);
        while let Some(document) = queue.pop_front() {
            for next in edges.get(&document).into_iter().flatten() {
                if reached.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }

        names
            .iter()
            .filter(|name| !reached.contains(*name))
            .map(|name| {
                Diagnostic::semantic(
                    Position::new(1, 1),
                    "document is not reachable from the index document",
                )
                .with_code("unreachable-document")
                .with_document(name.clone())
                .as_warning()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(documents: &[(&str, &str)]) -> Project {
        let mut project =
            Project::new(Arc::new(MacroRegistry::with_defaults()), MemoryStore::new());
        for (name, source) in documents {
            project.add_document(*name, *source);
        }
        project
    }

    fn body_only() -> CompileOptions {
        CompileOptions {
            body_only: true,
            ..CompileOptions::default()
        }
    }

    #[test]
    fn test_cross_document_link() {
        let project = project(&[
            ("index", "\\h[1][Home]\n\nsee \\x[cats]\n\n\\Include[zoo]"),
            ("zoo", "\\h[1][Animals]\n\n\\h[2][Cats]"),
        ]);
        let out = project.compile(&body_only()).expect("compile");
        assert!(!out.has_errors(), "{:?}", out.all_diagnostics().collect::<Vec<_>>());
        let index = out.document("index").expect("index");
        assert!(index.output.contains("<a href=\"zoo.html#cats\">Cats</a>"));
        assert!(index
            .output
            .contains("<p class=\"include\"><a href=\"zoo.html\">Animals</a></p>"));
    }

    #[test]
    fn test_links_use_configured_extension() {
        let project = project(&[
            ("index", "see \\x[cats]\n\n\\Include[zoo]"),
            ("zoo", "\\h[1][Animals]\n\n\\h[2][Cats]"),
        ]);
        let options = CompileOptions {
            extension: "xhtml".to_string(),
            ..body_only()
        };
        let out = project.compile(&options).expect("compile");
        let index = out.document("index").expect("index");
        assert!(index.output.contains("<a href=\"zoo.xhtml#cats\">Cats</a>"));
        assert!(index.output.contains("<a href=\"zoo.xhtml\">Animals</a>"));
        assert!(!index.output.contains(".html"));
    }

    #[test]
    fn test_link_to_later_document_resolves() {
        let project = project(&[
            ("index", "\\x[zebra]{magic=1}\n\n\\Include[z]"),
            ("z", "\\h[1][Zebras]"),
        ]);
        let out = project.compile(&body_only()).expect("compile");
        let index = out.document("index").expect("index");
        assert!(index.diagnostics.is_empty(), "{:?}", index.diagnostics);
        assert!(index.output.contains("z.html#zebras"));
    }

    #[test]
    fn test_cross_document_duplicate() {
        let project = project(&[("index", "\\h[1][Same]"), ("other", "\\h[1][Same]")]);
        let out = project.compile(&body_only()).expect("compile");
        let other = out.document("other").expect("other");
        let duplicate = other
            .diagnostics
            .iter()
            .find(|d| d.code.as_deref() == Some("duplicate-id"))
            .expect("duplicate diagnostic");
        assert_eq!(
            duplicate.message,
            "duplicate id \"same\", previous definition at index:1:1"
        );
    }

    #[test]
    fn test_unreachable_document_warning() {
        let project = project(&[("index", "home"), ("orphan", "lost")]);
        let out = project.compile(&body_only()).expect("compile");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].document, "orphan");
        assert!(!out.diagnostics[0].is_error());
        assert!(!out.has_errors());
    }

    #[test]
    fn test_losing_candidates_are_deleted() {
        let project = project(&[("index", "\\h[1][Dog]\n\n\\x[dogs]{magic=1}")]);
        project.compile(&body_only()).expect("compile");
        let store = project.into_store();
        let rows = store.references_in(&["index".to_string()]);
        let xrefs: Vec<&str> = rows
            .iter()
            .filter(|r| r.reference.ref_type == RefType::CrossReference)
            .map(|r| r.reference.to.as_str())
            .collect();
        assert_eq!(xrefs, vec!["dog"]);
    }

    #[test]
    fn test_ancestors_cross_includes() {
        let project = project(&[
            ("index", "\\h[1][Home]\n\n\\Include[zoo]"),
            ("zoo", "\\h[1][Animals]\n\n\\h[2][Cats]"),
        ]);
        project.compile(&body_only()).expect("compile");
        assert_eq!(project.ancestors("cats"), vec!["animals", "zoo", "home", "index"]);
        assert!(project.ancestors("index").is_empty());
    }

    #[test]
    fn test_first_document_is_index_by_default() {
        let project = project(&[("readme", "a"), ("guide", "b")]);
        assert_eq!(project.index_document().as_deref(), Some("readme"));
        let project = project.with_index_document("guide");
        assert_eq!(project.index_document().as_deref(), Some("guide"));
    }
}
