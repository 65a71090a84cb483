//! Single document pipeline
//!
//!     [`compile`] runs the stages in order:
//!
//!         1. Tokenize (see [lexing](crate::sigil::lexing))
//!         2. Parse against the registry (see [parsing](crate::sigil::parsing))
//!         3. Post-process (see [assembling](crate::sigil::assembling))
//!         4. Disambiguate the document's own candidate rows
//!         5. Render (see [render](crate::sigil::render))
//!
//!     Steps 1 to 3 are [`analyze`] and step 5 is [`render`]. The project batch calls them
//!     separately because its disambiguation runs over the whole store, between the two.
//!
//!     No stage aborts on a document defect. Everything found along the way ends up in
//!     [`CompileOutput::diagnostics`], stamped with the document name.

use crate::sigil::assembling::headers::HeaderTree;
use crate::sigil::assembling::post_process;
use crate::sigil::ast::{to_treeviz_str, Ast, CompileError, Diagnostic, NodeId, Position};
use crate::sigil::index::{Extraction, IdIndex, IdRecord, Reference};
use crate::sigil::lexing::{tokenize, TOPLEVEL_MACRO};
use crate::sigil::parsing::parse;
use crate::sigil::registry::{MacroRegistry, PARAGRAPH_MACRO};
use crate::sigil::render::{render_document, RenderContext};
use crate::sigil::resolving::{disambiguate, resolutions, unresolved_diagnostics, Resolution};
use crate::sigil::store::IdStore;
use crate::sigil::token::{tokens_to_string, Token};
use std::collections::BTreeMap;

/// File extension other documents are linked with, unless configured otherwise
pub const DEFAULT_EXTENSION: &str = "html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Only the rendered body, no surrounding HTML shell
    pub body_only: bool,
    pub show_tokens: bool,
    pub show_ast: bool,
    pub show_parse: bool,
    /// Name of the document; also its identifier in the shared namespace
    pub document: String,
    /// Extension of rendered documents, used in links between documents
    pub extension: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            body_only: false,
            show_tokens: false,
            show_ast: false,
            show_parse: false,
            document: String::new(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl CompileOptions {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            ..Self::default()
        }
    }
}

/// Debug dumps requested through [`CompileOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dumps {
    pub tokens: Option<String>,
    pub ast: Option<String>,
    pub parse: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub output: String,
    pub tokens: Vec<Token>,
    pub ast: Ast,
    pub diagnostics: Vec<Diagnostic>,
    /// Every identifier defined by the document
    pub ids: BTreeMap<String, IdRecord>,
    pub headers: HeaderTree,
    pub extraction: Extraction,
    pub dumps: Dumps,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// A parsed and post-processed document, ready to be resolved and rendered
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub document: String,
    pub tokens: Vec<Token>,
    pub ast: Ast,
    pub index: IdIndex,
    pub headers: HeaderTree,
    pub extraction: Extraction,
    pub xref_sites: BTreeMap<Position, NodeId>,
    pub diagnostics: Vec<Diagnostic>,
    pub trace: Vec<String>,
}

/// The registry must define every macro the compiler inserts on its own
pub fn check_registry(registry: &MacroRegistry) -> Result<(), CompileError> {
    for required in [TOPLEVEL_MACRO, PARAGRAPH_MACRO] {
        if !registry.has(required) {
            return Err(CompileError::MissingMacro(required.to_string()));
        }
    }
    Ok(())
}

/// Tokenize, parse and post-process one document
pub fn analyze(source: &str, document: &str, registry: &MacroRegistry, trace: bool) -> Analysis {
    let lexed = tokenize(source);
    let parsed = parse(&lexed.tokens, registry, trace);
    let mut ast = parsed.ast;
    let processed = post_process(&mut ast, registry, document);

    let mut diagnostics = lexed.diagnostics;
    diagnostics.extend(parsed.diagnostics);
    diagnostics.extend(processed.diagnostics);

    Analysis {
        document: document.to_string(),
        tokens: lexed.tokens,
        ast,
        index: processed.index,
        headers: processed.headers,
        extraction: processed.extraction,
        xref_sites: processed.xref_sites,
        diagnostics,
        trace: parsed.trace,
    }
}

/// Render an analyzed document with its resolved links
pub fn render(
    analysis: &Analysis,
    registry: &MacroRegistry,
    store: Option<&dyn IdStore>,
    resolutions: &BTreeMap<NodeId, Resolution>,
    options: &CompileOptions,
) -> (String, Vec<Diagnostic>) {
    let ctx = RenderContext::new(
        &analysis.ast,
        registry,
        &analysis.index,
        &analysis.headers,
        &analysis.document,
    )
    .with_store(store)
    .with_resolutions(resolutions)
    .with_extension(&options.extension);
    render_document(ctx, options.body_only)
}

/// Whether `id` names something: in this document, or elsewhere in the store
fn is_known(id: &str, index: &IdIndex, store: Option<&dyn IdStore>, document: &str) -> bool {
    if index.contains(id) {
        return true;
    }
    match store {
        Some(store) => !store
            .lookup(&[id.to_string()], &[document.to_string()])
            .is_empty(),
        None => false,
    }
}

/// Finish an analysis into a [`CompileOutput`], moving what it owns
pub fn finish(
    analysis: Analysis,
    output: String,
    extra: Vec<Diagnostic>,
    options: &CompileOptions,
) -> CompileOutput {
    let dumps = Dumps {
        tokens: options.show_tokens.then(|| tokens_to_string(&analysis.tokens)),
        ast: options.show_ast.then(|| to_treeviz_str(&analysis.ast)),
        parse: options
            .show_parse
            .then(|| analysis.trace.iter().map(|l| format!("{}\n", l)).collect()),
    };
    let mut diagnostics = analysis.diagnostics;
    diagnostics.extend(extra);
    for diagnostic in &mut diagnostics {
        if diagnostic.document.is_empty() {
            diagnostic.document = analysis.document.clone();
        }
    }
    let ids = analysis
        .index
        .records()
        .map(|r| (r.id.clone(), r.clone()))
        .collect();

    CompileOutput {
        output,
        tokens: analysis.tokens,
        ast: analysis.ast,
        diagnostics,
        ids,
        headers: analysis.headers,
        extraction: analysis.extraction,
        dumps,
    }
}

/// Compile one document
///
/// `store` is only read. Links into other documents resolve through it, but nothing this
/// document defines is written back; that is the job of
/// [`Project`](crate::sigil::project::Project).
pub fn compile(
    source: &str,
    options: &CompileOptions,
    registry: Option<&MacroRegistry>,
    store: Option<&dyn IdStore>,
) -> Result<CompileOutput, CompileError> {
    let registry = registry.ok_or(CompileError::MissingRegistry)?;
    check_registry(registry)?;

    let document = options.document.as_str();
    let analysis = analyze(source, document, registry, options.show_parse);

    let references: &[Reference] = &analysis.extraction.references;
    let outcome = disambiguate(references, |r| {
        let from_known =
            r.from.is_empty() || is_known(&r.from, &analysis.index, store, document);
        from_known && is_known(&r.to, &analysis.index, store, document)
    });
    let links = resolutions(document, &analysis.xref_sites, references, &outcome);
    tracing::debug!(
        document,
        selected = outcome.selected.len(),
        unresolved = outcome.unresolved.len(),
        "resolved references"
    );

    let mut extra = unresolved_diagnostics(&outcome);
    let (output, render_diagnostics) =
        render(&analysis, registry, store, &links, options);
    extra.extend(render_diagnostics);

    Ok(finish(analysis, output, extra, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigil::registry::MacroDef;
    use crate::sigil::render::macros::ToplevelRender;
    use std::sync::Arc;

    fn body(source: &str) -> CompileOutput {
        let registry = MacroRegistry::with_defaults();
        let options = CompileOptions {
            body_only: true,
            ..CompileOptions::default()
        };
        compile(source, &options, Some(&registry), None).expect("compile")
    }

    #[test]
    fn test_missing_registry() {
        let err = compile("x", &CompileOptions::default(), None, None).unwrap_err();
        assert_eq!(err, CompileError::MissingRegistry);
    }

    #[test]
    fn test_missing_paragraph_macro() {
        let mut registry = MacroRegistry::new();
        registry.register(
            MacroDef::new("toplevel", Arc::new(ToplevelRender)).positional(["content"]),
        );
        let err = compile("x", &CompileOptions::default(), Some(&registry), None).unwrap_err();
        assert_eq!(err, CompileError::MissingMacro("p".to_string()));
    }

    #[test]
    fn test_full_shell() {
        let registry = MacroRegistry::with_defaults();
        let out = compile("\\h[1][Hi]", &CompileOptions::default(), Some(&registry), None)
            .expect("compile");
        assert_eq!(
            out.output,
            "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Hi</title>\n</head>\n<body>\n<h1 id=\"hi\">Hi</h1>\n</body>\n</html>\n"
        );
    }

    #[test]
    fn test_local_xref() {
        let out = body("\\h[1][Dog]\n\nsee \\x[dog]");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(
            out.output,
            "<h1 id=\"dog\">Dog</h1>\n<p>see <a href=\"#dog\">Dog</a></p>\n"
        );
    }

    #[test]
    fn test_unknown_xref_points_at_target_argument() {
        let out = body("see \\x[nope]");
        assert_eq!(out.diagnostics.len(), 1);
        let d = &out.diagnostics[0];
        assert_eq!(d.message, "cross reference to unknown id: \"nope\"");
        assert_eq!((d.line(), d.column()), (1, 7));
        assert!(out.output.contains("<span class=\"error-message\">"));
    }

    #[test]
    fn test_magic_plural_resolves_to_singular() {
        let out = body("\\h[1][Dog]\n\nmany \\x[Dogs]{magic=1}");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert!(out.output.contains("<a href=\"#dog\">Dog</a>"));
    }

    #[test]
    fn test_dumps_only_when_requested() {
        let registry = MacroRegistry::with_defaults();
        let options = CompileOptions {
            show_tokens: true,
            show_parse: true,
            ..CompileOptions::default()
        };
        let out = compile("\\b[x]", &options, Some(&registry), None).expect("compile");
        let tokens = out.dumps.tokens.expect("tokens dump");
        assert!(tokens.starts_with("1:1 MACRO_NAME \"toplevel\"\n"));
        let trace = out.dumps.parse.expect("parse dump");
        assert!(trace.starts_with("parse_macro toplevel 1:1\n"));
        assert!(trace.contains("  parse_macro b 1:1\n"));
        assert!(out.dumps.ast.is_none());
    }

    #[test]
    fn test_diagnostics_carry_document() {
        let registry = MacroRegistry::with_defaults();
        let out = compile(
            "\\nope[x]",
            &CompileOptions::new("notes"),
            Some(&registry),
            None,
        )
        .expect("compile");
        assert!(out.has_errors());
        assert!(out.diagnostics.iter().all(|d| d.document == "notes"));
    }

    #[test]
    fn test_ids_reported() {
        let out = body("\\h[1][A]\n\n\\C[[x]]{id=snippet}");
        let ids: Vec<&str> = out.ids.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a", "snippet"]);
    }
}
