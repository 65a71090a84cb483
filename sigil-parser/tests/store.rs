//! Single document compiles that resolve links through a store

use sigil_parser::sigil::registry::MacroRegistry;
use sigil_parser::sigil::store::{IdStore, MemoryStore};
use sigil_parser::{compile, CompileOptions};

fn options(document: &str) -> CompileOptions {
    CompileOptions {
        body_only: true,
        ..CompileOptions::new(document)
    }
}

fn store_with(document: &str, source: &str) -> MemoryStore {
    let registry = MacroRegistry::with_defaults();
    let out = compile(source, &options(document), Some(&registry), None).expect("compile");
    let mut store = MemoryStore::new();
    store.update(&out.extraction);
    store
}

#[test]
fn links_into_stored_document() {
    let store = store_with("aviary", "\\h[1][Birds]\n\n\\h[2][Geese]");
    let registry = MacroRegistry::with_defaults();
    let out = compile(
        "one \\x[goose]{magic=1}",
        &options("notes"),
        Some(&registry),
        Some(&store),
    )
    .expect("compile");
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(
        out.output,
        "<p>one <a href=\"aviary.html#geese\">Geese</a></p>\n"
    );
}

#[test]
fn stale_copy_of_own_document_is_ignored() {
    let store = store_with("notes", "\\h[1][Old]");
    let registry = MacroRegistry::with_defaults();
    let out = compile("\\x[old]", &options("notes"), Some(&registry), Some(&store))
        .expect("compile");
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].message, "cross reference to unknown id: \"old\"");
}

#[test]
fn include_of_stored_document() {
    let store = store_with("aviary", "\\h[1][Birds]");
    let registry = MacroRegistry::with_defaults();
    let out = compile("\\Include[aviary]", &options("index"), Some(&registry), Some(&store))
        .expect("compile");
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    assert_eq!(
        out.output,
        "<p class=\"include\"><a href=\"aviary.html\">Birds</a></p>\n"
    );
}

#[test]
fn extraction_records_document_and_title() {
    let registry = MacroRegistry::with_defaults();
    let out = compile("\\h[1][Birds]", &options("aviary"), Some(&registry), None).expect("compile");
    let record = out.extraction.ids.get("aviary").expect("document record");
    assert!(record.is_document());
    assert_eq!(record.title, "Birds");
}
