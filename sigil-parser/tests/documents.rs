//! End to end compilation of small documents
//!
//! Each test compiles a whole document with the default registry and checks the rendered
//! body and the diagnostics together, since most behaviors show up in both.

use sigil_parser::sigil::ast::{to_treeviz_str, DiagnosticCategory};
use sigil_parser::sigil::registry::MacroRegistry;
use sigil_parser::{compile, CompileOptions, CompileOutput};

fn body(source: &str) -> CompileOutput {
    let registry = MacroRegistry::with_defaults();
    let options = CompileOptions {
        body_only: true,
        ..CompileOptions::default()
    };
    compile(source, &options, Some(&registry), None).expect("compile")
}

fn clean(source: &str) -> String {
    let out = body(source);
    assert!(
        out.diagnostics.is_empty(),
        "unexpected diagnostics: {:#?}",
        out.diagnostics
    );
    out.output
}

fn messages(out: &CompileOutput) -> Vec<&str> {
    out.diagnostics.iter().map(|d| d.message.as_str()).collect()
}

#[test]
fn literal_argument_keeps_backslash() {
    insta::assert_snapshot!(clean("\\c[[\\ab]]").trim_end(), @r"<p><code>\ab</code></p>");
}

#[test]
fn paragraphs_split_on_blank_lines() {
    insta::assert_snapshot!(clean("\np1\n\np2\n\np3\n"), @r###"
    <p>p1</p>
    <p>p2</p>
    <p>p3</p>
    "###);
}

#[test]
fn explicit_list_matches_implicit_list() {
    let implicit = body("\\L[a]\n\\L[b]");
    let explicit = body("\\Ul[\\L[a]\n\\L[b]]");
    assert_eq!(to_treeviz_str(&implicit.ast), to_treeviz_str(&explicit.ast));
    assert_eq!(implicit.output, explicit.output);
    insta::assert_snapshot!(implicit.output, @r###"
    <ul><li>a</li>
    <li>b</li>
    </ul>
    "###);
}

#[test]
fn table_rows_are_not_regrouped() {
    insta::assert_snapshot!(
        clean("\\Table[\\Tr[\\Td[a]\\Td[b]]\\Tr[\\Td[c]]]{title=T}").trim_end(),
        @r###"
    <table id="table-t"><caption>Table 1. T</caption><tr><td>a</td>
    <td>b</td>
    </tr>
    <tr><td>c</td>
    </tr>
    </table>
    "###
    );
}

#[test]
fn header_level_skip_reported_once() {
    let out = body("\\h[1][a]\n\\h[3][b]");
    assert_eq!(messages(&out), vec!["header level skipped: 1 -> 3"]);
    let d = &out.diagnostics[0];
    assert_eq!((d.line(), d.column()), (2, 1));
    assert_eq!(d.category, DiagnosticCategory::Semantic);
    assert!(out.output.contains("<h3 id=\"b\">b</h3>"));
}

#[test]
fn three_newlines_reported_at_blank_run() {
    let out = body("p1\n\n\np2");
    assert_eq!(out.diagnostics.len(), 1);
    let d = &out.diagnostics[0];
    assert_eq!(d.category, DiagnosticCategory::Lexical);
    assert_eq!((d.line(), d.column()), (1, 3));
    assert_eq!(out.output, "<p>p1</p>\n<p>p2</p>\n");
}

#[test]
fn unknown_target_reported_at_target_argument() {
    let out = body("intro\n\nsee \\x[missing]");
    assert_eq!(messages(&out), vec!["cross reference to unknown id: \"missing\""]);
    assert_eq!((out.diagnostics[0].line(), out.diagnostics[0].column()), (3, 7));
    assert!(out.output.contains(
        "<span class=\"error-message\">cross reference to unknown id: \"missing\"</span>"
    ));
}

#[test]
fn full_style_for_code_blocks() {
    insta::assert_snapshot!(
        clean("\\C[[x]]{title=Hello}\n\nsee \\x[code-hello]"),
        @r###"
    <figure id="code-hello" class="code"><figcaption>Code 1. Hello</figcaption><pre><code>x</code></pre></figure>
    <p>see <a href="#code-hello">Code 1. "Hello"</a></p>
    "###
    );
}

#[test]
fn style_argument_overrides_default() {
    let out = clean("\\C[[x]]{title=Hello}\n\nsee \\x[code-hello]{style=short}");
    assert!(out.contains("<a href=\"#code-hello\">Hello</a>"));
}

#[test]
fn unknown_style_is_reported() {
    let out = body("\\h[1][A]\n\n\\x[a]{style=long}");
    assert_eq!(messages(&out), vec!["unknown cross reference style: \"long\""]);
}

#[test]
fn explicit_link_content_wins() {
    let out = clean("\\h[1][Dog]\n\n\\x[dog][the \\i[good] dog]");
    assert!(out.contains("<a href=\"#dog\">the <i>good</i> dog</a>"));
}

#[test]
fn synonym_links_to_named_header() {
    let out = clean("\\h[1][Dog]\n\n\\h[1][Doggo]{synonym=1}\n\n\\x[doggo]");
    assert!(out.contains("<a href=\"#dog\">Doggo</a>"));
    assert!(!out.contains("id=\"doggo\""));
}

#[test]
fn link_in_title_must_target_header() {
    let out = body("\\C[[x]]{id=snip}\n\n\\h[1][About \\x[snip]]");
    assert_eq!(
        messages(&out),
        vec!["cross reference inside a header title must target a header: \"snip\""]
    );
}

#[test]
fn link_in_title_to_header_is_fine() {
    let out = clean("\\h[1][Cats]\n\n\\h[2][Cats and \\x[cats]]");
    assert!(out.contains("<h2 id=\"cats-and-cats\">Cats and <a href=\"#cats\">Cats</a></h2>"));
}

#[test]
fn scoped_link_prefers_innermost_scope() {
    let out = clean(
        "\\h[1][Dog]\n\n\\h[1][Animals]{scope=1}\n\n\\h[2][Dog]\n\nsee \\x[dog]",
    );
    assert!(out.contains("<h2 id=\"animals/dog\">Dog</h2>"));
    assert!(out.contains("<a href=\"#animals/dog\">Dog</a>"));
}

#[test]
fn magic_link_falls_back_to_singular() {
    let out = clean("\\h[1][Mouse]\n\nmany \\x[mice]{magic=1}");
    assert!(out.contains("<a href=\"#mouse\">Mouse</a>"));
}

#[test]
fn magic_links_to_irregular_plurals() {
    let out = clean(concat!(
        "\\h[1][Movie]\n\n\\h[1][Bus]\n\n\\h[1][Hero]\n\n",
        "\\x[movies]{magic=1} \\x[buses]{magic=1} \\x[heroes]{magic=1}",
    ));
    assert!(out.contains("<a href=\"#movie\">"));
    assert!(out.contains("<a href=\"#bus\">"));
    assert!(out.contains("<a href=\"#hero\">"));
}

#[test]
fn table_of_contents() {
    insta::assert_snapshot!(clean("\\Toc\n\n\\h[1][A]\n\n\\h[2][B]"), @r###"
    <nav class="toc"><ul><li><a href="#a">1. A</a><ul><li><a href="#b">1.1. B</a></li></ul></li></ul></nav>
    <h1 id="a">A</h1>
    <h2 id="b">B</h2>
    "###);
}

#[test]
fn unknown_macro_renders_marker() {
    let out = body("\\nope[x]");
    assert_eq!(messages(&out), vec!["unknown macro name: \"nope\""]);
    assert_eq!(
        out.output,
        "<p><span class=\"error-message\">unknown macro name: \"nope\"</span></p>\n"
    );
}

#[test]
fn include_without_store_is_unresolved() {
    let out = body("\\Include[other]");
    assert_eq!(messages(&out), vec!["included document not found: \"other\""]);
}

#[test]
fn document_title_in_shell() {
    let registry = MacroRegistry::with_defaults();
    let out = compile(
        "\\h[1][Guide]\n\ntext",
        &CompileOptions::default(),
        Some(&registry),
        None,
    )
    .expect("compile");
    assert!(out.output.contains("<title>Guide</title>"));
    assert!(out.output.ends_with("</body>\n</html>\n"));
}
