//! Property-based tests over arbitrary input
//!
//! Compilation must never panic, whatever the author typed, and the toplevel node must
//! always hold a plain sequence of children.

use proptest::prelude::*;
use sigil_parser::sigil::assembling::ids::title_to_id;
use sigil_parser::sigil::ast::NodeKind;
use sigil_parser::sigil::registry::MacroRegistry;
use sigil_parser::{compile, CompileOptions};

/// Source text biased towards the characters that drive the grammar
fn markup_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-z ]{1,6}",
            Just("\\".to_string()),
            Just("\\h[1][T]".to_string()),
            Just("\\x[t]".to_string()),
            Just("\\L[i]".to_string()),
            Just("[".to_string()),
            Just("]".to_string()),
            Just("{".to_string()),
            Just("}".to_string()),
            Just("[[".to_string()),
            Just("]]".to_string()),
            Just("{id=".to_string()),
            Just("\n".to_string()),
            Just("\n\n".to_string()),
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn toplevel_content_is_a_sequence(source in markup_strategy()) {
        let registry = MacroRegistry::with_defaults();
        let out = compile(&source, &CompileOptions::default(), Some(&registry), None)
            .expect("compile");
        let root = out.ast.get(out.ast.root());
        match &root.kind {
            NodeKind::Macro(m) => {
                prop_assert_eq!(m.name.as_str(), "toplevel");
                prop_assert!(m.arg("content").is_some());
            }
            other => prop_assert!(false, "toplevel is not a macro: {:?}", other),
        }
    }

    #[test]
    fn diagnostics_have_valid_positions(source in markup_strategy()) {
        let registry = MacroRegistry::with_defaults();
        let out = compile(&source, &CompileOptions::default(), Some(&registry), None)
            .expect("compile");
        for diagnostic in &out.diagnostics {
            prop_assert!(diagnostic.line() >= 1);
            prop_assert!(diagnostic.column() >= 1);
        }
    }

    #[test]
    fn title_ids_are_normalized(title in "\\PC{0,24}") {
        let id = title_to_id(&title);
        prop_assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!id.starts_with('-'));
        prop_assert!(!id.ends_with('-'));
        prop_assert!(!id.contains("--"));
    }

    #[test]
    fn title_ids_are_stable(title in "[A-Za-z0-9 ]{0,24}") {
        let id = title_to_id(&title);
        prop_assert_eq!(title_to_id(&id), id.clone());
    }
}
