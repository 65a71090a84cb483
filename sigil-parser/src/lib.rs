//! # sigil
//!
//! Compiler core for the sigil macro markup language.
//!
//! File Layout
//!
//! The compiler is a straight pipeline, and the module layout follows it stage by stage:
//!
//! src/sigil
//!   ├── lexing       Source text to flat tokens (logos lexemes + stateful argument scanning)
//!   ├── registry     The read-only macro table the parser and renderer consult
//!   ├── parsing      Tokens to the arena AST
//!   ├── assembling   Post-parse semantic pass (ids, numbering, header tree, paragraphs)
//!   ├── index        Identifier map and extracted reference rows
//!   ├── store        The identifier/reference store contract and an in-memory store
//!   ├── resolving    Candidate disambiguation and cross reference text
//!   ├── toc          Table of contents from the header tree
//!   ├── render       HTML output
//!   ├── pipeline     Single document entry point
//!   └── project      Multi document batches sharing one namespace
//!
//! For test helpers see the [testing module](sigil::testing).

#![allow(rustdoc::invalid_html_tags)]

pub mod sigil;

pub use sigil::pipeline::{compile, CompileOptions, CompileOutput};
