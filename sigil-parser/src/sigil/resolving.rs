//! Cross reference resolution
//!
//!     Resolution happens in two steps. [`disambiguate`] reduces the candidate rows of
//!     every authored link to at most one survivor, then [`resolutions`] maps each `x` node
//!     to its surviving target (or to the target it failed to find). The renderer only ever
//!     reads that map; it never searches for targets itself.

pub mod disambiguate;
pub mod inflection;
pub mod xref;

pub use disambiguate::{disambiguate, Disambiguation, Unresolved};
pub use xref::{link_text, XrefError};

use crate::sigil::ast::{Diagnostic, NodeId, Position};
use crate::sigil::index::{RefType, Reference};
use std::collections::BTreeMap;

/// Where an `x` node points after disambiguation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Target(String),
    Unknown(String),
}

/// Map `x` nodes to their resolution
///
/// `sites` maps the position of each link's target argument to its node; rows authored
/// in other documents are ignored.
pub fn resolutions(
    document: &str,
    sites: &BTreeMap<Position, NodeId>,
    references: &[Reference],
    outcome: &Disambiguation,
) -> BTreeMap<NodeId, Resolution> {
    let mut map = BTreeMap::new();
    for i in &outcome.selected {
        let reference = &references[*i];
        if reference.ref_type != RefType::CrossReference
            || reference.defined_at.document != document
        {
            continue;
        }
        if let Some(node) = sites.get(&reference.defined_at.position) {
            map.insert(*node, Resolution::Target(reference.to.clone()));
        }
    }
    for unresolved in &outcome.unresolved {
        let (doc, position, ref_type) = &unresolved.key;
        if *ref_type != RefType::CrossReference || doc != document {
            continue;
        }
        if let Some(node) = sites.get(position) {
            map.insert(*node, Resolution::Unknown(unresolved.target.clone()));
        }
    }
    map
}

/// Diagnostics for groups where nothing resolved
pub fn unresolved_diagnostics(outcome: &Disambiguation) -> Vec<Diagnostic> {
    outcome
        .unresolved
        .iter()
        .filter_map(|unresolved| {
            let (document, position, ref_type) = &unresolved.key;
            let message = match ref_type {
                RefType::CrossReference => {
                    XrefError::UnknownTarget(unresolved.target.clone()).to_string()
                }
                RefType::StructuralParent => {
                    format!("included document not found: \"{}\"", unresolved.target)
                }
                RefType::Synonym | RefType::TitleInTitle => return None,
            };
            Some(
                Diagnostic::semantic(*position, message)
                    .with_code("unresolved-reference")
                    .with_document(document.clone()),
            )
        })
        .collect()
}
