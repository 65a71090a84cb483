//! Identifier and reference index
//!
//!     The post-processor produces two things for the rest of the pipeline: a map from
//!     identifier to node for the document being compiled, and an [`Extraction`] holding the
//!     cacheable [`IdRecord`]s and the [`Reference`] rows. The extraction is what gets handed
//!     to an [`IdStore`](crate::sigil::store::IdStore) so other documents can resolve links
//!     into this one.
//!
//!     Reference rows that share a [`GroupKey`] are alternative targets for one authored link
//!     (one per scope, plus inflected variants). Disambiguation keeps at most one of them.

use crate::sigil::ast::{NodeId, Position};
use crate::sigil::registry::XrefStyle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    /// Parent header to child header, or including header to included document
    StructuralParent,
    CrossReference,
    /// Synonym header to the header it names
    Synonym,
    /// Cross reference written inside a header title
    TitleInTitle,
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefType::StructuralParent => "structural-parent",
            RefType::CrossReference => "cross-reference",
            RefType::Synonym => "synonym",
            RefType::TitleInTitle => "title-in-title",
        };
        write!(f, "{}", name)
    }
}

/// A source location qualified by its document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Site {
    pub document: String,
    pub position: Position,
}

impl Site {
    pub fn new(document: impl Into<String>, position: Position) -> Self {
        Self {
            document: document.into(),
            position,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.document.is_empty() {
            write!(f, "{}", self.position)
        } else {
            write!(f, "{}:{}", self.document, self.position)
        }
    }
}

/// Candidate rows of one authored link share this key
pub type GroupKey = (String, Position, RefType);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub from: String,
    pub to: String,
    pub ref_type: RefType,
    pub defined_at: Site,
    pub inflected: bool,
    /// Length of `to` in characters, longer candidates are tried first
    pub to_len: usize,
}

impl Reference {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        ref_type: RefType,
        defined_at: Site,
    ) -> Self {
        let to = to.into();
        Self {
            from: from.into(),
            to_len: to.chars().count(),
            to,
            ref_type,
            defined_at,
            inflected: false,
        }
    }

    pub fn inflected(mut self, inflected: bool) -> Self {
        self.inflected = inflected;
        self
    }

    pub fn group_key(&self) -> GroupKey {
        (
            self.defined_at.document.clone(),
            self.defined_at.position,
            self.ref_type,
        )
    }
}

/// Identifier the store gives to a persisted reference row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReferenceId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRow {
    pub id: ReferenceId,
    pub reference: Reference,
}

/// What other documents need to know about an identified node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdRecord {
    pub id: String,
    pub document: String,
    pub macro_name: String,
    /// Title as plain text, empty when the node has none
    pub title: String,
    pub caption_prefix: String,
    pub count: Option<usize>,
    pub xref_style: XrefStyle,
    pub is_header: bool,
    pub level: Option<usize>,
    pub scope: bool,
    /// For synonym headers, the header they stand for
    pub synonym_of: Option<String>,
    pub location: Site,
}

impl IdRecord {
    pub fn new(id: impl Into<String>, macro_name: impl Into<String>, location: Site) -> Self {
        Self {
            id: id.into(),
            document: location.document.clone(),
            macro_name: macro_name.into(),
            title: String::new(),
            caption_prefix: String::new(),
            count: None,
            xref_style: XrefStyle::Short,
            is_header: false,
            level: None,
            scope: false,
            synonym_of: None,
            location,
        }
    }

    /// The record describes a whole document rather than a node in it
    pub fn is_document(&self) -> bool {
        self.macro_name == crate::sigil::lexing::TOPLEVEL_MACRO
    }
}

/// Everything one document contributes to the shared namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub document: String,
    pub ids: BTreeMap<String, IdRecord>,
    pub references: Vec<Reference>,
}

impl Extraction {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            ..Self::default()
        }
    }
}

/// Identifier map of the document being compiled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdIndex {
    nodes: BTreeMap<String, NodeId>,
    records: BTreeMap<String, IdRecord>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identifier, returning the earlier record if it was already taken
    pub fn insert(&mut self, node: NodeId, record: IdRecord) -> Result<(), &IdRecord> {
        if self.records.contains_key(&record.id) {
            return Err(&self.records[&record.id]);
        }
        self.nodes.insert(record.id.clone(), node);
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<NodeId> {
        self.nodes.get(id).copied()
    }

    pub fn record(&self, id: &str) -> Option<&IdRecord> {
        self.records.get(id)
    }

    pub fn record_mut(&mut self, id: &str) -> Option<&mut IdRecord> {
        self.records.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<IdRecord> {
        self.nodes.remove(id);
        self.records.remove(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &IdRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_insert_returns_previous() {
        let mut index = IdIndex::new();
        let first = IdRecord::new("intro", "h", Site::new("doc", Position::new(1, 1)));
        assert!(index.insert(NodeId(1), first).is_ok());

        let second = IdRecord::new("intro", "h", Site::new("doc", Position::new(3, 1)));
        let previous = index.insert(NodeId(2), second).expect_err("duplicate");
        assert_eq!(previous.location.position, Position::new(1, 1));
        assert_eq!(index.node("intro"), Some(NodeId(1)));
    }

    #[test]
    fn test_reference_group_key_and_length() {
        let site = Site::new("doc", Position::new(2, 4));
        let reference = Reference::new("", "dögs", RefType::CrossReference, site.clone());
        assert_eq!(reference.to_len, 4);
        assert_eq!(
            reference.group_key(),
            ("doc".to_string(), Position::new(2, 4), RefType::CrossReference)
        );
        assert!(!reference.inflected);
    }

    #[test]
    fn test_site_display() {
        assert_eq!(Site::new("doc", Position::new(2, 4)).to_string(), "doc:2:4");
        assert_eq!(Site::new("", Position::new(2, 4)).to_string(), "2:4");
    }
}
