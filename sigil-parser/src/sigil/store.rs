//! Identifier and reference store
//!
//!     The store is the shared namespace across documents. In a deployed system it sits
//!     on top of a database; the core only ever talks to it through [`IdStore`]. Reads are
//!     done while rendering, writes only while a project merges extractions, so the trait
//!     splits into `&self` lookups and `&mut self` updates.
//!
//!     [`MemoryStore`] is the in-process implementation used by the command line tool and
//!     the tests.

use crate::sigil::index::{Extraction, IdRecord, RefType, Reference, ReferenceId, ReferenceRow};
use std::collections::BTreeMap;

pub trait IdStore: Send + Sync {
    /// Records for `ids`, skipping any defined in `excluded_documents`
    fn lookup(&self, ids: &[String], excluded_documents: &[String]) -> Vec<IdRecord>;

    /// Rows of `ref_type` pointing at `ids`, or leaving them when `reversed`
    fn references_to(&self, ref_type: RefType, ids: &[String], reversed: bool)
        -> Vec<ReferenceRow>;

    /// Rows authored in `documents`
    fn references_in(&self, documents: &[String]) -> Vec<ReferenceRow>;

    /// Forget everything `documents` contributed
    fn clear(&mut self, documents: &[String]);

    /// Replace the contribution of the extraction's document
    fn update(&mut self, extraction: &Extraction) -> Vec<ReferenceId>;

    fn delete(&mut self, reference_ids: &[ReferenceId]);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, IdRecord>,
    references: BTreeMap<ReferenceId, Reference>,
    next_reference: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    fn row(id: &ReferenceId, reference: &Reference) -> ReferenceRow {
        ReferenceRow {
            id: *id,
            reference: reference.clone(),
        }
    }
}

impl IdStore for MemoryStore {
    fn lookup(&self, ids: &[String], excluded_documents: &[String]) -> Vec<IdRecord> {
        ids.iter()
            .filter_map(|id| self.records.get(id))
            .filter(|record| !excluded_documents.contains(&record.document))
            .cloned()
            .collect()
    }

    fn references_to(
        &self,
        ref_type: RefType,
        ids: &[String],
        reversed: bool,
    ) -> Vec<ReferenceRow> {
        self.references
            .iter()
            .filter(|(_, r)| r.ref_type == ref_type)
            .filter(|(_, r)| {
                let endpoint = if reversed { &r.from } else { &r.to };
                ids.contains(endpoint)
            })
            .map(|(id, r)| Self::row(id, r))
            .collect()
    }

    fn references_in(&self, documents: &[String]) -> Vec<ReferenceRow> {
        self.references
            .iter()
            .filter(|(_, r)| documents.contains(&r.defined_at.document))
            .map(|(id, r)| Self::row(id, r))
            .collect()
    }

    fn clear(&mut self, documents: &[String]) {
        self.records
            .retain(|_, record| !documents.contains(&record.document));
        self.references
            .retain(|_, r| !documents.contains(&r.defined_at.document));
    }

    fn update(&mut self, extraction: &Extraction) -> Vec<ReferenceId> {
        self.clear(std::slice::from_ref(&extraction.document));
        for (id, record) in &extraction.ids {
            self.records.insert(id.clone(), record.clone());
        }
        extraction
            .references
            .iter()
            .map(|reference| {
                let id = ReferenceId(self.next_reference);
                self.next_reference += 1;
                self.references.insert(id, reference.clone());
                id
            })
            .collect()
    }

    fn delete(&mut self, reference_ids: &[ReferenceId]) {
        for id in reference_ids {
            self.references.remove(id);
        }
    }
}
