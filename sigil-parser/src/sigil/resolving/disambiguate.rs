//! Candidate reduction
//!
//!     One authored link may produce several candidate rows: the target under every
//!     enclosing scope, and singular/plural variants for magic links. Rows sharing a
//!     [`GroupKey`] are candidates for the same link. Within a group, candidates are
//!     tried longest target first (the most specific scope), non-inflected before inflected
//!     at equal length, then in definition order.
//!
//!     The first resolving non-inflected and the first resolving inflected candidate are
//!     tracked; when both exist the one tried first wins. A group with no resolving
//!     candidate is reported with its shortest target.
//!
//!     The function is pure: whether a row resolves is decided by the caller, which lets the
//!     same code run against a single document's index and against a whole store.

use crate::sigil::index::{GroupKey, Reference};
use std::collections::BTreeMap;

/// A candidate group where nothing resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub key: GroupKey,
    /// Shortest candidate target, the closest to what the author wrote
    pub target: String,
}

/// Outcome of disambiguating a set of rows, as indices into the input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disambiguation {
    pub selected: Vec<usize>,
    pub rejected: Vec<usize>,
    pub unresolved: Vec<Unresolved>,
}

/// Reduce every candidate group in `references` to at most one survivor
pub fn disambiguate<F>(references: &[Reference], mut resolves: F) -> Disambiguation
where
    F: FnMut(&Reference) -> bool,
{
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for (i, reference) in references.iter().enumerate() {
        groups.entry(reference.group_key()).or_default().push(i);
    }

    let mut outcome = Disambiguation::default();
    for (key, mut members) in groups {
        // stable sort keeps definition order among equals
        members.sort_by_key(|i| {
            let r = &references[*i];
            (std::cmp::Reverse(r.to_len), r.inflected)
        });

        let mut exact: Option<usize> = None;
        let mut inflected: Option<usize> = None;
        for (rank, i) in members.iter().enumerate() {
            let reference = &references[*i];
            let slot = if reference.inflected {
                &mut inflected
            } else {
                &mut exact
            };
            if slot.is_none() && resolves(reference) {
                *slot = Some(rank);
            }
        }

        let winner = match (exact, inflected) {
            (Some(e), Some(f)) => Some(if f < e { f } else { e }),
            (Some(e), None) => Some(e),
            (None, Some(f)) => Some(f),
            (None, None) => None,
        };

        match winner {
            Some(rank) => {
                for (r, i) in members.iter().enumerate() {
                    if r == rank {
                        outcome.selected.push(*i);
                    } else {
                        outcome.rejected.push(*i);
                    }
                }
            }
            None => {
                let target = members
                    .iter()
                    .map(|i| &references[*i])
                    .min_by_key(|r| (r.to_len, r.inflected))
                    .map(|r| r.to.clone())
                    .unwrap_or_default();
                outcome.rejected.extend(members.iter().copied());
                outcome.unresolved.push(Unresolved { key, target });
            }
        }
    }
    outcome.selected.sort_unstable();
    outcome.rejected.sort_unstable();
    tracing::trace!(
        selected = outcome.selected.len(),
        rejected = outcome.rejected.len(),
        unresolved = outcome.unresolved.len(),
        "disambiguated references"
    );
    outcome
}
