//! Deduplicated, insertion-ordered identifier sets.

use std::collections::HashSet;

use serde::Serialize;

use super::id::NormalizedId;

/// Unique identifiers in order of first occurrence.
///
/// Built once per run and never mutated afterwards; the scheduler iterates it
/// in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UniqueIdSet {
    ids: Vec<NormalizedId>,
}

impl UniqueIdSet {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedId> {
        self.ids.iter()
    }

    pub fn as_slice(&self) -> &[NormalizedId] {
        &self.ids
    }

    pub fn contains(&self, id: &NormalizedId) -> bool {
        self.ids.contains(id)
    }
}

impl<'a> IntoIterator for &'a UniqueIdSet {
    type Item = &'a NormalizedId;
    type IntoIter = std::slice::Iter<'a, NormalizedId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl FromIterator<NormalizedId> for UniqueIdSet {
    fn from_iter<I: IntoIterator<Item = NormalizedId>>(iter: I) -> Self {
        dedupe(iter.into_iter().map(Some))
    }
}

/// Collapse a candidate stream into unique ids, keeping first-seen order.
///
/// Absent candidates (lines with no usable id) are skipped.
pub fn dedupe<I>(candidates: I) -> UniqueIdSet
where
    I: IntoIterator<Item = Option<NormalizedId>>,
{
    let mut seen = HashSet::new();
    let ids = candidates
        .into_iter()
        .flatten()
        .filter(|id| seen.insert(id.clone()))
        .collect();
    UniqueIdSet { ids }
}
