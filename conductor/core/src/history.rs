//! History Store
//!
//! Insertion-ordered record of past successful resolutions, newest first.
//! Lives for the session only. Entries are never edited or removed, and
//! only the Conductor's success path adds to it.

use std::collections::VecDeque;

use serde::{Serialize, Serializer};

use crate::ids::HistoryId;
use crate::messages::HistoryEntry;

/// Newest-first history of successful resolutions
#[derive(Clone, Debug, Default)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the front
    pub(crate) fn prepend(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
    }

    /// Iterate entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter()
    }

    /// Most recent entry
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Entry at `index` (0 = newest)
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Look up an entry by id
    #[must_use]
    pub fn get(&self, id: &HistoryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// Whether an id is already in use
    #[must_use]
    pub fn contains(&self, id: &HistoryId) -> bool {
        self.get(id).is_some()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all entries, newest first
    #[must_use]
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Serialize for HistoryStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}
