//! Index of provisional reasoning still attached to ledger messages.
//!
//! Entries are keyed by [`MessageId`] rather than tail offsets, so interleaved
//! messages of any role never shift what an entry points at.

use crate::history::MessageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EphemeralEntry {
    pub id: MessageId,
    /// Tokens refunded when this entry's reasoning is stripped.
    pub tokens: u32,
}

/// Ordered oldest first. Ids are strictly increasing because the ledger only
/// appends with fresh ids.
#[derive(Debug, Default, Clone)]
pub struct EphemeralIndex {
    entries: Vec<EphemeralEntry>,
}

impl EphemeralIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: MessageId, tokens: u32) {
        debug_assert!(self.entries.last().is_none_or(|last| last.id < id));
        self.entries.push(EphemeralEntry { id, tokens });
    }

    /// Drops every entry for a message older than `first_live`, returning how many
    /// were dropped. Used after a prefix eviction.
    pub(crate) fn forget_before(&mut self, first_live: MessageId) -> usize {
        let dropped = self.entries.partition_point(|entry| entry.id < first_live);
        self.entries.drain(..dropped);
        dropped
    }

    pub(crate) fn take(&mut self) -> Vec<EphemeralEntry> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[EphemeralEntry] {
        &self.entries
    }
}
