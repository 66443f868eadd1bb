//! Collection cache rules: newest-first sequences and snapshot application.
//!
//! The cache holds the best-known sequence of one collection, newest first.
//! Local mutations edit it synchronously; remote snapshots replace it
//! wholesale, except that records whose insert is still unconfirmed are
//! re-prepended so an optimistic write never vanishes under a snapshot that
//! predates it.

use crate::codec::{apply_patch, CodecError};
use std::collections::HashSet;
use uuid::Uuid;
use vault_types::{Fields, Record, RecordId, Timestamp};

/// The in-memory sequence of one synced collection.
#[derive(Clone, Debug, Default)]
pub struct CollectionCache<T: Record> {
    records: Vec<T>,
}

impl<T: Record> CollectionCache<T> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// A cache hydrated from a persisted sequence.
    pub fn from_records(records: Vec<T>) -> Self {
        Self { records }
    }

    /// The current sequence, newest first.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Clone the current sequence.
    pub fn to_vec(&self) -> Vec<T> {
        self.records.clone()
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prepend a record (newest first).
    pub fn prepend(&mut self, record: T) {
        self.records.insert(0, record);
    }

    /// Merge a partial-field patch into the record with the given id.
    ///
    /// Returns `Ok(false)` when no record matches; the sequence is
    /// untouched in that case.
    pub fn merge(&mut self, id: &RecordId, patch: &Fields) -> Result<bool, CodecError> {
        let Some(slot) = self.records.iter_mut().find(|r| r.id() == id) else {
            return Ok(false);
        };
        *slot = apply_patch(slot, patch)?;
        Ok(true)
    }

    /// Remove the record with the given id.
    ///
    /// Returns false when no record matches.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);
        self.records.len() != before
    }

    /// Rewrite a provisional record in place once its insert is confirmed.
    ///
    /// The provisional id becomes the remote id and the remote-assigned
    /// creation timestamp replaces the local one. Returns false when the
    /// record is no longer cached.
    pub fn confirm(&mut self, local_id: Uuid, remote_id: &str, created_at: Timestamp) -> bool {
        let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.id().as_provisional() == Some(local_id))
        else {
            return false;
        };
        record.set_id(RecordId::remote(remote_id));
        record.set_created_at(created_at);
        true
    }

    /// Replace the sequence with a remote snapshot.
    ///
    /// The snapshot (already newest first) becomes the sequence, with
    /// current records whose provisional id is in `unconfirmed` re-prepended
    /// in their existing relative order. Application is idempotent.
    pub fn apply_snapshot(&mut self, snapshot: Vec<T>, unconfirmed: &HashSet<Uuid>) {
        let mut next: Vec<T> = self
            .records
            .iter()
            .filter(|r| {
                r.id()
                    .as_provisional()
                    .is_some_and(|local| unconfirmed.contains(&local))
            })
            .cloned()
            .collect();
        next.extend(snapshot);
        self.records = next;
    }
}
