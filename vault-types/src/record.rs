//! The trait implemented by every synced collection record.

use crate::{RecordId, Timestamp};
use serde::{de::DeserializeOwned, Serialize};

/// A record that can live in a synced collection.
///
/// Implementations expose the record's identifier and creation timestamp so
/// the sync layer can stamp provisional ids, rewrite them on confirmation,
/// and order sequences newest-first.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The record's identifier.
    fn id(&self) -> &RecordId;

    /// Replace the identifier (when a provisional id is confirmed).
    fn set_id(&mut self, id: RecordId);

    /// The creation timestamp, when known.
    fn created_at(&self) -> Option<Timestamp>;

    /// Stamp the creation timestamp.
    fn set_created_at(&mut self, at: Timestamp);
}

/// A value that can live in a synced single-document slot.
///
/// Documents have no identifier of their own (the slot key identifies them)
/// and must be default-constructible so a first partial write can create
/// one. Blanket-implemented for any such serde type.
pub trait Document: Clone + Send + Sync + Serialize + DeserializeOwned + Default + 'static {}

impl<T> Document for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + Default + 'static
{}
