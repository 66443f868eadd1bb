//! Document cache rules: merge-by-key and preserve-on-missing.
//!
//! A document cache holds at most one value for a fixed (collection,
//! document id) pair. Partial writes merge into it by key; a remote
//! snapshot carrying fields replaces it; a snapshot reporting the document
//! missing deliberately preserves the local value, treating local data as
//! more durable than a missing-but-expected remote document.

use crate::codec::{from_fields, merge_fields, to_fields, CodecError};
use vault_types::{Document, Fields};

/// The cached value of one synced document.
#[derive(Clone, Debug, Default)]
pub struct DocumentCache<T: Document> {
    value: Option<T>,
}

impl<T: Document> DocumentCache<T> {
    /// An empty cache.
    pub fn new() -> Self {
        Self { value: None }
    }

    /// A cache hydrated from a persisted value.
    pub fn from_value(value: Option<T>) -> Self {
        Self { value }
    }

    /// The cached value, if any.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Clone the cached value.
    pub fn to_value(&self) -> Option<T> {
        self.value.clone()
    }

    /// Merge a partial-field patch into the cached value.
    ///
    /// When nothing is cached yet, the document is created from its default
    /// with the patch applied (create-or-update).
    pub fn merge_patch(&mut self, patch: &Fields) -> Result<(), CodecError> {
        let base = match &self.value {
            Some(value) => value.clone(),
            None => T::default(),
        };
        let mut fields = to_fields(&base)?;
        merge_fields(&mut fields, patch);
        self.value = Some(from_fields(fields)?);
        Ok(())
    }

    /// Apply a remote snapshot.
    ///
    /// `Some(fields)` replaces the cached value with the remote fields plus
    /// any still-unapplied local patches re-applied on top, and returns
    /// true. `None` (document missing remotely) preserves the local value
    /// and returns false.
    pub fn apply_snapshot(
        &mut self,
        remote: Option<&Fields>,
        unapplied: &[Fields],
    ) -> Result<bool, CodecError> {
        let Some(remote_fields) = remote else {
            return Ok(false);
        };
        let mut fields = remote_fields.clone();
        for patch in unapplied {
            merge_fields(&mut fields, patch);
        }
        self.value = Some(from_fields(fields)?);
        Ok(true)
    }
}
