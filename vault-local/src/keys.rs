//! The slot-key namespace.
//!
//! One slot per synced collection, one per (collection, document id) pair,
//! one per outbox scope. Keys are plain strings so any [`LocalStore`] can
//! hold them.
//!
//! [`LocalStore`]: crate::LocalStore

/// The slot holding a collection's cached sequence.
pub fn collection_slot(collection: &str) -> String {
    format!("collection/{collection}")
}

/// The slot holding a single document's cached value.
pub fn document_slot(collection: &str, doc_id: &str) -> String {
    format!("document/{collection}/{doc_id}")
}

/// The slot holding an outbox.
pub fn outbox_slot(scope: &str) -> String {
    format!("outbox/{scope}")
}
