//! Remote store abstraction for Vaultic.
//!
//! This module provides the injectable handle to the remote document store.
//! Handles receive it at construction; there is no global and no nullable
//! state - an engine with no backend gets [`OfflineRemote`] instead.
//!
//! # Design
//!
//! The trait is async and document-oriented:
//! - `insert()` adds a record; the store assigns the id and creation
//!   timestamp and returns both
//! - `update()` / `delete()` address one record by its remote id
//! - `merge_document()` is a create-or-update merge of a fixed document
//! - `fetch_*()` are one-shot reads; `subscribe_*()` deliver a snapshot on
//!   subscribe and after every change
//!
//! # Example
//!
//! ```ignore
//! let remote = MemoryRemote::new();
//! let record = remote.insert("research-entries", payload).await?;
//! let mut sub = remote.subscribe_collection("research-entries").await?;
//! let event = sub.recv().await;
//! ```

mod memory;
mod offline;

pub use memory::MemoryRemote;
pub use offline::OfflineRemote;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use vault_types::{Fields, RemoteRecord};

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The store cannot be reached.
    #[error("remote store unreachable: {0}")]
    Unavailable(String),

    /// The store rejected the operation.
    #[error("remote store rejected the operation: {0}")]
    Rejected(String),
}

/// One push from a collection subscription.
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    /// The collection's full current contents, newest first.
    Snapshot(Vec<RemoteRecord>),
    /// The subscription failed; cached data is unaffected.
    Error(String),
}

/// One push from a document subscription.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    /// The document's current fields, or `None` while it does not exist.
    Snapshot(Option<Fields>),
    /// The subscription failed; cached data is unaffected.
    Error(String),
}

/// Receives [`CollectionEvent`]s; dropping it tears the subscription down.
pub type CollectionSubscription = mpsc::UnboundedReceiver<CollectionEvent>;

/// Receives [`DocumentEvent`]s; dropping it tears the subscription down.
pub type DocumentSubscription = mpsc::UnboundedReceiver<DocumentEvent>;

/// The remote document store boundary.
///
/// Collections hold records as schemaless field bags; documents are field
/// bags merged by key. Implementations must make `delete` idempotent:
/// deleting a record that does not exist succeeds.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// Insert a record; the store assigns id and creation timestamp.
    async fn insert(&self, collection: &str, payload: Fields) -> Result<RemoteRecord, RemoteError>;

    /// Merge a partial-field patch into one record.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), RemoteError>;

    /// Delete one record. Deleting a missing record succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError>;

    /// Merge a partial-field patch into a fixed document, creating it if
    /// absent.
    async fn merge_document(
        &self,
        collection: &str,
        doc_id: &str,
        patch: Fields,
    ) -> Result<(), RemoteError>;

    /// The collection's current contents, newest first.
    async fn fetch_collection(&self, collection: &str) -> Result<Vec<RemoteRecord>, RemoteError>;

    /// The document's current fields, or `None` while it does not exist.
    async fn fetch_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<Fields>, RemoteError>;

    /// Subscribe to a collection; the current snapshot is delivered
    /// immediately, then one on every change.
    async fn subscribe_collection(
        &self,
        collection: &str,
    ) -> Result<CollectionSubscription, RemoteError>;

    /// Subscribe to a document; the current state is delivered immediately,
    /// then one event on every change.
    async fn subscribe_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<DocumentSubscription, RemoteError>;
}
