//! In-process remote store.
//!
//! The reference implementation of [`RemoteStore`]: assigns ids and
//! monotonic creation timestamps, pushes snapshots to subscribers on every
//! change, and offers the fault controls tests drive (unavailability
//! toggle, one-shot rejection, injected subscription errors).

use super::{
    CollectionEvent, CollectionSubscription, DocumentEvent, DocumentSubscription, RemoteError,
    RemoteStore,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use vault_core::merge_fields;
use vault_types::{Fields, RemoteRecord, Timestamp};

/// In-process remote document store.
///
/// Cloning shares the underlying store, so one clone can play "another
/// client" against the same data.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    inner: Arc<MemoryRemoteInner>,
}

#[derive(Debug, Default)]
struct MemoryRemoteInner {
    collections: DashMap<String, Vec<RemoteRecord>>,
    documents: DashMap<String, Fields>,
    collection_subs: DashMap<String, Vec<mpsc::UnboundedSender<CollectionEvent>>>,
    document_subs: DashMap<String, Vec<mpsc::UnboundedSender<DocumentEvent>>>,
    clock: AtomicU64,
    unavailable: AtomicBool,
    fail_next: Mutex<Option<String>>,
}

impl MemoryRemote {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`RemoteError::Unavailable`] until
    /// flipped back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Cause the next operation to fail with [`RemoteError::Rejected`].
    pub fn fail_next(&self, message: &str) {
        *self.inner.fail_next.lock().unwrap() = Some(message.to_string());
    }

    /// Push an error event to every subscriber of a collection.
    pub fn emit_collection_error(&self, collection: &str, message: &str) {
        if let Some(mut subs) = self.inner.collection_subs.get_mut(collection) {
            subs.retain(|tx| tx.send(CollectionEvent::Error(message.to_string())).is_ok());
        }
    }

    /// Push an error event to every subscriber of a document.
    pub fn emit_document_error(&self, collection: &str, doc_id: &str, message: &str) {
        let key = doc_key(collection, doc_id);
        if let Some(mut subs) = self.inner.document_subs.get_mut(&key) {
            subs.retain(|tx| tx.send(DocumentEvent::Error(message.to_string())).is_ok());
        }
    }

    /// Number of records currently stored in a collection.
    pub fn record_count(&self, collection: &str) -> usize {
        self.inner
            .collections
            .get(collection)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    /// The stored fields of a document, if it exists.
    pub fn document(&self, collection: &str, doc_id: &str) -> Option<Fields> {
        self.inner
            .documents
            .get(&doc_key(collection, doc_id))
            .map(|fields| fields.clone())
    }

    fn gate(&self) -> Result<(), RemoteError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("store marked unavailable".into()));
        }
        if let Some(message) = self.inner.fail_next.lock().unwrap().take() {
            return Err(RemoteError::Rejected(message));
        }
        Ok(())
    }

    /// Strictly increasing creation timestamps keep newest-first ordering
    /// stable even for back-to-back inserts.
    fn next_timestamp(&self) -> Timestamp {
        let now = Timestamp::now().as_millis();
        let mut prev = self.inner.clock.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self.inner.clock.compare_exchange(
                prev,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Timestamp::from_millis(next),
                Err(actual) => prev = actual,
            }
        }
    }

    fn snapshot(&self, collection: &str) -> Vec<RemoteRecord> {
        let mut records = self
            .inner
            .collections
            .get(collection)
            .map(|records| records.clone())
            .unwrap_or_default();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    fn notify_collection(&self, collection: &str) {
        let snapshot = self.snapshot(collection);
        if let Some(mut subs) = self.inner.collection_subs.get_mut(collection) {
            subs.retain(|tx| tx.send(CollectionEvent::Snapshot(snapshot.clone())).is_ok());
        }
    }

    fn notify_document(&self, collection: &str, doc_id: &str) {
        let key = doc_key(collection, doc_id);
        let fields = self.inner.documents.get(&key).map(|f| f.clone());
        if let Some(mut subs) = self.inner.document_subs.get_mut(&key) {
            subs.retain(|tx| tx.send(DocumentEvent::Snapshot(fields.clone())).is_ok());
        }
    }
}

impl Clone for MemoryRemote {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn doc_key(collection: &str, doc_id: &str) -> String {
    format!("{collection}/{doc_id}")
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn insert(&self, collection: &str, payload: Fields) -> Result<RemoteRecord, RemoteError> {
        self.gate()?;
        let record = RemoteRecord::new(
            uuid::Uuid::new_v4().simple().to_string(),
            self.next_timestamp(),
            payload,
        );
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        self.notify_collection(collection);
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), RemoteError> {
        self.gate()?;
        let mut records = self
            .inner
            .collections
            .entry(collection.to_string())
            .or_default();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Err(RemoteError::Rejected(format!(
                "no record {id} in {collection}"
            )));
        };
        merge_fields(&mut record.fields, &patch);
        drop(records);
        self.notify_collection(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        self.gate()?;
        if let Some(mut records) = self.inner.collections.get_mut(collection) {
            records.retain(|r| r.id != id);
        }
        self.notify_collection(collection);
        Ok(())
    }

    async fn merge_document(
        &self,
        collection: &str,
        doc_id: &str,
        patch: Fields,
    ) -> Result<(), RemoteError> {
        self.gate()?;
        let key = doc_key(collection, doc_id);
        let mut entry = self.inner.documents.entry(key).or_default();
        merge_fields(&mut entry, &patch);
        drop(entry);
        self.notify_document(collection, doc_id);
        Ok(())
    }

    async fn fetch_collection(&self, collection: &str) -> Result<Vec<RemoteRecord>, RemoteError> {
        self.gate()?;
        Ok(self.snapshot(collection))
    }

    async fn fetch_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<Fields>, RemoteError> {
        self.gate()?;
        Ok(self
            .inner
            .documents
            .get(&doc_key(collection, doc_id))
            .map(|fields| fields.clone()))
    }

    async fn subscribe_collection(
        &self,
        collection: &str,
    ) -> Result<CollectionSubscription, RemoteError> {
        self.gate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        // Initial snapshot, then one per change.
        let _ = tx.send(CollectionEvent::Snapshot(self.snapshot(collection)));
        self.inner
            .collection_subs
            .entry(collection.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    async fn subscribe_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<DocumentSubscription, RemoteError> {
        self.gate()?;
        let key = doc_key(collection, doc_id);
        let (tx, rx) = mpsc::unbounded_channel();
        let fields = self.inner.documents.get(&key).map(|f| f.clone());
        let _ = tx.send(DocumentEvent::Snapshot(fields));
        self.inner.document_subs.entry(key).or_default().push(tx);
        Ok(rx)
    }
}
