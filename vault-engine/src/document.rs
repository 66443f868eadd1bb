//! Live handle onto one synced document.
//!
//! The document counterpart of [`CollectionHandle`]: a single value at a
//! fixed (collection, document id) address, read synchronously from cache
//! and edited through merge-by-key patches. Every edit is create-or-update;
//! consecutive edits coalesce into one queued write. A remote snapshot that
//! reports the document missing preserves the local value instead of
//! clearing it.
//!
//! [`CollectionHandle`]: crate::CollectionHandle

use crate::engine::{deliver_op, mark, Connectivity, EngineError, FlushReport};
use crate::remote::{DocumentEvent, DocumentSubscription, RemoteError, RemoteStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use vault_core::outbox::{Outbox, OutboxOp};
use vault_core::DocumentCache;
use vault_local::{document_slot, outbox_slot, LocalStore, StoreError};
use vault_types::{Document, Fields};

struct DocState<T: Document> {
    cache: DocumentCache<T>,
    error: Option<String>,
    loading: bool,
}

struct DocumentShared<T: Document, S: LocalStore, R: RemoteStore> {
    collection: String,
    doc_id: String,
    slot: String,
    outbox_slot: String,
    local: Arc<S>,
    remote: Arc<R>,
    connectivity: Arc<watch::Sender<Connectivity>>,
    state: Mutex<DocState<T>>,
    outbox: Mutex<Outbox>,
    revision: watch::Sender<u64>,
    kick: Notify,
    drain_lock: tokio::sync::Mutex<()>,
}

impl<T: Document, S: LocalStore, R: RemoteStore> DocumentShared<T, S, R> {
    fn state_lock(&self) -> MutexGuard<'_, DocState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn outbox_lock(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn kick_if_online(&self) {
        if *self.connectivity.borrow() == Connectivity::Online {
            self.kick.notify_one();
        }
    }

    fn mark_online(&self) {
        mark(&self.connectivity, Connectivity::Online);
    }

    fn mark_offline(&self) {
        mark(&self.connectivity, Connectivity::Offline);
    }

    fn persist_value(&self, state: &DocState<T>) -> Result<(), StoreError> {
        match self.local.put(&self.slot, &state.cache.to_value()) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(doc = %self.doc_id, %err, "document slot write failed");
                Err(err)
            }
        }
    }

    fn persist_outbox(&self, outbox: &Outbox) -> Result<(), StoreError> {
        match self.local.put(&self.outbox_slot, outbox) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(doc = %self.doc_id, %err, "outbox slot write failed");
                Err(err)
            }
        }
    }

    fn set_error(&self, message: String) {
        {
            let mut state = self.state_lock();
            state.error = Some(message);
            state.loading = false;
        }
        self.bump();
    }

    fn update(&self, patch: Fields) -> Result<(), EngineError> {
        let mut persisted;
        {
            let mut state = self.state_lock();
            state.cache.merge_patch(&patch)?;
            persisted = self.persist_value(&state);
        }
        {
            let mut outbox = self.outbox_lock();
            outbox.record_merge_document(&self.collection, &self.doc_id, patch);
            persisted = persisted.and(self.persist_outbox(&outbox));
        }
        self.bump();
        self.kick_if_online();
        persisted?;
        Ok(())
    }

    async fn flush(&self) -> FlushReport {
        let _drain = self.drain_lock.lock().await;
        let mut report = FlushReport::default();
        loop {
            let next = { self.outbox_lock().next_unapplied().cloned() };
            let Some(op) = next else { break };

            let outcome = deliver_op(self.remote.as_ref(), |_| None, &op).await;
            match outcome {
                Ok(_) => {
                    {
                        let mut outbox = self.outbox_lock();
                        outbox.mark_applied(op.op_id);
                        let _ = self.persist_outbox(&outbox);
                    }
                    self.bump();
                    self.mark_online();
                    report.applied += 1;
                }
                Err(err) => {
                    tracing::warn!(doc = %self.doc_id, op = %op.op_id, %err, "remote write failed, op stays queued");
                    {
                        let mut outbox = self.outbox_lock();
                        outbox.mark_failed(op.op_id, &err.to_string());
                        let _ = self.persist_outbox(&outbox);
                    }
                    self.set_error(err.to_string());
                    if matches!(err, RemoteError::Unavailable(_)) {
                        self.mark_offline();
                    }
                    report.failed += 1;
                    break;
                }
            }
        }
        {
            let mut outbox = self.outbox_lock();
            if !outbox.is_empty() && !outbox.has_unapplied() {
                outbox.prune_applied();
                let _ = self.persist_outbox(&outbox);
            }
        }
        report
    }

    async fn refresh(&self) {
        match self.remote.fetch_document(&self.collection, &self.doc_id).await {
            Ok(fields) => self.apply_remote_snapshot(fields),
            Err(err) => {
                tracing::warn!(doc = %self.doc_id, %err, "document refresh failed");
                if matches!(err, RemoteError::Unavailable(_)) {
                    self.mark_offline();
                }
                self.set_error(err.to_string());
            }
        }
    }

    fn apply_remote_snapshot(&self, remote: Option<Fields>) {
        let unapplied = {
            self.outbox_lock()
                .unapplied_document_patches(&self.collection, &self.doc_id)
        };
        {
            let mut state = self.state_lock();
            match state.cache.apply_snapshot(remote.as_ref(), &unapplied) {
                Ok(_) => {
                    state.error = None;
                    let _ = self.persist_value(&state);
                }
                Err(err) => {
                    tracing::warn!(doc = %self.doc_id, %err, "document snapshot does not decode");
                    state.error = Some(err.to_string());
                }
            }
            state.loading = false;
        }
        self.bump();
    }

    async fn subscribe(&self) -> Option<DocumentSubscription> {
        match self
            .remote
            .subscribe_document(&self.collection, &self.doc_id)
            .await
        {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                tracing::warn!(doc = %self.doc_id, %err, "document subscription failed");
                if matches!(err, RemoteError::Unavailable(_)) {
                    self.mark_offline();
                    let mut state = self.state_lock();
                    state.loading = false;
                } else {
                    self.set_error(err.to_string());
                }
                None
            }
        }
    }
}

async fn next_event(subscription: &mut Option<DocumentSubscription>) -> Option<DocumentEvent> {
    match subscription {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn run_sync<T, S, R>(shared: Arc<DocumentShared<T, S, R>>)
where
    T: Document,
    S: LocalStore,
    R: RemoteStore,
{
    let mut connectivity = shared.connectivity.subscribe();
    let mut subscription = None;
    if *connectivity.borrow_and_update() == Connectivity::Online {
        subscription = shared.subscribe().await;
        shared.flush().await;
    }
    loop {
        tokio::select! {
            event = next_event(&mut subscription) => match event {
                Some(DocumentEvent::Snapshot(fields)) => shared.apply_remote_snapshot(fields),
                Some(DocumentEvent::Error(message)) => shared.set_error(message),
                None => subscription = None,
            },
            changed = connectivity.changed() => {
                if changed.is_err() {
                    break;
                }
                if *connectivity.borrow_and_update() == Connectivity::Online {
                    shared.flush().await;
                    shared.refresh().await;
                    if subscription.is_none() {
                        subscription = shared.subscribe().await;
                    }
                }
            }
            _ = shared.kick.notified() => {
                if *shared.connectivity.borrow() == Connectivity::Online {
                    shared.flush().await;
                }
            }
        }
    }
}

/// A live, locally cached view of one remote document.
pub struct DocumentHandle<T: Document, S: LocalStore, R: RemoteStore> {
    shared: Arc<DocumentShared<T, S, R>>,
    task: JoinHandle<()>,
}

impl<T: Document, S: LocalStore, R: RemoteStore> DocumentHandle<T, S, R> {
    pub(crate) fn new(
        collection: &str,
        doc_id: &str,
        local: Arc<S>,
        remote: Arc<R>,
        connectivity: Arc<watch::Sender<Connectivity>>,
    ) -> Self {
        let slot = document_slot(collection, doc_id);
        let outbox_key = outbox_slot(&format!("{collection}/{doc_id}"));
        let value: Option<T> = local.get_or(&slot, None);
        let outbox: Outbox = local.get_or(&outbox_key, Outbox::new());
        let loading = *connectivity.borrow() == Connectivity::Online;
        let (revision, _) = watch::channel(0);

        let shared = Arc::new(DocumentShared {
            collection: collection.to_string(),
            doc_id: doc_id.to_string(),
            slot,
            outbox_slot: outbox_key,
            local,
            remote,
            connectivity,
            state: Mutex::new(DocState {
                cache: DocumentCache::from_value(value),
                error: None,
                loading,
            }),
            outbox: Mutex::new(outbox),
            revision,
            kick: Notify::new(),
            drain_lock: tokio::sync::Mutex::new(()),
        });
        let task = tokio::spawn(run_sync(Arc::clone(&shared)));
        Self { shared, task }
    }

    /// The collection holding this document.
    pub fn collection(&self) -> &str {
        &self.shared.collection
    }

    /// The document id within its collection.
    pub fn doc_id(&self) -> &str {
        &self.shared.doc_id
    }

    /// The cached value, if any exists locally or remotely yet.
    pub fn get(&self) -> Option<T> {
        self.shared.state_lock().cache.to_value()
    }

    /// The most recent sync failure, if any.
    pub fn error(&self) -> Option<String> {
        self.shared.state_lock().error.clone()
    }

    /// True until the first remote snapshot (or failure) lands.
    pub fn loading(&self) -> bool {
        self.shared.state_lock().loading
    }

    /// A receiver that is notified whenever the visible state changes.
    pub fn changed(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Merge a partial-field patch into the document (create-or-update).
    pub fn update_document(&self, patch: Fields) -> Result<(), EngineError> {
        self.shared.update(patch)
    }

    /// Drain queued writes now, regardless of connectivity.
    pub async fn flush(&self) -> FlushReport {
        self.shared.flush().await
    }

    /// Re-fetch the document and replace the cache.
    ///
    /// A document missing remotely leaves the local value untouched.
    pub async fn refresh(&self) {
        self.shared.refresh().await
    }

    /// Number of queued writes not yet confirmed.
    pub fn pending_ops(&self) -> usize {
        self.shared
            .outbox_lock()
            .iter()
            .filter(|op| op.is_unapplied())
            .count()
    }

    /// Snapshot of the queued writes, oldest first.
    pub fn queued_ops(&self) -> Vec<OutboxOp> {
        self.shared.outbox_lock().iter().cloned().collect()
    }
}

impl<T: Document, S: LocalStore, R: RemoteStore> Drop for DocumentHandle<T, S, R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
