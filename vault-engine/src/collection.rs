//! Live handle onto one synced collection.
//!
//! A [`CollectionHandle`] serves reads synchronously from the local cache
//! and applies mutations optimistically: the cache and the persisted slot
//! change first, the matching operation is queued in the outbox, and a
//! background task drains the queue whenever the engine is online. Remote
//! snapshots replace the cache wholesale, except that records whose insert
//! is still unconfirmed survive on top.
//!
//! Remote failures never undo a local mutation. The failed operation stays
//! queued, the failure lands in the handle's error slot, and draining
//! resumes on the next reconcile.

use crate::engine::{deliver_op, mark, Connectivity, EngineError, FlushReport, OpOutcome};
use crate::remote::{CollectionEvent, CollectionSubscription, RemoteError, RemoteStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use uuid::Uuid;
use vault_core::codec::{insert_payload, record_from_remote};
use vault_core::outbox::{Outbox, OutboxOp};
use vault_core::CollectionCache;
use vault_local::{collection_slot, outbox_slot, LocalStore, StoreError};
use vault_types::{Fields, Record, RecordId, RemoteRecord, Timestamp};

struct HandleState<T: Record> {
    cache: CollectionCache<T>,
    error: Option<String>,
    loading: bool,
}

struct CollectionShared<T: Record, S: LocalStore, R: RemoteStore> {
    name: String,
    slot: String,
    outbox_slot: String,
    local: Arc<S>,
    remote: Arc<R>,
    connectivity: Arc<watch::Sender<Connectivity>>,
    state: Mutex<HandleState<T>>,
    outbox: Mutex<Outbox>,
    revision: watch::Sender<u64>,
    kick: Notify,
    drain_lock: tokio::sync::Mutex<()>,
}

impl<T: Record, S: LocalStore, R: RemoteStore> CollectionShared<T, S, R> {
    fn state_lock(&self) -> MutexGuard<'_, HandleState<T>> {
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

    fn persist_records(&self, state: &HandleState<T>) -> Result<(), StoreError> {
        match self.local.put(&self.slot, state.cache.records()) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(collection = %self.name, %err, "collection slot write failed");
                Err(err)
            }
        }
    }

    fn persist_outbox(&self, outbox: &Outbox) -> Result<(), StoreError> {
        match self.local.put(&self.outbox_slot, outbox) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(collection = %self.name, %err, "outbox slot write failed");
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

    fn add(&self, mut record: T) -> Result<RecordId, EngineError> {
        let local_id = Uuid::new_v4();
        let id = RecordId::Provisional(local_id);
        record.set_id(id.clone());
        record.set_created_at(Timestamp::now());
        let payload = insert_payload(&record)?;

        let mut persisted;
        {
            let mut state = self.state_lock();
            state.cache.prepend(record);
            persisted = self.persist_records(&state);
        }
        {
            let mut outbox = self.outbox_lock();
            outbox.record_insert(&self.name, local_id, payload);
            persisted = persisted.and(self.persist_outbox(&outbox));
        }
        self.bump();
        self.kick_if_online();
        persisted?;
        Ok(id)
    }

    fn update(&self, id: &RecordId, patch: Fields) -> Result<(), EngineError> {
        let mut persisted;
        {
            let mut state = self.state_lock();
            // A patch that does not re-encode is rejected outright, before
            // anything is queued.
            let matched = state.cache.merge(id, &patch)?;
            if !matched {
                tracing::debug!(collection = %self.name, %id, "update target not cached locally");
            }
            persisted = self.persist_records(&state);
        }
        {
            let mut outbox = self.outbox_lock();
            outbox.record_update(&self.name, id, patch);
            persisted = persisted.and(self.persist_outbox(&outbox));
        }
        self.bump();
        self.kick_if_online();
        persisted?;
        Ok(())
    }

    fn delete(&self, id: &RecordId) -> Result<(), EngineError> {
        let mut persisted;
        {
            let mut state = self.state_lock();
            state.cache.remove(id);
            persisted = self.persist_records(&state);
        }
        {
            let mut outbox = self.outbox_lock();
            outbox.record_delete(&self.name, id);
            persisted = persisted.and(self.persist_outbox(&outbox));
        }
        self.bump();
        self.kick_if_online();
        persisted?;
        Ok(())
    }

    /// Drain the outbox against the remote store, oldest op first.
    ///
    /// Stops at the first failure; the failed op keeps its place and is
    /// retried on the next drain. Concurrent drains are serialized.
    async fn flush(&self) -> FlushReport {
        let _drain = self.drain_lock.lock().await;
        let mut report = FlushReport::default();
        loop {
            let next = { self.outbox_lock().next_unapplied().cloned() };
            let Some(op) = next else { break };

            let outcome = deliver_op(
                self.remote.as_ref(),
                |target| self.outbox_lock().resolve(target),
                &op,
            )
            .await;

            match outcome {
                Ok(OpOutcome::Inserted { local_id, record }) => {
                    {
                        let mut outbox = self.outbox_lock();
                        outbox.confirm_insert(op.op_id, &record.id);
                        let _ = self.persist_outbox(&outbox);
                    }
                    {
                        let mut state = self.state_lock();
                        state.cache.confirm(local_id, &record.id, record.created_at);
                        let _ = self.persist_records(&state);
                    }
                    self.bump();
                    self.mark_online();
                    report.applied += 1;
                }
                Ok(OpOutcome::Done) => {
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
                    tracing::warn!(
                        collection = %self.name,
                        op = %op.op_id,
                        %err,
                        "remote write failed, op stays queued"
                    );
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

    /// Fetch the authoritative sequence and replace the cache with it.
    async fn refresh(&self) {
        match self.remote.fetch_collection(&self.name).await {
            Ok(records) => self.apply_remote_snapshot(records),
            Err(err) => {
                tracing::warn!(collection = %self.name, %err, "collection refresh failed");
                if matches!(err, RemoteError::Unavailable(_)) {
                    self.mark_offline();
                }
                self.set_error(err.to_string());
            }
        }
    }

    fn apply_remote_snapshot(&self, records: Vec<RemoteRecord>) {
        let unconfirmed = { self.outbox_lock().unconfirmed_inserts() };
        let mut decoded = Vec::with_capacity(records.len());
        for remote in &records {
            match record_from_remote::<T>(remote) {
                Ok(record) => decoded.push(record),
                Err(err) => {
                    tracing::warn!(
                        collection = %self.name,
                        id = %remote.id,
                        %err,
                        "skipping record that does not decode"
                    );
                }
            }
        }
        {
            let mut state = self.state_lock();
            state.cache.apply_snapshot(decoded, &unconfirmed);
            state.error = None;
            state.loading = false;
            let _ = self.persist_records(&state);
        }
        self.bump();
    }

    async fn subscribe(&self) -> Option<CollectionSubscription> {
        match self.remote.subscribe_collection(&self.name).await {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                tracing::warn!(collection = %self.name, %err, "collection subscription failed");
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

async fn next_event(subscription: &mut Option<CollectionSubscription>) -> Option<CollectionEvent> {
    match subscription {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

/// Drive one collection: apply pushed snapshots, drain on reconnect, drain
/// on local mutation kicks.
async fn run_sync<T, S, R>(shared: Arc<CollectionShared<T, S, R>>)
where
    T: Record,
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
                Some(CollectionEvent::Snapshot(records)) => shared.apply_remote_snapshot(records),
                Some(CollectionEvent::Error(message)) => shared.set_error(message),
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

/// A live, locally cached view of one remote collection.
///
/// Cheap to read; every accessor is synchronous. Dropping the handle stops
/// its background sync task.
pub struct CollectionHandle<T: Record, S: LocalStore, R: RemoteStore> {
    shared: Arc<CollectionShared<T, S, R>>,
    task: JoinHandle<()>,
}

impl<T: Record, S: LocalStore, R: RemoteStore> CollectionHandle<T, S, R> {
    pub(crate) fn new(
        name: &str,
        local: Arc<S>,
        remote: Arc<R>,
        connectivity: Arc<watch::Sender<Connectivity>>,
    ) -> Self {
        let slot = collection_slot(name);
        let outbox_slot = outbox_slot(name);
        let records: Vec<T> = local.get_or(&slot, Vec::new());
        let outbox: Outbox = local.get_or(&outbox_slot, Outbox::new());
        let loading = *connectivity.borrow() == Connectivity::Online;
        let (revision, _) = watch::channel(0);

        let shared = Arc::new(CollectionShared {
            name: name.to_string(),
            slot,
            outbox_slot,
            local,
            remote,
            connectivity,
            state: Mutex::new(HandleState {
                cache: CollectionCache::from_records(records),
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

    /// The collection this handle syncs.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The current sequence, newest first.
    pub fn items(&self) -> Vec<T> {
        self.shared.state_lock().cache.to_vec()
    }

    /// The most recent sync failure, if any.
    ///
    /// Cleared by the next successfully applied snapshot.
    pub fn error(&self) -> Option<String> {
        self.shared.state_lock().error.clone()
    }

    /// True until the first remote snapshot (or failure) lands.
    ///
    /// Starts false on an offline engine: the local cache is all there is.
    pub fn loading(&self) -> bool {
        self.shared.state_lock().loading
    }

    /// A receiver that is notified whenever the visible state changes.
    pub fn changed(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Add a record optimistically.
    ///
    /// The record lands at the front of the sequence under a provisional id,
    /// which is returned; later mutations may target it even before the
    /// insert is confirmed.
    pub fn add_item(&self, record: T) -> Result<RecordId, EngineError> {
        self.shared.add(record)
    }

    /// Merge a partial-field patch into one record.
    ///
    /// A target missing from the cache is left untouched locally; the patch
    /// is still queued for the remote store.
    pub fn update_item(&self, id: &RecordId, patch: Fields) -> Result<(), EngineError> {
        self.shared.update(id, patch)
    }

    /// Delete a record.
    ///
    /// Deleting a record whose insert is still queued cancels the insert;
    /// nothing reaches the remote store.
    pub fn delete_item(&self, id: &RecordId) -> Result<(), EngineError> {
        self.shared.delete(id)
    }

    /// Drain queued operations now, regardless of connectivity.
    pub async fn flush(&self) -> FlushReport {
        self.shared.flush().await
    }

    /// Re-fetch the authoritative sequence and replace the cache.
    pub async fn refresh(&self) {
        self.shared.refresh().await
    }

    /// Number of queued operations not yet confirmed.
    pub fn pending_ops(&self) -> usize {
        self.shared
            .outbox_lock()
            .iter()
            .filter(|op| op.is_unapplied())
            .count()
    }

    /// Snapshot of the queued operations, oldest first.
    pub fn queued_ops(&self) -> Vec<OutboxOp> {
        self.shared.outbox_lock().iter().cloned().collect()
    }
}

impl<T: Record, S: LocalStore, R: RemoteStore> Drop for CollectionHandle<T, S, R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;
    use crate::SyncEngine;
    use serde_json::json;
    use std::time::Duration;
    use vault_local::MemoryStore;
    use vault_types::{ContentType, Platform, ResearchEntry};

    fn entry(title: &str) -> ResearchEntry {
        ResearchEntry::new(7, title, Platform::Youtube, ContentType::Video)
    }

    fn patch(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn payload(title: &str) -> Fields {
        insert_payload(&entry(title)).unwrap()
    }

    async fn eventually(rev: &mut watch::Receiver<u64>, check: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if check() {
                    return;
                }
                rev.changed().await.expect("revision channel closed");
            }
        })
        .await
        .expect("condition not reached in time");
    }

    // ========================================================================
    // Local-first reads and optimistic writes
    // ========================================================================

    #[tokio::test]
    async fn add_item_is_visible_synchronously_under_provisional_id() {
        let engine = SyncEngine::offline(MemoryStore::new());
        let handle = engine.collection::<ResearchEntry>("research-entries");

        let id = handle.add_item(entry("Mars dust storms")).unwrap();

        assert!(id.is_provisional());
        let items = handle.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Mars dust storms");
        assert_eq!(items[0].id, id);
        assert!(items[0].created_at.is_some());
        assert_eq!(handle.pending_ops(), 1);
        assert!(!handle.loading());
    }

    #[tokio::test]
    async fn cache_and_outbox_survive_a_restart() {
        let store = MemoryStore::new();
        {
            let engine = SyncEngine::offline(store.clone());
            let handle = engine.collection::<ResearchEntry>("research-entries");
            handle.add_item(entry("kept across restarts")).unwrap();
        }

        let engine = SyncEngine::offline(store);
        let handle = engine.collection::<ResearchEntry>("research-entries");
        assert_eq!(handle.items()[0].title, "kept across restarts");
        assert_eq!(handle.pending_ops(), 1);
    }

    #[tokio::test]
    async fn rapid_adds_order_newest_first_with_distinct_ids() {
        let engine = SyncEngine::offline(MemoryStore::new());
        let handle = engine.collection::<ResearchEntry>("research-entries");

        let first = handle.add_item(entry("A")).unwrap();
        let second = handle.add_item(entry("B")).unwrap();

        assert_ne!(first, second);
        let items = handle.items();
        let titles: Vec<_> = items.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["B", "A"]);
        assert!(items.iter().all(|e| e.id.is_provisional()));
        assert_eq!(handle.pending_ops(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_edit_the_cache_in_place() {
        let engine = SyncEngine::offline(MemoryStore::new());
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let first = handle.add_item(entry("first")).unwrap();
        let second = handle.add_item(entry("second")).unwrap();

        handle
            .update_item(&first, patch(&[("title", json!("first, revised"))]))
            .unwrap();
        handle.delete_item(&second).unwrap();

        let items = handle.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "first, revised");
        // Both ops folded into the surviving insert.
        assert_eq!(handle.pending_ops(), 1);
    }

    #[tokio::test]
    async fn update_of_uncached_id_queues_without_touching_cache() {
        let engine = SyncEngine::offline(MemoryStore::new());
        let handle = engine.collection::<ResearchEntry>("research-entries");

        handle
            .update_item(
                &RecordId::remote("doc-elsewhere"),
                patch(&[("title", json!("edited blind"))]),
            )
            .unwrap();

        assert!(handle.items().is_empty());
        assert_eq!(handle.pending_ops(), 1);
    }

    #[tokio::test]
    async fn patch_that_breaks_the_record_shape_is_rejected() {
        let engine = SyncEngine::offline(MemoryStore::new());
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let id = handle.add_item(entry("well formed")).unwrap();

        let err = handle
            .update_item(&id, patch(&[("contentNumber", json!("not a number"))]))
            .unwrap_err();

        assert!(matches!(err, EngineError::Codec(_)));
        assert_eq!(handle.items()[0].title, "well formed");
        // Nothing extra was queued.
        assert_eq!(handle.pending_ops(), 1);
    }

    #[tokio::test]
    async fn changed_signals_on_local_mutation() {
        let engine = SyncEngine::offline(MemoryStore::new());
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let mut rev = handle.changed();

        handle.add_item(entry("ping")).unwrap();

        tokio::time::timeout(Duration::from_secs(5), rev.changed())
            .await
            .expect("no change signal")
            .unwrap();
        assert!(*rev.borrow() > 0);
    }

    // ========================================================================
    // Draining the outbox
    // ========================================================================

    #[tokio::test]
    async fn flush_confirms_inserts_and_rewrites_ids_in_place() {
        let remote = MemoryRemote::new();
        let engine =
            SyncEngine::with_connectivity(MemoryStore::new(), remote.clone(), Connectivity::Offline);
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let provisional = handle.add_item(entry("draft")).unwrap();

        let report = handle.flush().await;

        assert_eq!(report, FlushReport { applied: 1, failed: 0 });
        assert_eq!(handle.pending_ops(), 0);
        assert_eq!(remote.record_count("research-entries"), 1);
        let items = handle.items();
        assert!(items[0].id.as_remote().is_some());
        assert_ne!(items[0].id, provisional);
        // A successful drain heals connectivity.
        assert_eq!(engine.connectivity(), Connectivity::Online);
    }

    #[tokio::test]
    async fn provisional_targets_resolve_after_confirmation() {
        let remote = MemoryRemote::new();
        let engine =
            SyncEngine::with_connectivity(MemoryStore::new(), remote.clone(), Connectivity::Offline);
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let provisional = handle.add_item(entry("draft")).unwrap();
        handle.flush().await;

        // The caller still holds the provisional id; the id map routes it.
        handle
            .update_item(&provisional, patch(&[("title", json!("published"))]))
            .unwrap();
        handle.flush().await;

        assert_eq!(handle.pending_ops(), 0);
        let records = remote.fetch_collection("research-entries").await.unwrap();
        assert_eq!(records[0].fields.get("title"), Some(&json!("published")));
    }

    #[tokio::test]
    async fn failed_op_blocks_the_drain_and_sets_the_error_slot() {
        let remote = MemoryRemote::new();
        let engine =
            SyncEngine::with_connectivity(MemoryStore::new(), remote.clone(), Connectivity::Offline);
        let handle = engine.collection::<ResearchEntry>("corrections");
        handle.add_item(entry("one")).unwrap();
        handle.add_item(entry("two")).unwrap();

        remote.fail_next("write rejected by rules");
        let report = handle.flush().await;

        assert_eq!(report, FlushReport { applied: 0, failed: 1 });
        assert_eq!(handle.pending_ops(), 2);
        assert!(handle.error().unwrap().contains("write rejected by rules"));

        // The retry drains both, and a refresh clears the error slot.
        let report = handle.flush().await;
        assert_eq!(report, FlushReport { applied: 2, failed: 0 });
        handle.refresh().await;
        assert_eq!(handle.error(), None);
        assert_eq!(remote.record_count("corrections"), 2);
    }

    #[tokio::test]
    async fn deleting_a_pending_insert_never_reaches_the_remote() {
        let remote = MemoryRemote::new();
        let engine =
            SyncEngine::with_connectivity(MemoryStore::new(), remote.clone(), Connectivity::Offline);
        let handle = engine.collection::<ResearchEntry>("research-entries");

        let id = handle.add_item(entry("second thoughts")).unwrap();
        handle.delete_item(&id).unwrap();

        assert_eq!(handle.pending_ops(), 0);
        let report = handle.flush().await;
        assert_eq!(report, FlushReport::default());
        assert_eq!(remote.record_count("research-entries"), 0);
    }

    // ========================================================================
    // Snapshots and reconnection
    // ========================================================================

    #[tokio::test]
    async fn subscription_snapshot_replaces_the_cache_wholesale() {
        let remote = MemoryRemote::new();
        remote
            .insert("research-entries", payload("older"))
            .await
            .unwrap();
        remote
            .insert("research-entries", payload("newer"))
            .await
            .unwrap();

        let engine = SyncEngine::new(MemoryStore::new(), remote.clone());
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let mut rev = handle.changed();
        eventually(&mut rev, || handle.items().len() == 2).await;

        let titles: Vec<_> = handle.items().iter().map(|e| e.title.clone()).collect();
        assert_eq!(titles, ["newer", "older"]);
        assert!(!handle.loading());

        remote
            .insert("research-entries", payload("newest"))
            .await
            .unwrap();
        eventually(&mut rev, || handle.items().len() == 3).await;
        assert_eq!(handle.items()[0].title, "newest");
    }

    #[tokio::test]
    async fn loading_holds_until_the_first_snapshot() {
        let engine = SyncEngine::new(MemoryStore::new(), MemoryRemote::new());
        let handle = engine.collection::<ResearchEntry>("research-entries");

        // The sync task has not run yet on this runtime.
        assert!(handle.loading());

        let mut rev = handle.changed();
        eventually(&mut rev, || !handle.loading()).await;
    }

    #[tokio::test]
    async fn unconfirmed_insert_survives_snapshots_until_reconnect_confirms_it() {
        let remote = MemoryRemote::new();
        let engine = SyncEngine::new(MemoryStore::new(), remote.clone());
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let mut rev = handle.changed();
        eventually(&mut rev, || !handle.loading()).await;

        // The store goes down; the optimistic insert stays queued and the
        // engine notices it is offline.
        remote.set_unavailable(true);
        let mut connectivity = engine.watch_connectivity();
        handle.add_item(entry("written while down")).unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while *connectivity.borrow_and_update() != Connectivity::Offline {
                connectivity.changed().await.unwrap();
            }
        })
        .await
        .expect("engine never noticed the outage");
        assert_eq!(handle.pending_ops(), 1);

        // The store recovers. Another client publishes a record; the pushed
        // snapshot must not clobber the unconfirmed insert.
        remote.set_unavailable(false);
        remote
            .insert("research-entries", payload("from elsewhere"))
            .await
            .unwrap();
        eventually(&mut rev, || handle.items().len() == 2).await;
        let items = handle.items();
        assert!(items[0].id.is_provisional());
        assert_eq!(items[0].title, "written while down");
        assert_eq!(items[1].title, "from elsewhere");

        // Reconnect drains the outbox and the insert is confirmed.
        engine.reconnect();
        eventually(&mut rev, || handle.pending_ops() == 0).await;
        eventually(&mut rev, || {
            handle.items().iter().all(|e| e.id.as_remote().is_some())
        })
        .await;
        assert_eq!(remote.record_count("research-entries"), 2);
    }

    #[tokio::test]
    async fn pushed_stream_errors_leave_served_data_untouched() {
        let remote = MemoryRemote::new();
        remote
            .insert("research-entries", payload("already served"))
            .await
            .unwrap();
        let engine = SyncEngine::new(MemoryStore::new(), remote.clone());
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let mut rev = handle.changed();
        eventually(&mut rev, || handle.items().len() == 1).await;

        remote.emit_collection_error("research-entries", "listener dropped");
        eventually(&mut rev, || handle.error().is_some()).await;
        assert!(handle.error().unwrap().contains("listener dropped"));
        assert_eq!(handle.items()[0].title, "already served");
        assert!(!handle.loading());

        // The next clean snapshot clears it.
        handle.refresh().await;
        assert_eq!(handle.error(), None);
    }

    #[tokio::test]
    async fn snapshot_skips_records_that_do_not_decode() {
        let remote = MemoryRemote::new();
        remote
            .insert("research-entries", payload("fine"))
            .await
            .unwrap();
        remote
            .insert(
                "research-entries",
                patch(&[("title", json!(42)), ("contentNumber", json!("bogus"))]),
            )
            .await
            .unwrap();

        let engine = SyncEngine::new(MemoryStore::new(), remote.clone());
        let handle = engine.collection::<ResearchEntry>("research-entries");
        let mut rev = handle.changed();
        eventually(&mut rev, || handle.items().len() == 1).await;
        assert_eq!(handle.items()[0].title, "fine");
    }
}
