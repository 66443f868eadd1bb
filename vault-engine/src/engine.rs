//! The sync engine: connectivity state and handle construction.
//!
//! `SyncEngine` owns the injected local and remote stores plus the
//! connectivity watch every handle observes. Flipping to online triggers
//! each live handle to drain its outbox and refresh its snapshot.

use crate::collection::CollectionHandle;
use crate::document::DocumentHandle;
use crate::remote::{OfflineRemote, RemoteError, RemoteStore};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;
use vault_core::outbox::{OpKind, OutboxOp};
use vault_core::CodecError;
use vault_local::{LocalStore, StoreError};
use vault_types::{Document, Record, RecordId, RemoteRecord};

/// Whether the engine currently attempts remote work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    /// Remote operations are attempted; subscriptions run.
    Online,
    /// Everything is served from the local cache; the outbox accumulates.
    Offline,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

/// Errors a handle mutator can surface synchronously.
///
/// Remote failures never appear here - they land in the handle's error slot
/// and the op stays queued.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A local slot write failed.
    #[error("local store failure: {0}")]
    Store(#[from] StoreError),

    /// A record or patch failed to encode.
    #[error("record encoding failed: {0}")]
    Codec(#[from] CodecError),
}

/// What one outbox drain accomplished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Operations the remote store confirmed.
    pub applied: usize,
    /// Operations that failed (at most one; the drain stops there).
    pub failed: usize,
}

/// Result of delivering one outbox op to the remote store.
pub(crate) enum OpOutcome {
    /// An insert was confirmed under a remote-assigned identity.
    Inserted {
        /// Provisional id of the record that was inserted.
        local_id: Uuid,
        /// The remote-assigned record.
        record: RemoteRecord,
    },
    /// The operation applied; nothing further to record.
    Done,
}

/// Deliver one queued operation to the remote store.
///
/// `resolve` maps a record id to the authoritative remote id; an
/// unresolvable target is rejected without contacting the store.
pub(crate) async fn deliver_op<R: RemoteStore>(
    remote: &R,
    resolve: impl Fn(&RecordId) -> Option<String>,
    op: &OutboxOp,
) -> Result<OpOutcome, RemoteError> {
    match &op.kind {
        OpKind::Insert { local_id, payload } => {
            let record = remote.insert(&op.collection, payload.clone()).await?;
            Ok(OpOutcome::Inserted {
                local_id: *local_id,
                record,
            })
        }
        OpKind::Update { target, patch } => {
            let Some(id) = resolve(target) else {
                return Err(RemoteError::Rejected(format!(
                    "no confirmed remote id for {target}"
                )));
            };
            remote.update(&op.collection, &id, patch.clone()).await?;
            Ok(OpOutcome::Done)
        }
        OpKind::Delete { target } => {
            let Some(id) = resolve(target) else {
                return Err(RemoteError::Rejected(format!(
                    "no confirmed remote id for {target}"
                )));
            };
            remote.delete(&op.collection, &id).await?;
            Ok(OpOutcome::Done)
        }
        OpKind::MergeDocument { doc_id, patch } => {
            remote
                .merge_document(&op.collection, doc_id, patch.clone())
                .await?;
            Ok(OpOutcome::Done)
        }
    }
}

/// Flip the connectivity watch, waking observers only on a real change.
pub(crate) fn mark(connectivity: &watch::Sender<Connectivity>, state: Connectivity) {
    connectivity.send_if_modified(|current| {
        if *current == state {
            false
        } else {
            *current = state;
            true
        }
    });
}

/// The local-first sync engine.
///
/// Construction wires the local slot store and the remote store together;
/// handles created from the engine share both plus the connectivity watch.
pub struct SyncEngine<S: LocalStore, R: RemoteStore> {
    local: Arc<S>,
    remote: Arc<R>,
    connectivity: Arc<watch::Sender<Connectivity>>,
}

impl<S: LocalStore, R: RemoteStore> SyncEngine<S, R> {
    /// An engine that starts online against the given remote store.
    pub fn new(local: S, remote: R) -> Self {
        Self::with_connectivity(local, remote, Connectivity::Online)
    }

    /// An engine with an explicit initial connectivity.
    pub fn with_connectivity(local: S, remote: R, initial: Connectivity) -> Self {
        let (connectivity, _) = watch::channel(initial);
        Self {
            local: Arc::new(local),
            remote: Arc::new(remote),
            connectivity: Arc::new(connectivity),
        }
    }

    /// The current connectivity state.
    pub fn connectivity(&self) -> Connectivity {
        *self.connectivity.borrow()
    }

    /// A watch receiver that observes connectivity changes.
    pub fn watch_connectivity(&self) -> watch::Receiver<Connectivity> {
        self.connectivity.subscribe()
    }

    /// Go online: every live handle drains its outbox and refreshes.
    pub fn reconnect(&self) {
        mark(&self.connectivity, Connectivity::Online);
    }

    /// Stop attempting remote work.
    pub fn set_offline(&self) {
        mark(&self.connectivity, Connectivity::Offline);
    }

    /// A live handle onto one synced collection.
    pub fn collection<T: Record>(&self, name: &str) -> CollectionHandle<T, S, R> {
        CollectionHandle::new(
            name,
            Arc::clone(&self.local),
            Arc::clone(&self.remote),
            Arc::clone(&self.connectivity),
        )
    }

    /// A live handle onto one synced document.
    pub fn document<T: Document>(&self, collection: &str, doc_id: &str) -> DocumentHandle<T, S, R> {
        DocumentHandle::new(
            collection,
            doc_id,
            Arc::clone(&self.local),
            Arc::clone(&self.remote),
            Arc::clone(&self.connectivity),
        )
    }
}

impl<S: LocalStore> SyncEngine<S, OfflineRemote> {
    /// An engine with no remote backend; starts offline.
    pub fn offline(local: S) -> Self {
        Self::with_connectivity(local, OfflineRemote, Connectivity::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_local::MemoryStore;

    #[tokio::test]
    async fn engine_without_backend_starts_offline() {
        let engine = SyncEngine::offline(MemoryStore::new());
        assert_eq!(engine.connectivity(), Connectivity::Offline);
    }

    #[tokio::test]
    async fn reconnect_and_set_offline_flip_state() {
        let engine = SyncEngine::new(MemoryStore::new(), crate::MemoryRemote::new());
        assert_eq!(engine.connectivity(), Connectivity::Online);

        engine.set_offline();
        assert_eq!(engine.connectivity(), Connectivity::Offline);

        engine.reconnect();
        assert_eq!(engine.connectivity(), Connectivity::Online);
    }

    #[test]
    fn connectivity_display() {
        assert_eq!(Connectivity::Online.to_string(), "online");
        assert_eq!(Connectivity::Offline.to_string(), "offline");
    }
}
