//! Persisted outbox of remote operations.
//!
//! Every local mutation enqueues an operation here instead of firing a
//! remote write and forgetting it. Operations carry a status
//! (pending/applied/failed) and the whole outbox serializes into one local
//! slot, so queued writes survive restarts and reconcile on reconnect.
//!
//! Draining replays operations oldest-first and stops at the first failure;
//! writes never reorder. The outbox also owns the provisional-to-remote id
//! map recorded when inserts are confirmed.

use crate::codec::merge_fields;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use vault_types::{Fields, RecordId, Timestamp};

/// What an operation does on the remote store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpKind {
    /// Insert a new record; `local_id` is the provisional key.
    Insert {
        /// Provisional UUID of the record awaiting confirmation.
        local_id: Uuid,
        /// Record body without id or creation timestamp.
        payload: Fields,
    },
    /// Merge a partial-field patch into one record.
    Update {
        /// The record to patch; provisional ids resolve through the id map.
        target: RecordId,
        /// Fields to merge by key.
        patch: Fields,
    },
    /// Delete one record.
    Delete {
        /// The record to delete.
        target: RecordId,
    },
    /// Merge a partial-field patch into a fixed document
    /// (create-or-update).
    MergeDocument {
        /// Document id within the collection.
        doc_id: String,
        /// Fields to merge by key.
        patch: Fields,
    },
}

/// Delivery status of an outbox operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    /// Not yet attempted, or re-queued behind an earlier failure.
    Pending,
    /// Confirmed by the remote store.
    Applied,
    /// The last attempt failed; retried on the next drain.
    Failed,
}

/// One queued remote operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboxOp {
    /// Unique identifier of this operation.
    pub op_id: Uuid,
    /// Collection the operation targets.
    pub collection: String,
    /// What the operation does.
    pub kind: OpKind,
    /// Delivery status.
    pub status: OpStatus,
    /// How many delivery attempts have failed.
    pub attempts: u32,
    /// The most recent failure, if any.
    pub last_error: Option<String>,
    /// When the operation was first queued.
    pub queued_at: Timestamp,
}

impl OutboxOp {
    fn new(collection: &str, kind: OpKind) -> Self {
        Self {
            op_id: Uuid::new_v4(),
            collection: collection.to_string(),
            kind,
            status: OpStatus::Pending,
            attempts: 0,
            last_error: None,
            queued_at: Timestamp::now(),
        }
    }

    /// True until the remote store confirms the operation.
    pub fn is_unapplied(&self) -> bool {
        self.status != OpStatus::Applied
    }
}

/// The persisted outbox: ordered operations plus the id map.
///
/// Operations flow through the outbox in this order:
/// 1. `record_*()` - queued by a local mutation
/// 2. `next_unapplied()` - picked up by a drain, oldest first
/// 3. `mark_applied()` / `confirm_insert()` - remote confirmed
/// 4. `prune_applied()` - confirmed operations dropped after a clean drain
///
/// A failed attempt calls `mark_failed()`; the operation keeps its place in
/// the queue and the drain stops until the next reconcile.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outbox {
    ops: Vec<OutboxOp>,
    id_map: HashMap<Uuid, String>,
}

impl Outbox {
    /// An empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert for a freshly created provisional record.
    ///
    /// Returns the operation id.
    pub fn record_insert(&mut self, collection: &str, local_id: Uuid, payload: Fields) -> Uuid {
        let op = OutboxOp::new(collection, OpKind::Insert { local_id, payload });
        let op_id = op.op_id;
        self.ops.push(op);
        op_id
    }

    /// Queue an update for a record.
    ///
    /// An update targeting a record whose insert has not been applied yet
    /// folds its patch into that insert's payload instead of queuing a
    /// separate operation.
    pub fn record_update(&mut self, collection: &str, target: &RecordId, patch: Fields) -> Uuid {
        if let Some(local_id) = target.as_provisional() {
            if let Some(op) = self.unapplied_insert_mut(local_id) {
                if let OpKind::Insert { payload, .. } = &mut op.kind {
                    merge_fields(payload, &patch);
                }
                return op.op_id;
            }
        }
        let op = OutboxOp::new(
            collection,
            OpKind::Update {
                target: target.clone(),
                patch,
            },
        );
        let op_id = op.op_id;
        self.ops.push(op);
        op_id
    }

    /// Queue a delete for a record.
    ///
    /// Deleting a record whose insert has not been applied cancels the
    /// insert (and any updates folded behind it) without touching the
    /// remote store; `None` is returned in that case.
    pub fn record_delete(&mut self, collection: &str, target: &RecordId) -> Option<Uuid> {
        if let Some(local_id) = target.as_provisional() {
            if self.unapplied_insert_mut(local_id).is_some() {
                self.ops.retain(|op| !op_targets_local(op, local_id));
                return None;
            }
        }
        let op = OutboxOp::new(
            collection,
            OpKind::Delete {
                target: target.clone(),
            },
        );
        let op_id = op.op_id;
        self.ops.push(op);
        Some(op_id)
    }

    /// Queue a merge-write for a fixed document.
    ///
    /// Consecutive merge-writes to the same document fold into one
    /// operation while it is unapplied.
    pub fn record_merge_document(&mut self, collection: &str, doc_id: &str, patch: Fields) -> Uuid {
        if let Some(op) = self.ops.iter_mut().rev().find(|op| op.is_unapplied()) {
            if let OpKind::MergeDocument {
                doc_id: queued_doc,
                patch: queued_patch,
            } = &mut op.kind
            {
                if op.collection == collection && queued_doc == doc_id {
                    merge_fields(queued_patch, &patch);
                    return op.op_id;
                }
            }
        }
        let op = OutboxOp::new(
            collection,
            OpKind::MergeDocument {
                doc_id: doc_id.to_string(),
                patch,
            },
        );
        let op_id = op.op_id;
        self.ops.push(op);
        op_id
    }

    /// The oldest operation still awaiting confirmation.
    pub fn next_unapplied(&self) -> Option<&OutboxOp> {
        self.ops.iter().find(|op| op.is_unapplied())
    }

    /// Mark an operation confirmed.
    pub fn mark_applied(&mut self, op_id: Uuid) {
        if let Some(op) = self.op_mut(op_id) {
            op.status = OpStatus::Applied;
            op.last_error = None;
        }
    }

    /// Mark an insert confirmed and record the assigned remote id.
    pub fn confirm_insert(&mut self, op_id: Uuid, remote_id: &str) {
        let mut local_id = None;
        if let Some(op) = self.op_mut(op_id) {
            op.status = OpStatus::Applied;
            op.last_error = None;
            if let OpKind::Insert { local_id: id, .. } = &op.kind {
                local_id = Some(*id);
            }
        }
        if let Some(id) = local_id {
            self.id_map.insert(id, remote_id.to_string());
        }
    }

    /// Record a failed delivery attempt.
    pub fn mark_failed(&mut self, op_id: Uuid, error: &str) {
        if let Some(op) = self.op_mut(op_id) {
            op.status = OpStatus::Failed;
            op.attempts += 1;
            op.last_error = Some(error.to_string());
        }
    }

    /// Resolve a record id to the authoritative remote id, when known.
    pub fn resolve(&self, id: &RecordId) -> Option<String> {
        match id {
            RecordId::Remote(remote) => Some(remote.clone()),
            RecordId::Provisional(local) => self.id_map.get(local).cloned(),
        }
    }

    /// The remote id confirmed for a provisional record, if any.
    pub fn remote_id_for(&self, local_id: Uuid) -> Option<&str> {
        self.id_map.get(&local_id).map(String::as_str)
    }

    /// Provisional ids whose inserts have not been confirmed.
    ///
    /// Records with these ids survive wholesale snapshot replacement.
    pub fn unconfirmed_inserts(&self) -> HashSet<Uuid> {
        self.ops
            .iter()
            .filter(|op| op.is_unapplied())
            .filter_map(|op| match &op.kind {
                OpKind::Insert { local_id, .. } => Some(*local_id),
                _ => None,
            })
            .collect()
    }

    /// Unconfirmed merge-write patches for one document, oldest first.
    ///
    /// Replayed over an incoming document snapshot so queued local edits
    /// are not clobbered by stale remote state.
    pub fn unapplied_document_patches(&self, collection: &str, doc_id: &str) -> Vec<Fields> {
        self.ops
            .iter()
            .filter(|op| op.is_unapplied() && op.collection == collection)
            .filter_map(|op| match &op.kind {
                OpKind::MergeDocument {
                    doc_id: queued_doc,
                    patch,
                } if queued_doc == doc_id => Some(patch.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drop confirmed operations; the id map is retained.
    pub fn prune_applied(&mut self) {
        self.ops.retain(|op| op.is_unapplied());
    }

    /// Iterate over all queued operations, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &OutboxOp> {
        self.ops.iter()
    }

    /// Number of queued operations (any status).
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when no operations are queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True while any operation awaits confirmation.
    pub fn has_unapplied(&self) -> bool {
        self.ops.iter().any(|op| op.is_unapplied())
    }

    /// Number of operations with the given status.
    pub fn count(&self, status: OpStatus) -> usize {
        self.ops.iter().filter(|op| op.status == status).count()
    }

    fn op_mut(&mut self, op_id: Uuid) -> Option<&mut OutboxOp> {
        self.ops.iter_mut().find(|op| op.op_id == op_id)
    }

    fn unapplied_insert_mut(&mut self, local_id: Uuid) -> Option<&mut OutboxOp> {
        self.ops.iter_mut().find(|op| {
            op.is_unapplied() && matches!(&op.kind, OpKind::Insert { local_id: id, .. } if *id == local_id)
        })
    }
}

fn op_targets_local(op: &OutboxOp, local_id: Uuid) -> bool {
    match &op.kind {
        OpKind::Insert { local_id: id, .. } => *id == local_id,
        OpKind::Update { target, .. } | OpKind::Delete { target } => {
            target.as_provisional() == Some(local_id)
        }
        OpKind::MergeDocument { .. } => false,
    }
}
