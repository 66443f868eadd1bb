//! # vault-core
//!
//! Pure synchronization logic for Vaultic (no I/O, instant tests).
//!
//! This crate implements the outbox, snapshot-application, and merge rules
//! for the local-first data layer without any disk or network I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about reconciliation rules
//!
//! The actual I/O (local slots, remote store, background tasks) is performed
//! by `vault-local` and `vault-engine`, which drive these structures.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod collection;
pub mod document;
pub mod outbox;

pub use codec::{
    apply_patch, from_fields, insert_payload, merge_fields, record_from_remote, to_fields,
    CodecError,
};
pub use collection::CollectionCache;
pub use document::DocumentCache;
pub use outbox::{OpKind, OpStatus, Outbox, OutboxOp};
