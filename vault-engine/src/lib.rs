//! # vault-engine
//!
//! Local-first sync engine for Vaultic.
//!
//! This is the main library that applications use to read and mutate synced
//! data. Every read is served synchronously from the local cache; every
//! mutation applies locally first and is reconciled with the remote store in
//! the background through a persisted outbox.
//!
//! ## Features
//!
//! - **Local-First Handles**: collection and document handles that never
//!   block on the remote store
//! - **Injectable Remote Store**: pluggable [`RemoteStore`] boundary
//!   ([`MemoryRemote`] in-process, [`OfflineRemote`] when no backend is
//!   configured)
//! - **Persisted Outbox**: queued remote writes with status, reconciled on
//!   reconnect
//! - **Pure Core**: reconciliation rules come from `vault-core`, which this
//!   crate only drives
//!
//! ## Example
//!
//! ```ignore
//! use vault_engine::{MemoryRemote, SyncEngine};
//! use vault_local::MemoryStore;
//! use vault_types::ResearchEntry;
//!
//! let engine = SyncEngine::new(MemoryStore::new(), MemoryRemote::new());
//! let research = engine.collection::<ResearchEntry>("research-entries");
//!
//! // Synchronous, optimistic
//! let id = research.add_item(entry)?;
//!
//! // Drain the outbox now instead of waiting for the background task
//! research.flush().await;
//! ```
//!
//! One live handle per collection per process: handles hydrate their outbox
//! from the local slot at construction, so two handles over the same
//! collection would race on it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod document;
pub mod engine;
pub mod remote;

pub use collection::CollectionHandle;
pub use document::DocumentHandle;
pub use engine::{Connectivity, EngineError, FlushReport, SyncEngine};
pub use remote::{
    CollectionEvent, CollectionSubscription, DocumentEvent, DocumentSubscription, MemoryRemote,
    OfflineRemote, RemoteError, RemoteStore,
};
pub use vault_core::outbox::{OpKind, OpStatus, OutboxOp};
