//! # vault-local
//!
//! Keyed local persistence slots for the Vaultic data layer.
//!
//! A slot holds the serialized snapshot of one last-known-good value: one
//! slot per synced collection, one per (collection, document id) pair, one
//! per outbox. Reads are synchronous and never block on anything remote;
//! writes go through on every update. There is no expiry, no versioning,
//! and no migration between shapes - a stored value that no longer decodes
//! yields the caller-supplied default.
//!
//! Two stores are provided:
//! - [`MemoryStore`] - concurrent in-memory map, for tests and ephemeral runs
//! - [`DirStore`] - one JSON file per slot under a data directory

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dir;
mod error;
mod keys;
mod memory;
mod store;

pub use dir::DirStore;
pub use error::StoreError;
pub use keys::{collection_slot, document_slot, outbox_slot};
pub use memory::MemoryStore;
pub use store::LocalStore;
