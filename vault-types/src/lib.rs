//! # vault-types
//!
//! Record, identifier, and field-bag types for the Vaultic local-first data
//! layer.
//!
//! This crate provides the foundational types used across all Vaultic crates:
//! - [`RecordId`], [`Timestamp`] - Identity and ordering types
//! - [`Fields`], [`RemoteRecord`] - The schemaless remote-store boundary
//! - [`Record`] - Trait implemented by every synced collection record
//! - [`ResearchEntry`], [`Correction`], [`SocialStats`] - Domain records

#![warn(missing_docs)]
#![warn(clippy::all)]

mod content;
mod error;
mod fields;
mod ids;
mod record;

pub use content::{
    ContentType, Correction, CorrectionStatus, Credibility, Platform, ResearchEntry, Severity,
    SocialStats, Source, SourceKind,
};
pub use error::ParseError;
pub use fields::{Fields, RemoteRecord, CREATED_AT_FIELD, ID_FIELD};
pub use ids::{RecordId, Timestamp};
pub use record::{Document, Record};
