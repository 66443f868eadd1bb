//! Identity and ordering types for Vaultic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// The identifier of a synced record.
///
/// A record created locally carries a client-generated [`Provisional`]
/// identifier until the remote store confirms the insert and assigns its own.
/// The provisional id stays the record's stable local key until that
/// confirmation, at which point it is rewritten in place to [`Remote`].
///
/// [`Provisional`]: RecordId::Provisional
/// [`Remote`]: RecordId::Remote
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "origin", content = "id", rename_all = "snake_case")]
pub enum RecordId {
    /// Client-generated UUID v4, awaiting remote confirmation.
    Provisional(uuid::Uuid),
    /// Remote-assigned authoritative identifier.
    Remote(String),
}

impl RecordId {
    /// Generate a fresh provisional identifier.
    pub fn provisional() -> Self {
        Self::Provisional(uuid::Uuid::new_v4())
    }

    /// Wrap a remote-assigned identifier.
    pub fn remote(id: impl Into<String>) -> Self {
        Self::Remote(id.into())
    }

    /// True while the record awaits remote confirmation.
    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    /// The provisional UUID, if this id is still provisional.
    pub fn as_provisional(&self) -> Option<uuid::Uuid> {
        match self {
            Self::Provisional(id) => Some(*id),
            Self::Remote(_) => None,
        }
    }

    /// The remote identifier, if confirmed.
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            Self::Provisional(_) => None,
            Self::Remote(id) => Some(id),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisional(id) => write!(f, "{id}"),
            Self::Remote(id) => write!(f, "{id}"),
        }
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.to_string();
        let short = &rendered[..rendered.len().min(8)];
        match self {
            Self::Provisional(_) => write!(f, "RecordId(provisional:{short})"),
            Self::Remote(_) => write!(f, "RecordId(remote:{short})"),
        }
    }
}

/// Milliseconds since the Unix epoch.
///
/// Creation timestamps are remote-assigned where possible; records created
/// offline carry a local [`Timestamp::now`] until confirmation.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, Debug,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }

    /// Construct from raw milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Raw milliseconds since the epoch.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// The next representable instant, for monotonic assignment.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
