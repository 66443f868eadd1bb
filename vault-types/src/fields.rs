//! The schemaless remote-store boundary.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// The JSON key under which a record's identifier is stored.
pub const ID_FIELD: &str = "id";

/// The JSON key under which a record's creation timestamp is stored.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A schemaless field bag.
///
/// Documents on the remote side are bags of named fields merged by key; the
/// same shape is the unit of partial updates throughout Vaultic.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// One record as the remote store reports it.
///
/// The id and creation timestamp are remote-assigned; `fields` holds the
/// record body without either.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Remote-assigned document identifier.
    pub id: String,
    /// Remote-assigned creation timestamp, used for newest-first ordering.
    pub created_at: Timestamp,
    /// The record body.
    pub fields: Fields,
}

impl RemoteRecord {
    /// Construct a remote record.
    pub fn new(id: impl Into<String>, created_at: Timestamp, fields: Fields) -> Self {
        Self {
            id: id.into(),
            created_at,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_record_round_trip() {
        let mut fields = Fields::new();
        fields.insert("title".into(), serde_json::json!("Black holes"));
        let record = RemoteRecord::new("doc-1", Timestamp::from_millis(42), fields);
        let json = serde_json::to_string(&record).unwrap();
        let back: RemoteRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
