//! Conversions between typed records and the schemaless remote boundary.
//!
//! The remote store holds documents as field bags merged by key. This module
//! moves records across that boundary: serializing a record to an insert
//! payload (the remote assigns id and creation timestamp, so both are
//! stripped), rebuilding a typed record from a delivered [`RemoteRecord`],
//! and applying partial-field patches to typed values.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use vault_types::{Fields, Record, RecordId, RemoteRecord, CREATED_AT_FIELD, ID_FIELD};

/// Error type for record/field-bag conversions.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value serialized to something other than a JSON object.
    #[error("record did not serialize to an object")]
    NotAnObject,

    /// Underlying serialization failure.
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize any record-shaped value to a field bag.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, CodecError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(fields) => Ok(fields),
        _ => Err(CodecError::NotAnObject),
    }
}

/// Deserialize a field bag into a typed value.
pub fn from_fields<T: DeserializeOwned>(fields: Fields) -> Result<T, CodecError> {
    Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
}

/// Shallow-merge `patch` into `base` by key; patch values win.
pub fn merge_fields(base: &mut Fields, patch: &Fields) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}

/// The insert payload for a record: its fields without id or creation
/// timestamp, since the remote store assigns its own.
pub fn insert_payload<T: Record>(record: &T) -> Result<Fields, CodecError> {
    let mut fields = to_fields(record)?;
    fields.remove(ID_FIELD);
    fields.remove(CREATED_AT_FIELD);
    Ok(fields)
}

/// Rebuild a typed record from a remote-delivered one.
///
/// The remote-assigned id and creation timestamp overwrite anything the
/// field bag may carry under those keys.
pub fn record_from_remote<T: Record>(remote: &RemoteRecord) -> Result<T, CodecError> {
    let mut fields = remote.fields.clone();
    fields.insert(
        ID_FIELD.to_string(),
        serde_json::to_value(RecordId::remote(&remote.id))?,
    );
    fields.insert(
        CREATED_AT_FIELD.to_string(),
        serde_json::to_value(remote.created_at)?,
    );
    from_fields(fields)
}

/// Merge a partial-field patch into a typed record.
///
/// The record's identifier is preserved even if the patch carries one.
pub fn apply_patch<T: Record>(record: &T, patch: &Fields) -> Result<T, CodecError> {
    let id = record.id().clone();
    let mut fields = to_fields(record)?;
    merge_fields(&mut fields, patch);
    fields.insert(ID_FIELD.to_string(), serde_json::to_value(&id)?);
    from_fields(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vault_types::{ContentType, Platform, ResearchEntry, Timestamp};

    fn entry() -> ResearchEntry {
        let mut entry = ResearchEntry::new(4, "Saturn rings", Platform::Youtube, ContentType::Video);
        entry.tags = vec!["space".into()];
        entry.created_at = Some(Timestamp::from_millis(100));
        entry
    }

    #[test]
    fn insert_payload_strips_identity() {
        let payload = insert_payload(&entry()).unwrap();
        assert!(!payload.contains_key(ID_FIELD));
        assert!(!payload.contains_key(CREATED_AT_FIELD));
        assert_eq!(payload.get("title"), Some(&json!("Saturn rings")));
    }

    #[test]
    fn record_from_remote_injects_identity() {
        let payload = insert_payload(&entry()).unwrap();
        let remote = RemoteRecord::new("doc-7", Timestamp::from_millis(555), payload);
        let rebuilt: ResearchEntry = record_from_remote(&remote).unwrap();
        assert_eq!(rebuilt.id.as_remote(), Some("doc-7"));
        assert_eq!(rebuilt.created_at, Some(Timestamp::from_millis(555)));
        assert_eq!(rebuilt.title, "Saturn rings");
    }

    #[test]
    fn merge_fields_patch_wins() {
        let mut base = to_fields(&json!({"a": 1, "b": 2})).unwrap();
        let patch = to_fields(&json!({"b": 3, "c": 4})).unwrap();
        merge_fields(&mut base, &patch);
        assert_eq!(base.get("a"), Some(&json!(1)));
        assert_eq!(base.get("b"), Some(&json!(3)));
        assert_eq!(base.get("c"), Some(&json!(4)));
    }

    #[test]
    fn apply_patch_preserves_id() {
        let original = entry();
        let mut patch = Fields::new();
        patch.insert("title".into(), json!("Saturn's rings"));
        patch.insert(ID_FIELD.into(), json!("bogus"));
        let patched = apply_patch(&original, &patch).unwrap();
        assert_eq!(patched.title, "Saturn's rings");
        assert_eq!(patched.id, original.id);
        assert_eq!(patched.content_number, original.content_number);
    }

    #[test]
    fn non_object_is_rejected() {
        let err = to_fields(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject));
    }
}
