//! The slot storage trait.

use crate::StoreError;
use serde::{de::DeserializeOwned, Serialize};

/// Synchronous keyed slot storage.
///
/// Implementations store raw serialized strings; the typed accessors layer
/// JSON on top. `get_or` deliberately swallows decode and read failures and
/// hands back the caller-supplied default, so a reshaped or damaged slot
/// never blocks serving data.
pub trait LocalStore: Send + Sync + 'static {
    /// Read the raw slot contents, if the slot exists.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the slot.
    fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the slot. Removing an absent slot succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Read and decode a slot, erroring on undecodable contents.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read and decode a slot, falling back to `default` when the slot is
    /// absent, unreadable, or no longer decodes as `T`.
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T
    where
        Self: Sized,
    {
        match self.get_raw(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(key, %err, "stored slot no longer decodes, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(err) => {
                tracing::warn!(key, %err, "slot read failed, using default");
                default
            }
        }
    }

    /// Serialize and persist a value into a slot.
    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, &raw)
    }
}
