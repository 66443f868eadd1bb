//! Directory-backed slot store.

use crate::{LocalStore, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One JSON file per slot under a data directory.
///
/// Slot keys map to flat file names (path separators become `__`), so the
/// store never creates nested directories. Writes go straight through on
/// every put.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The directory slots are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| match c {
                '/' => "__".to_string(),
                c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => c.to_string(),
                _ => '-'.to_string(),
            })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

impl LocalStore for DirStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.slot_path(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key);
        std::fs::write(&path, value).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collection_slot, document_slot};

    #[test]
    fn round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.put_raw(&collection_slot("research-entries"), "[1,2]").unwrap();
        assert_eq!(
            store
                .get_raw(&collection_slot("research-entries"))
                .unwrap()
                .as_deref(),
            Some("[1,2]")
        );
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DirStore::open(dir.path()).unwrap();
            store.put("counts", &vec![4u32, 5]).unwrap();
        }
        let reopened = DirStore::open(dir.path()).unwrap();
        let counts: Vec<u32> = reopened.get_or("counts", Vec::new());
        assert_eq!(counts, vec![4, 5]);
    }

    #[test]
    fn missing_slot_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        let value: Option<u32> = store.get("nope").unwrap();
        assert!(value.is_none());
        assert_eq!(store.get_or("nope", 9u32), 9);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.put_raw("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.get_raw("k").unwrap().is_none());
    }

    #[test]
    fn slot_keys_map_to_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.put_raw(&collection_slot("stats"), "a").unwrap();
        store
            .put_raw(&document_slot("stats", "social-stats"), "b")
            .unwrap();

        assert_eq!(store.get_raw(&collection_slot("stats")).unwrap().as_deref(), Some("a"));
        assert_eq!(
            store
                .get_raw(&document_slot("stats", "social-stats"))
                .unwrap()
                .as_deref(),
            Some("b")
        );
        // Files are flat, directly under the root.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|name| name.ends_with(".json")));
    }
}
