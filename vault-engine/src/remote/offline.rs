//! The explicit no-backend state.

use super::{
    CollectionSubscription, DocumentSubscription, RemoteError, RemoteStore,
};
use async_trait::async_trait;
use vault_types::{Fields, RemoteRecord};

/// A remote store that is permanently unreachable.
///
/// Wired by `SyncEngine::offline` when no backend is configured, so the
/// engine carries an explicit offline state instead of a nullable handle.
/// Every operation reports [`RemoteError::Unavailable`]; nothing is ever
/// delivered.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineRemote;

impl OfflineRemote {
    fn unavailable() -> RemoteError {
        RemoteError::Unavailable("no remote store configured".into())
    }
}

#[async_trait]
impl RemoteStore for OfflineRemote {
    async fn insert(&self, _collection: &str, _payload: Fields) -> Result<RemoteRecord, RemoteError> {
        Err(Self::unavailable())
    }

    async fn update(&self, _collection: &str, _id: &str, _patch: Fields) -> Result<(), RemoteError> {
        Err(Self::unavailable())
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<(), RemoteError> {
        Err(Self::unavailable())
    }

    async fn merge_document(
        &self,
        _collection: &str,
        _doc_id: &str,
        _patch: Fields,
    ) -> Result<(), RemoteError> {
        Err(Self::unavailable())
    }

    async fn fetch_collection(&self, _collection: &str) -> Result<Vec<RemoteRecord>, RemoteError> {
        Err(Self::unavailable())
    }

    async fn fetch_document(
        &self,
        _collection: &str,
        _doc_id: &str,
    ) -> Result<Option<Fields>, RemoteError> {
        Err(Self::unavailable())
    }

    async fn subscribe_collection(
        &self,
        _collection: &str,
    ) -> Result<CollectionSubscription, RemoteError> {
        Err(Self::unavailable())
    }

    async fn subscribe_document(
        &self,
        _collection: &str,
        _doc_id: &str,
    ) -> Result<DocumentSubscription, RemoteError> {
        Err(Self::unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_operation_is_unavailable() {
        let remote = OfflineRemote;
        assert!(matches!(
            remote.insert("research-entries", Fields::new()).await,
            Err(RemoteError::Unavailable(_))
        ));
        assert!(matches!(
            remote.fetch_document("stats", "social-stats").await,
            Err(RemoteError::Unavailable(_))
        ));
        assert!(matches!(
            remote.subscribe_collection("research-entries").await,
            Err(RemoteError::Unavailable(_))
        ));
    }
}
