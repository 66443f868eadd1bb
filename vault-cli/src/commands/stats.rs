//! Show or edit the social-statistics document.

use anyhow::Result;
use serde_json::json;
use std::path::Path;
use vault_engine::{RemoteStore, SyncEngine};
use vault_local::LocalStore;
use vault_types::{Fields, SocialStats, Timestamp};

use super::{format_millis, report_queue, STATS_COLLECTION, STATS_DOC};
use crate::admin;

/// Field updates for the set command.
#[derive(Debug, Default)]
pub struct SetArgs {
    /// Published video count.
    pub videos: Option<u64>,
    /// Follower count.
    pub followers: Option<u64>,
    /// Total view count.
    pub views: Option<u64>,
    /// Total like count.
    pub likes: Option<u64>,
}

/// Show the cached statistics.
pub async fn show<S: LocalStore, R: RemoteStore>(engine: &SyncEngine<S, R>) -> Result<()> {
    let handle = engine.document::<SocialStats>(STATS_COLLECTION, STATS_DOC);
    let stats = handle.get().unwrap_or_default();

    println!("=== Social statistics ===");
    println!();
    print_stats(&stats);

    let pending = handle.pending_ops();
    if pending > 0 {
        println!();
        println!("  {} queued write(s) waiting for a reconcile", pending);
    }

    Ok(())
}

/// Update statistics fields. Requires an active admin session.
pub async fn set<S: LocalStore, R: RemoteStore>(
    engine: &SyncEngine<S, R>,
    data_dir: &Path,
    args: SetArgs,
) -> Result<()> {
    admin::require_session(data_dir)?;

    let mut patch = Fields::new();
    if let Some(videos) = args.videos {
        patch.insert("videos".to_string(), json!(videos));
    }
    if let Some(followers) = args.followers {
        patch.insert("followers".to_string(), json!(followers));
    }
    if let Some(views) = args.views {
        patch.insert("views".to_string(), json!(views));
    }
    if let Some(likes) = args.likes {
        patch.insert("likes".to_string(), json!(likes));
    }
    if patch.is_empty() {
        anyhow::bail!(
            "Nothing to update. Pass at least one of --videos, --followers, --views, --likes."
        );
    }
    patch.insert(
        "lastUpdated".to_string(),
        json!(Timestamp::now().as_millis().to_string()),
    );

    let handle = engine.document::<SocialStats>(STATS_COLLECTION, STATS_DOC);
    handle.update_document(patch)?;
    handle.flush().await;

    println!("Statistics updated:");
    println!();
    print_stats(&handle.get().unwrap_or_default());
    println!();
    report_queue(handle.pending_ops());

    Ok(())
}

fn print_stats(stats: &SocialStats) {
    println!("  Videos:    {}", stats.videos);
    println!("  Followers: {}", stats.followers);
    println!("  Views:     {}", stats.views);
    println!("  Likes:     {}", stats.likes);
    let updated = stats
        .last_updated
        .as_deref()
        .and_then(|ms| ms.parse::<u64>().ok());
    match updated {
        Some(ms) => println!("  Updated:   {}", format_millis(ms)),
        None => println!("  Updated:   never"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vault_engine::MemoryRemote;
    use vault_local::MemoryStore;

    #[tokio::test]
    async fn show_with_no_data_prints_defaults() {
        let engine = SyncEngine::offline(MemoryStore::new());
        show(&engine).await.unwrap();
    }

    #[tokio::test]
    async fn set_without_login_fails() {
        let dir = tempdir().unwrap();
        let engine = SyncEngine::offline(MemoryStore::new());

        let args = SetArgs {
            followers: Some(10),
            ..Default::default()
        };
        let result = set(&engine, dir.path(), args).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Not logged in"));
    }

    #[tokio::test]
    async fn set_without_fields_fails() {
        let dir = tempdir().unwrap();
        admin::start_session(dir.path()).await.unwrap();
        let engine = SyncEngine::offline(MemoryStore::new());

        let result = set(&engine, dir.path(), SetArgs::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn set_updates_the_cache_even_offline() {
        let dir = tempdir().unwrap();
        admin::start_session(dir.path()).await.unwrap();
        let engine = SyncEngine::offline(MemoryStore::new());

        let args = SetArgs {
            videos: Some(42),
            followers: Some(125_000),
            ..Default::default()
        };
        set(&engine, dir.path(), args).await.unwrap();

        let handle = engine.document::<SocialStats>(STATS_COLLECTION, STATS_DOC);
        let stats = handle.get().unwrap();
        assert_eq!(stats.videos, 42);
        assert_eq!(stats.followers, 125_000);
        assert_eq!(stats.views, 0);
        assert!(stats.last_updated.is_some());
        assert_eq!(handle.pending_ops(), 1);
    }

    #[tokio::test]
    async fn set_reaches_a_live_remote() {
        let dir = tempdir().unwrap();
        admin::start_session(dir.path()).await.unwrap();
        let remote = MemoryRemote::new();
        let engine = SyncEngine::new(MemoryStore::new(), remote.clone());

        let args = SetArgs {
            likes: Some(900),
            ..Default::default()
        };
        set(&engine, dir.path(), args).await.unwrap();

        let stored = remote.document(STATS_COLLECTION, STATS_DOC).unwrap();
        assert_eq!(stored.get("likes"), Some(&json!(900)));
    }
}
