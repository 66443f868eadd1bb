//! Show site, session, and sync state.

use anyhow::Result;
use std::path::Path;
use vault_engine::{Connectivity, OpStatus, OutboxOp, RemoteStore, SyncEngine};
use vault_local::LocalStore;
use vault_types::{Correction, ResearchEntry, SocialStats};

use super::{
    format_millis, CORRECTIONS_COLLECTION, RESEARCH_COLLECTION, STATS_COLLECTION, STATS_DOC,
};
use crate::admin;
use crate::config::SiteConfig;

/// Run the status command.
pub async fn run<S: LocalStore, R: RemoteStore>(
    engine: &SyncEngine<S, R>,
    data_dir: &Path,
) -> Result<()> {
    println!("=== vaultic status ===");
    println!();

    // Site configuration
    match SiteConfig::load(data_dir).await {
        Ok(config) => {
            println!("Site:");
            println!("  Name:    {}", config.site_name);
            println!("  Creator: {}", config.creator);
            if let Some(tagline) = &config.tagline {
                println!("  Tagline: {}", tagline);
            }
            println!("  Init:    {}", format_millis(config.created_at));
        }
        Err(_) => {
            println!("Site: NOT INITIALIZED");
            println!();
            println!("Run 'vaultic init --name <name> --creator <creator>' to initialize.");
            return Ok(());
        }
    }

    println!();

    // Admin session
    if admin::session_active(data_dir) {
        println!("Session: admin session active");
    } else {
        println!("Session: locked (run 'vaultic login' to edit)");
    }

    println!();

    // Connectivity
    let connectivity = match engine.connectivity() {
        Connectivity::Online => "ONLINE",
        Connectivity::Offline => "OFFLINE (writes queue locally)",
    };
    println!("Connection:");
    println!("  Status: {}", connectivity);

    println!();

    // Cached data and queued writes
    let research = engine.collection::<ResearchEntry>(RESEARCH_COLLECTION);
    let corrections = engine.collection::<Correction>(CORRECTIONS_COLLECTION);
    let stats = engine.document::<SocialStats>(STATS_COLLECTION, STATS_DOC);

    println!("Data:");
    println!(
        "  Research entries: {} cached{}",
        research.items().len(),
        queued(&research.queued_ops())
    );
    println!(
        "  Corrections:      {} cached{}",
        corrections.items().len(),
        queued(&corrections.queued_ops())
    );
    let updated = stats
        .get()
        .and_then(|stats| stats.last_updated)
        .and_then(|ms| ms.parse::<u64>().ok());
    match updated {
        Some(ms) => println!(
            "  Statistics:       updated {}{}",
            format_millis(ms),
            queued(&stats.queued_ops())
        ),
        None => println!(
            "  Statistics:       never updated{}",
            queued(&stats.queued_ops())
        ),
    }

    Ok(())
}

/// Outbox depth by status, empty when nothing waits.
fn queued(ops: &[OutboxOp]) -> String {
    let pending = ops
        .iter()
        .filter(|op| op.status == OpStatus::Pending)
        .count();
    let failed = ops
        .iter()
        .filter(|op| op.status == OpStatus::Failed)
        .count();
    match (pending, failed) {
        (0, 0) => String::new(),
        (p, 0) => format!(", {} queued write(s)", p),
        (0, f) => format!(", {} failed write(s) awaiting retry", f),
        (p, f) => format!(", {} queued write(s) ({} failed)", p + f, f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vault_local::MemoryStore;

    #[tokio::test]
    async fn status_without_init() {
        let dir = tempdir().unwrap();
        let engine = SyncEngine::offline(MemoryStore::new());
        run(&engine, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn status_with_site_and_session() {
        let dir = tempdir().unwrap();
        SiteConfig::new("Universe & Beyond", "A. Creator", None)
            .save(dir.path())
            .await
            .unwrap();
        admin::start_session(dir.path()).await.unwrap();

        let engine = SyncEngine::offline(MemoryStore::new());
        run(&engine, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn status_counts_queued_writes() {
        let dir = tempdir().unwrap();
        SiteConfig::new("Site", "Creator", None)
            .save(dir.path())
            .await
            .unwrap();

        let engine = SyncEngine::offline(MemoryStore::new());
        {
            let research = engine.collection::<ResearchEntry>(RESEARCH_COLLECTION);
            research
                .add_item(ResearchEntry::new(
                    1,
                    "Saturn's rings",
                    vault_types::Platform::Youtube,
                    vault_types::ContentType::Video,
                ))
                .unwrap();
            assert_eq!(research.pending_ops(), 1);
        }

        run(&engine, dir.path()).await.unwrap();
    }
}
