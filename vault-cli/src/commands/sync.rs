//! Drain queued writes and refresh from the remote store.

use anyhow::Result;
use vault_engine::{RemoteStore, SyncEngine};
use vault_local::LocalStore;
use vault_types::{Correction, ResearchEntry, SocialStats};

use super::{CORRECTIONS_COLLECTION, RESEARCH_COLLECTION, STATS_COLLECTION, STATS_DOC};

/// Run the sync command.
pub async fn run<S: LocalStore, R: RemoteStore>(engine: &SyncEngine<S, R>) -> Result<()> {
    engine.reconnect();

    let research = engine.collection::<ResearchEntry>(RESEARCH_COLLECTION);
    let corrections = engine.collection::<Correction>(CORRECTIONS_COLLECTION);
    let stats = engine.document::<SocialStats>(STATS_COLLECTION, STATS_DOC);

    println!("Syncing...");

    let research_report = research.flush().await;
    let corrections_report = corrections.flush().await;
    let stats_report = stats.flush().await;

    research.refresh().await;
    corrections.refresh().await;
    stats.refresh().await;

    let applied = research_report.applied + corrections_report.applied + stats_report.applied;
    let failed = research_report.failed + corrections_report.failed + stats_report.failed;
    println!("  Applied {} queued write(s), {} failed", applied, failed);
    println!();

    summary("Research entries", research.pending_ops(), research.error());
    summary("Corrections", corrections.pending_ops(), corrections.error());
    summary("Statistics", stats.pending_ops(), stats.error());

    println!();
    println!("Connection: {}", engine.connectivity());

    Ok(())
}

fn summary(label: &str, pending: usize, error: Option<String>) {
    if pending == 0 {
        println!("  {}: up to date", label);
    } else {
        println!("  {}: {} write(s) still queued", label, pending);
    }
    if let Some(error) = error {
        println!("    last error: {}", error);
    }
}
