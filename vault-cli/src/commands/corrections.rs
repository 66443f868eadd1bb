//! List or add corrections.

use anyhow::Result;
use std::path::Path;
use vault_engine::{RemoteStore, SyncEngine};
use vault_local::LocalStore;
use vault_types::{Correction, Platform, Severity, Timestamp};

use super::{format_millis, report_queue, CORRECTIONS_COLLECTION};
use crate::admin;

/// Arguments for adding a correction.
#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Content number the correction applies to
    #[arg(long)]
    pub content_number: u32,

    /// Title of the content
    #[arg(long, short)]
    pub title: String,

    /// Platform the content was published on
    #[arg(long)]
    pub platform: Platform,

    /// What was wrong
    #[arg(long)]
    pub mistake: String,

    /// The corrected statement
    #[arg(long)]
    pub correction: String,

    /// How serious the mistake was
    #[arg(long, default_value = "minor")]
    pub severity: Severity,
}

/// List cached corrections, newest first.
pub async fn list<S: LocalStore, R: RemoteStore>(engine: &SyncEngine<S, R>) -> Result<()> {
    let handle = engine.collection::<Correction>(CORRECTIONS_COLLECTION);
    let corrections = handle.items();

    if corrections.is_empty() {
        println!("No corrections. Nothing to own up to yet.");
    } else {
        println!("{} corrections:", corrections.len());
        println!();
        for correction in &corrections {
            let pending = if correction.id.is_provisional() {
                " (pending sync)"
            } else {
                ""
            };
            println!(
                "  #{} {} [{}] {}/{}{}",
                correction.content_number,
                correction.title,
                correction.platform,
                correction.severity,
                correction.status,
                pending
            );
            println!("      mistake:   {}", correction.mistake_description);
            println!("      corrected: {}", correction.correction);
            if let Ok(ms) = correction.correction_date.parse::<u64>() {
                println!("      issued:    {}", format_millis(ms));
            }
        }
    }

    if let Some(error) = handle.error() {
        println!();
        println!("Last sync error: {}", error);
    }

    Ok(())
}

/// Add a correction. Requires an active admin session.
pub async fn add<S: LocalStore, R: RemoteStore>(
    engine: &SyncEngine<S, R>,
    data_dir: &Path,
    args: AddArgs,
) -> Result<()> {
    admin::require_session(data_dir)?;

    let mut correction = Correction::new(
        args.content_number,
        args.title,
        args.platform,
        args.mistake,
        args.correction,
        args.severity,
    );
    correction.correction_date = Timestamp::now().as_millis().to_string();

    let handle = engine.collection::<Correction>(CORRECTIONS_COLLECTION);
    let id = handle.add_item(correction)?;
    handle.flush().await;

    println!("Correction added with id {}", id);
    report_queue(handle.pending_ops());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vault_engine::MemoryRemote;
    use vault_local::MemoryStore;
    use vault_types::CorrectionStatus;

    fn add_args(title: &str) -> AddArgs {
        AddArgs {
            content_number: 12,
            title: title.to_string(),
            platform: Platform::Youtube,
            mistake: "Said light escapes".to_string(),
            correction: "Nothing escapes past the event horizon".to_string(),
            severity: Severity::Major,
        }
    }

    #[tokio::test]
    async fn add_without_login_fails() {
        let dir = tempdir().unwrap();
        let engine = SyncEngine::offline(MemoryStore::new());

        let result = add(&engine, dir.path(), add_args("Black holes")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn add_starts_pending_with_a_stamped_date() {
        let dir = tempdir().unwrap();
        admin::start_session(dir.path()).await.unwrap();
        let engine = SyncEngine::offline(MemoryStore::new());

        add(&engine, dir.path(), add_args("Black holes"))
            .await
            .unwrap();

        let handle = engine.collection::<Correction>(CORRECTIONS_COLLECTION);
        let corrections = handle.items();
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].status, CorrectionStatus::Pending);
        assert_eq!(corrections[0].severity, Severity::Major);
        assert!(corrections[0].correction_date.parse::<u64>().is_ok());

        list(&engine).await.unwrap();
    }

    #[tokio::test]
    async fn add_reaches_a_live_remote() {
        let dir = tempdir().unwrap();
        admin::start_session(dir.path()).await.unwrap();
        let remote = MemoryRemote::new();
        let engine = SyncEngine::new(MemoryStore::new(), remote.clone());

        add(&engine, dir.path(), add_args("Mars dust storms"))
            .await
            .unwrap();

        assert_eq!(remote.record_count(CORRECTIONS_COLLECTION), 1);
    }
}
