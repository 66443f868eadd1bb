//! List or add research entries.

use anyhow::{Context, Result};
use std::path::Path;
use uuid::Uuid;
use vault_engine::{RemoteStore, SyncEngine};
use vault_local::LocalStore;
use vault_types::{
    ContentType, Credibility, Platform, ResearchEntry, Source, SourceKind,
};

use super::{report_queue, RESEARCH_COLLECTION};
use crate::admin;

/// Arguments for adding a research entry.
#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Content number the entry belongs to
    #[arg(long)]
    pub content_number: u32,

    /// Title of the content
    #[arg(long, short)]
    pub title: String,

    /// Platform the content was published on
    #[arg(long)]
    pub platform: Platform,

    /// Content format
    #[arg(long)]
    pub content_type: ContentType,

    /// Upload date, e.g. 2026-08-01
    #[arg(long)]
    pub upload_date: Option<String>,

    /// Longer description
    #[arg(long)]
    pub description: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Source as "title|url|kind|credibility[|notes]" (repeatable)
    #[arg(long = "source")]
    pub sources: Vec<String>,
}

/// List cached research entries, newest first.
pub async fn list<S: LocalStore, R: RemoteStore>(
    engine: &SyncEngine<S, R>,
    platform: Option<Platform>,
) -> Result<()> {
    let handle = engine.collection::<ResearchEntry>(RESEARCH_COLLECTION);
    let mut entries = handle.items();
    if let Some(platform) = platform {
        entries.retain(|entry| entry.platform == platform);
    }

    if entries.is_empty() {
        println!("No research entries.");
    } else {
        println!("{} research entries:", entries.len());
        println!();
        for entry in &entries {
            let pending = if entry.id.is_provisional() {
                " (pending sync)"
            } else {
                ""
            };
            println!(
                "  #{} {} [{}/{}]{}",
                entry.content_number, entry.title, entry.platform, entry.content_type, pending
            );
            if !entry.tags.is_empty() {
                println!("      tags: {}", entry.tags.join(", "));
            }
            if !entry.sources.is_empty() {
                println!("      {} source(s)", entry.sources.len());
            }
        }
    }

    if let Some(error) = handle.error() {
        println!();
        println!("Last sync error: {}", error);
    }

    Ok(())
}

/// Add a research entry. Requires an active admin session.
pub async fn add<S: LocalStore, R: RemoteStore>(
    engine: &SyncEngine<S, R>,
    data_dir: &Path,
    args: AddArgs,
) -> Result<()> {
    admin::require_session(data_dir)?;

    let sources = args
        .sources
        .iter()
        .map(|raw| parse_source(raw))
        .collect::<Result<Vec<_>>>()?;

    let mut entry = ResearchEntry::new(
        args.content_number,
        args.title,
        args.platform,
        args.content_type,
    );
    entry.upload_date = args.upload_date.unwrap_or_default();
    entry.description = args.description;
    entry.tags = args.tags;
    entry.sources = sources;

    let handle = engine.collection::<ResearchEntry>(RESEARCH_COLLECTION);
    let id = handle.add_item(entry)?;
    handle.flush().await;

    println!("Research entry added with id {}", id);
    report_queue(handle.pending_ops());

    Ok(())
}

/// Parse a source from its pipe-separated form.
fn parse_source(raw: &str) -> Result<Source> {
    let parts: Vec<&str> = raw.splitn(5, '|').collect();
    if parts.len() < 4 {
        anyhow::bail!(
            "Invalid source '{}'. Expected \"title|url|kind|credibility[|notes]\".",
            raw
        );
    }

    let kind: SourceKind = parts[2]
        .parse()
        .with_context(|| format!("Invalid source '{}'", raw))?;
    let credibility: Credibility = parts[3]
        .parse()
        .with_context(|| format!("Invalid source '{}'", raw))?;

    Ok(Source {
        id: Uuid::new_v4().to_string(),
        title: parts[0].to_string(),
        url: parts[1].to_string(),
        kind,
        credibility,
        notes: parts.get(4).map(|notes| notes.to_string()),
    })
}
