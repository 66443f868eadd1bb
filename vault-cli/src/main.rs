//! # vaultic
//!
//! CLI for managing a Vaultic site: social statistics, research entries,
//! and public corrections, all served from the local-first data layer.
//!
//! ## Commands
//!
//! - `init`: Initialize the site configuration
//! - `login` / `logout`: Unlock or lock the editing commands
//! - `stats`: Show or edit the social-statistics document
//! - `research`: List or add research entries
//! - `corrections`: List or add corrections
//! - `status`: Show site, session, and sync state
//! - `sync`: Drain queued writes and refresh from the remote store
//!
//! ## Example
//!
//! ```bash
//! # Initialize the site
//! vaultic init --name "Universe & Beyond" --creator "A. Creator"
//!
//! # Unlock editing
//! vaultic login
//!
//! # Record numbers and content
//! vaultic stats set --followers 125000 --views 4800000
//! vaultic research add --content-number 42 --title "Black holes" \
//!     --platform youtube --content-type video --tag space
//!
//! # Reconcile with the remote store
//! vaultic sync
//! ```
//!
//! Without a configured backend every command still works: data lives in
//! the local slots and queued writes wait for a reconcile.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vault_engine::{MemoryRemote, RemoteStore, SyncEngine};
use vault_local::DirStore;

mod admin;
mod commands;
mod config;

use commands::{corrections, init, login, logout, research, stats, status, sync};

/// CLI for managing a Vaultic site.
#[derive(Parser, Debug)]
#[command(name = "vaultic")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the site configuration and local slots
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use an in-process remote store instead of running offline
    /// (for testing/demo)
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the site configuration
    Init {
        /// Site name
        #[arg(long, short)]
        name: String,

        /// Creator name shown on the site
        #[arg(long, short)]
        creator: String,

        /// Optional tagline
        #[arg(long)]
        tagline: Option<String>,
    },

    /// Unlock the editing commands
    Login {
        /// Passcode (will prompt if not provided)
        #[arg(long, short)]
        passcode: Option<String>,
    },

    /// Lock the editing commands
    Logout,

    /// Show or edit the social-statistics document
    Stats {
        #[command(subcommand)]
        command: StatsCommands,
    },

    /// List or add research entries
    Research {
        #[command(subcommand)]
        command: ResearchCommands,
    },

    /// List or add corrections
    Corrections {
        #[command(subcommand)]
        command: CorrectionsCommands,
    },

    /// Show site, session, and sync state
    Status,

    /// Drain queued writes and refresh from the remote store
    Sync,
}

#[derive(Subcommand, Debug)]
enum StatsCommands {
    /// Show the cached statistics
    Show,

    /// Update statistics fields (requires login)
    Set {
        /// Published video count
        #[arg(long)]
        videos: Option<u64>,

        /// Follower count
        #[arg(long)]
        followers: Option<u64>,

        /// Total view count
        #[arg(long)]
        views: Option<u64>,

        /// Total like count
        #[arg(long)]
        likes: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum ResearchCommands {
    /// List cached research entries, newest first
    List {
        /// Only entries for one platform
        #[arg(long)]
        platform: Option<vault_types::Platform>,
    },

    /// Add a research entry (requires login)
    Add(research::AddArgs),
}

#[derive(Subcommand, Debug)]
enum CorrectionsCommands {
    /// List cached corrections, newest first
    List,

    /// Add a correction (requires login)
    Add(corrections::AddArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaultic=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let store = DirStore::open(&data_dir).context("Failed to open local store")?;
    if cli.memory {
        let engine = SyncEngine::new(store, MemoryRemote::new());
        dispatch(cli.command, &data_dir, &engine).await
    } else {
        let engine = SyncEngine::offline(store);
        dispatch(cli.command, &data_dir, &engine).await
    }
}

async fn dispatch<R: RemoteStore>(
    command: Commands,
    data_dir: &Path,
    engine: &SyncEngine<DirStore, R>,
) -> Result<()> {
    match command {
        Commands::Init {
            name,
            creator,
            tagline,
        } => init::run(data_dir, &name, &creator, tagline.as_deref()).await,
        Commands::Login { passcode } => login::run(data_dir, passcode.as_deref()).await,
        Commands::Logout => logout::run(data_dir).await,
        Commands::Stats { command } => match command {
            StatsCommands::Show => stats::show(engine).await,
            StatsCommands::Set {
                videos,
                followers,
                views,
                likes,
            } => {
                stats::set(
                    engine,
                    data_dir,
                    stats::SetArgs {
                        videos,
                        followers,
                        views,
                        likes,
                    },
                )
                .await
            }
        },
        Commands::Research { command } => match command {
            ResearchCommands::List { platform } => research::list(engine, platform).await,
            ResearchCommands::Add(args) => research::add(engine, data_dir, args).await,
        },
        Commands::Corrections { command } => match command {
            CorrectionsCommands::List => corrections::list(engine).await,
            CorrectionsCommands::Add(args) => corrections::add(engine, data_dir, args).await,
        },
        Commands::Status => status::run(engine, data_dir).await,
        Commands::Sync => sync::run(engine).await,
    }
}

/// Get the default data directory for vaultic.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("dev", "vaultic", "vaultic")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
