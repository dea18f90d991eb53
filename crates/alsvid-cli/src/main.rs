//! Alsvid Command-Line Interface
//!
//! Inspect and manage channel library database files: list stored
//! snapshots, show a snapshot's entities, initialize a new database.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{init, list, show};

/// Alsvid - versioned channel registry for quantum experiment control
#[derive(Parser)]
#[command(name = "alsvid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Channel database file (default: ~/.alsvid/channels.sqlite)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a channel database file
    Init,

    /// List all stored snapshots
    List,

    /// Show the entities of a snapshot
    Show {
        /// Snapshot id (see `alsvid list`)
        id: i64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let db = commands::database_path(cli.db)?;

    match cli.command {
        Commands::Init => init::execute(&db),
        Commands::List => list::execute(&db),
        Commands::Show { id } => show::execute(&db, id),
    }
}
