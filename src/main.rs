//! # Chestnut CLI
//!
//! The `chestnut` binary imports plain-text notes into SQLite, summarizes
//! them with a locally hosted language model, and answers questions over
//! them.
//!
//! ## Usage
//!
//! ```bash
//! chestnut --config ./config/chestnut.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `chestnut init` | Create the SQLite database schema |
//! | `chestnut import <folder>` | Import supported text files from a folder |
//! | `chestnut summarize` | Summarize all notes that lack a summary |
//! | `chestnut list` | List notes that have a summary |
//! | `chestnut ask "<question>"` | Answer a question from stored notes |
//! | `chestnut serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chestnut::{ask, config, import, list, migrate, server, summarize};

/// Chestnut: a local-first note ingestion, summarization, and
/// question-answering tool.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to built-in defaults (database at
/// `./chestnut.sqlite`, Ollama at `http://localhost:11434`).
#[derive(Parser)]
#[command(
    name = "chestnut",
    about = "Chestnut — import, summarize, and ask questions over your notes",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/chestnut.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the notes table. Idempotent:
    /// running it multiple times is safe.
    Init,

    /// Import all supported text files from a folder.
    ///
    /// Walks the folder recursively, storing one note per file
    /// (.txt .md .markdown .rst .log .text). Unreadable or non-UTF-8 files
    /// are skipped with a warning; files already imported unchanged are
    /// skipped silently.
    Import {
        /// Folder containing notes.
        folder: PathBuf,
    },

    /// Summarize notes with the language model.
    ///
    /// Without `--id`, summarizes every note that lacks a summary, one at a
    /// time, committing each success immediately and skipping failures.
    Summarize {
        /// Summarize (or re-summarize) a single note by id.
        #[arg(long)]
        id: Option<String>,
    },

    /// List all notes that have a summary.
    List,

    /// Ask a question about your notes.
    ///
    /// The most relevant notes (by word overlap between the question and
    /// each note's summary) are sent as context to the language model.
    Ask {
        /// Your question (in quotes if multi-word).
        #[arg(required = true)]
        question: Vec<String>,

        /// Override the configured number of notes to use as context.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Start the HTTP server.
    ///
    /// Exposes the same operations as the CLI over a JSON API on the
    /// configured bind address.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { folder } => {
            import::run_import(&cfg, &folder).await?;
        }
        Commands::Summarize { id } => {
            summarize::run_summarize(&cfg, id).await?;
        }
        Commands::List => {
            list::run_list(&cfg).await?;
        }
        Commands::Ask { question, top_k } => {
            let question = question.join(" ");
            ask::run_ask(&cfg, &question, top_k).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
