//! # docsift CLI
//!
//! The `docsift` binary runs the analysis service and exposes the same
//! pipeline on the command line.
//!
//! ## Usage
//!
//! ```bash
//! docsift --config ./config/docsift.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsift init` | Create the SQLite database and run schema migrations |
//! | `docsift index` | Seed the comparison corpus from `[source] root` |
//! | `docsift analyze <doc_id>` | Analyze a document (idempotent) |
//! | `docsift show <doc_id>` | Print a stored analysis without computing |
//! | `docsift wordcloud <ref> --out <path>` | Export a stored word-cloud image |
//! | `docsift serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! docsift init
//! docsift index
//! docsift analyze essays/week1.txt --json
//! docsift serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docsift::{analyze_cmd, config, index_cmd, migrate, observability, server};

/// docsift: idempotent document analysis with corpus overlap detection.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docsift.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docsift",
    about = "Idempotent document analysis: text metrics, corpus overlap, word clouds",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docsift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Seed the comparison corpus from the filesystem source.
    Index,

    /// Analyze a document, or return its stored analysis.
    Analyze {
        /// Document id as understood by the configured content source.
        doc_id: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the stored analysis of a document.
    Show {
        doc_id: String,

        #[arg(long)]
        json: bool,
    },

    /// Write a stored word-cloud image to a file.
    Wordcloud {
        /// Reference from an analysis' `wordCloudRef`.
        blob_ref: String,

        /// Output path for the PNG.
        #[arg(long)]
        out: PathBuf,
    },

    /// Start the HTTP server on `[server] bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    observability::init(&cfg.log.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index => {
            index_cmd::run_index(&cfg).await?;
        }
        Commands::Analyze { doc_id, json } => {
            analyze_cmd::run_analyze(&cfg, &doc_id, json).await?;
        }
        Commands::Show { doc_id, json } => {
            analyze_cmd::run_show(&cfg, &doc_id, json).await?;
        }
        Commands::Wordcloud { blob_ref, out } => {
            analyze_cmd::run_wordcloud(&cfg, &blob_ref, &out).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
