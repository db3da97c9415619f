//! # aquabot CLI
//!
//! The `aquabot` binary is the primary interface for the water-utility
//! support chatbot. It provides commands for database initialization,
//! demo-data seeding, one-shot questions, FAQ inspection, and starting
//! the HTTP chat server.
//!
//! ## Usage
//!
//! ```bash
//! aquabot --config ./config/aquabot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `aquabot init` | Create the SQLite database schema |
//! | `aquabot seed` | Create the schema and append the demo rows |
//! | `aquabot ask "<question>"` | One-shot routed answer on stdout |
//! | `aquabot faq` | Print the loaded FAQ dataset |
//! | `aquabot serve` | Start the HTTP chat server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize and seed the database
//! aquabot seed --config ./config/aquabot.toml
//!
//! # Free-text question (requires an embedding provider)
//! aquabot ask "Combien dois-je payer ?" --account 654321
//!
//! # Structured lookup without an embedding provider
//! aquabot ask "consommation" --intent consumption --account 123456 --month 2023-07
//!
//! # Start the chat server
//! aquabot serve --config ./config/aquabot.toml
//! ```

mod chat;
mod config;
mod db;
mod embedding;
mod faq;
mod intent;
mod matcher;
mod migrate;
mod models;
mod seed;
mod server;
mod store;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aquabot — a customer-support chatbot for a water utility.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/aquabot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "aquabot",
    about = "aquabot — a water-utility support chatbot with semantic FAQ matching",
    version,
    long_about = "aquabot answers free-text customer questions by matching them against a \
    FAQ dataset with sentence embeddings, and handles two structured intents \
    (consumption lookup, invoice lookup) by querying a local SQLite store."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/aquabot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and both tables (consumption,
    /// invoices). Idempotent — running it multiple times is safe.
    Init,

    /// Initialize the schema and append the demo dataset.
    ///
    /// Appends rows on every run; the store carries no uniqueness
    /// constraint.
    Seed,

    /// Ask one question and print the routed answer.
    ///
    /// Without `--intent`, the question is routed by semantic similarity,
    /// which requires an enabled embedding provider. With `--intent`, the
    /// structured lookup runs directly and no embeddings are needed.
    Ask {
        /// The free-text question.
        question: String,

        /// Account number for the structured flows.
        #[arg(long)]
        account: Option<String>,

        /// Month (YYYY-MM) for the structured flows.
        #[arg(long)]
        month: Option<String>,

        /// Bypass intent detection: `consumption` or `invoice`.
        #[arg(long)]
        intent: Option<String>,
    },

    /// Print the loaded FAQ dataset.
    Faq,

    /// Start the HTTP chat server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed => {
            seed::run_seed(&cfg).await?;
        }
        Commands::Ask {
            question,
            account,
            month,
            intent,
        } => {
            run_ask(&cfg, &question, account, month, intent).await?;
        }
        Commands::Faq => {
            let pairs = faq::load_dataset(&cfg.dataset.path, cfg.dataset.delimiter)?;
            println!("FAQ dataset: {} entries", pairs.len());
            for pair in &pairs {
                println!("  {}", pair.question);
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

async fn run_ask(
    cfg: &config::Config,
    question: &str,
    account: Option<String>,
    month: Option<String>,
    forced_intent: Option<String>,
) -> Result<()> {
    let pool = db::connect(cfg).await?;

    let reply = match forced_intent.as_deref() {
        Some("consumption") => {
            chat::respond_consumption(&pool, account.as_deref(), month.as_deref()).await?
        }
        Some("invoice") => {
            chat::respond_invoices(&pool, account.as_deref(), month.as_deref()).await?
        }
        Some(other) => bail!(
            "Unknown intent: '{}'. Use consumption or invoice.",
            other
        ),
        None => {
            let faq_index = faq::FaqIndex::build(cfg).await?;
            let intent_index = intent::IntentIndex::build(cfg).await?;
            let mut session = chat::Session::new();
            let request = chat::ChatRequest {
                message: question.to_string(),
                account,
                month,
            };
            chat::handle_message(&pool, cfg, &faq_index, &intent_index, &mut session, &request)
                .await?
        }
    };

    for message in &reply.messages {
        println!("{}", message.content);
    }

    pool.close().await;
    Ok(())
}
