//! # Breed Scout CLI (`scout`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scout scrape` | Fetch the listing and breed pages, write the JSON corpus |
//! | `scout search "<query>"` | Rank breeds against a query |
//! | `scout ask "<question>"` | Retrieve breeds and ask the language model |
//! | `scout status` | Show which data a query would use |
//! | `scout completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! scout scrape --max-breeds 10 --output ./data/breeds.json
//! scout search "calm apartment dog" --limit 5
//! scout ask "We have two kids and a small garden" --config ./config/scout.toml
//! ```

use breed_scout::{assistant, config, progress::ProgressMode, scrape, search, status};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Breed Scout: scrape dog-breed pages and get breed recommendations.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/scout.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "scout", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/scout.toml`. A missing file means built-in
    /// defaults.
    #[arg(long, global = true, default_value = "./config/scout.toml")]
    config: PathBuf,

    /// Log filter for diagnostics on stderr (overridden by `RUST_LOG`).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape breed pages into the JSON data file.
    ///
    /// Fetches the listing page, follows up to `--max-breeds` breed links
    /// one at a time, and atomically replaces the data file with every page
    /// that yielded enough content. Prints a found/accepted/skipped summary.
    Scrape {
        /// Maximum number of breed pages to visit.
        #[arg(long)]
        max_breeds: Option<usize>,

        /// Output JSON path (defaults to `store.path`).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Listing page URL (defaults to `scrape.listing_url`).
        #[arg(long)]
        listing_url: Option<String>,

        /// Delay between requests in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Progress on stderr: off, human, or json. Defaults to human on a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Rank breeds against a keyword query.
    Search {
        /// The search query.
        query: String,

        /// Maximum number of results (defaults to `retrieval.top_k`).
        #[arg(long)]
        limit: Option<usize>,

        /// Data file to search (defaults to `store.path`).
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Ask for breed recommendations.
    ///
    /// Retrieves the best-matching breeds and sends them with the question
    /// to the configured language model. Requires `OPENAI_API_KEY` when
    /// `assistant.provider = "openai"`.
    Ask {
        /// The question, in plain language.
        question: String,

        /// Number of breeds to include as context.
        #[arg(long)]
        limit: Option<usize>,

        /// Data file to read (defaults to `store.path`).
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Show the data source, size, and document count.
    Status {
        /// Data file to inspect (defaults to `store.path`).
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Print a shell completion script to stdout.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let load = || config::load_config(&cli.config);

    match cli.command {
        Commands::Scrape {
            max_breeds,
            output,
            listing_url,
            delay_ms,
            progress,
        } => {
            let overrides = scrape::ScrapeOverrides {
                max_breeds,
                output,
                listing_url,
                delay_ms,
            };
            let cfg = load()?;
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            scrape::run_scrape(&cfg, overrides, mode).await?;
        }
        Commands::Search { query, limit, data } => {
            search::run_search(&load()?, &query, limit, data)?;
        }
        Commands::Ask {
            question,
            limit,
            data,
        } => {
            assistant::run_ask(&load()?, &question, limit, data).await?;
        }
        Commands::Status { data } => {
            status::run_status(&load()?, data)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "scout", &mut std::io::stdout());
        }
    }

    Ok(())
}
