mod analyze;
mod query;
mod store;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::store::AnyStore;

#[derive(Debug, Parser)]
#[command(name = "botscope")]
#[command(about = "Estimate how automated a Reddit account's public activity looks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect, score and persist one or more accounts
    Analyze {
        /// Usernames or profile URLs (`alice`, `u/alice`, `https://reddit.com/user/alice`)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Ignore cached results and collect again
        #[arg(long)]
        force: bool,

        /// Override the per-account item limit
        #[arg(long)]
        max_items: Option<usize>,

        /// Print reports as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List stored snapshots for an account, newest first
    History {
        username: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the full report for one snapshot
    Report {
        snapshot_id: i64,

        #[arg(long)]
        json: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// Verify the configured Reddit credentials with a token exchange
    CheckCredentials,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = botscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            inputs,
            force,
            max_items,
            json,
        } => {
            let store = AnyStore::open(&config).await?;
            analyze::run_analyze(&config, store, &inputs, force, max_items, json).await?;
        }
        Commands::History { username, limit } => {
            let store = AnyStore::open(&config).await?;
            query::run_history(&store, &username, limit).await?;
        }
        Commands::Report { snapshot_id, json } => {
            let store = AnyStore::open(&config).await?;
            query::run_report(&store, snapshot_id, json).await?;
        }
        Commands::Migrate => {
            let pool = botscope_db::connect_pool_from_config(&config).await?;
            let applied = botscope_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::CheckCredentials => analyze::run_check_credentials(&config).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
