use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod run;
mod spool;

#[derive(Debug, Parser)]
#[command(name = "prospekt")]
#[command(about = "Weekly grocery offer ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or update the offers schema.
    Migrate,
    /// Ingest the current (or given) week for one or all retailers.
    Ingest {
        /// Restrict the run to a single retailer (edeka, rewe, lidl, aldi, netto).
        #[arg(long)]
        retailer: Option<String>,
        /// Week key to tag offers with, e.g. 2025-W48. Defaults to the
        /// current ISO week.
        #[arg(long)]
        week: Option<String>,
    },
    /// Query stored offers.
    Offers {
        #[arg(long)]
        retailer: Option<String>,
        #[arg(long)]
        week: Option<String>,
        /// Print offers as a JSON array instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Delete every offer belonging to one ISO week.
    Purge {
        #[arg(long)]
        week: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = prospekt_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();

    let pool = prospekt_db::connect_pool(
        &config.database_url,
        prospekt_db::PoolConfig::from_app_config(&config),
    )
    .await?;
    prospekt_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Migrate => {
            tracing::info!("offers schema is up to date");
        }
        Commands::Ingest { retailer, week } => {
            run::ingest(&pool, &config, retailer.as_deref(), week.as_deref()).await?;
        }
        Commands::Offers {
            retailer,
            week,
            json,
        } => {
            run::print_offers(&pool, retailer.as_deref(), week.as_deref(), json).await?;
        }
        Commands::Purge { week } => {
            let week = prospekt_core::parse_week_key(&week)
                .ok_or_else(|| anyhow::anyhow!("invalid week key '{week}' — expected YYYY-Www"))?;
            let deleted = prospekt_db::purge_week(&pool, &week.key).await?;
            println!("purged {deleted} offers from {}", week.key);
        }
    }

    Ok(())
}
