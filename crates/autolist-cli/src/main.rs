mod scrape;

use autolist_scraper::Channel;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "autolist-cli")]
#[command(about = "Autotrader listing scraper command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch one page of listings and persist any not already stored.
    Scrape {
        /// Defaults to `AUTOLIST_DEFAULT_POSTAL_CODE`.
        #[arg(long)]
        postal_code: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// rest, search or page.
        #[arg(long, default_value_t = Channel::Rest)]
        channel: Channel,
        /// Site path for the `page` channel, e.g. `/cars/on/london/`.
        #[arg(long)]
        path: Option<String>,
    },
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let store = autolist_db::Store::open(
        &config.database_url,
        autolist_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    let result = match cli.command {
        Commands::Scrape {
            postal_code,
            page,
            channel,
            path,
        } => {
            let params = autolist_pipeline::ScrapeParams {
                postal_code: postal_code.unwrap_or_else(|| config.default_postal_code.clone()),
                page,
                channel,
                page_path: path,
            };
            scrape::run_scrape(&config, store.clone(), &params).await
        }
        Commands::Migrate => run_migrate(&store).await,
    };

    store.close().await;
    result
}

/// Loads `.env` once, then builds the config from the process environment.
fn load_config() -> anyhow::Result<autolist_core::AppConfig> {
    dotenvy::dotenv().ok();
    Ok(autolist_core::load_app_config_from_env()?)
}

async fn run_migrate(store: &autolist_db::Store) -> anyhow::Result<()> {
    let applied = store.migrate().await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

#[cfg(test)]
mod tests;
