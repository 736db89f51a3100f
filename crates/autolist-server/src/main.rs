mod api;
mod middleware;

use std::{sync::Arc, time::Duration};

use autolist_pipeline::{Orchestrator, PipelineConfig};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = autolist_db::Store::open(
        &config.database_url,
        autolist_db::PoolConfig::from_app_config(&config),
    )
    .await?;
    let applied = store.migrate().await?;
    tracing::info!(applied, "migrations complete");

    let client = autolist_scraper::AutotraderClient::new(
        &config.upstream_base_url,
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    let orchestrator = Orchestrator::new(
        PipelineConfig::from_app_config(&config),
        store.clone(),
        client,
    );

    let app = build_app(AppState {
        orchestrator: Arc::new(orchestrator),
        default_postal_code: config.default_postal_code.clone(),
        scrape_deadline: Duration::from_secs(
            config.scraper_request_timeout_secs.saturating_mul(2),
        ),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "autolist-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

/// Loads `.env` once, then builds the config from the process environment.
fn load_config() -> anyhow::Result<autolist_core::AppConfig> {
    dotenvy::dotenv().ok();
    Ok(autolist_core::load_app_config_from_env()?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
