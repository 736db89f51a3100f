//! One-shot scrape from the command line.

use autolist_pipeline::{Orchestrator, PipelineConfig, ScrapeParams};

/// Migrate, scrape one page and print the batch summary as JSON on stdout.
///
/// # Errors
///
/// Returns an error if migrations fail, the client cannot be built, or the
/// run hits a whole-batch failure. Per-listing failures are part of the
/// printed summary, not errors.
pub(crate) async fn run_scrape(
    config: &autolist_core::AppConfig,
    store: autolist_db::Store,
    params: &ScrapeParams,
) -> anyhow::Result<()> {
    store.migrate().await?;

    let client = autolist_scraper::AutotraderClient::new(
        &config.upstream_base_url,
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build upstream client: {e}"))?;
    let orchestrator = Orchestrator::new(PipelineConfig::from_app_config(config), store, client);

    let batch = orchestrator.scrape(params).await?;
    if batch.failed > 0 {
        tracing::warn!(
            failed = batch.failed,
            inserted = batch.inserted,
            "scrape finished with per-listing failures"
        );
    }

    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}
