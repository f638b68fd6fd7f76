mod config;

use anyhow::Context;
use cj_core::{GitHubDispatch, InsertOutcome, Notifier};
use cj_scrapers::{init_logging, JuraScraper, ScraperManager};
use cj_storage::create_storage;
use config::Settings;
use tracing::{error, info, warn};

fn build_notifier(settings: &Settings) -> Option<Box<dyn Notifier>> {
    let config = settings.dispatch.clone()?;
    match GitHubDispatch::new(config) {
        Ok(dispatch) => {
            info!("📣 Dispatch configured for {}", dispatch.endpoint());
            Some(Box::new(dispatch))
        }
        Err(e) => {
            warn!("Notification disabled: {}", e);
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let logger = init_logging();
    let settings = Settings::from_env().context("Invalid configuration")?;
    let scraper = JuraScraper::new().context("Failed to build the Jura scraper")?;
    let notifier = build_notifier(&settings);

    let store = create_storage(settings.storage, &settings.database)
        .await
        .context("Failed to open storage")?;
    info!("🏦 Storage opened ({:?} at {})", settings.storage, settings.database.display());

    let mut manager = ScraperManager::new(store)
        .await
        .context("Failed to prepare the data table")?
        .with_notifier(notifier);

    let result = manager.run(&scraper).await;
    // Close before reporting, whatever the outcome of the run.
    let closed = manager.shutdown().await;

    let report = result
        .map_err(|e| {
            error!("Run aborted: {}", e);
            e
        })
        .context("Scrape failed")?;
    closed.context("Failed to close storage")?;

    let status = match report.outcome {
        InsertOutcome::Inserted => "stored",
        InsertOutcome::Duplicate => "already present",
    };
    logger.info(&format!(
        "✨ {} {} {}: {}",
        report.observation.region,
        report.observation.date_string(),
        report.observation.time_string(),
        status
    ));

    Ok(())
}
