use cj_core::{InsertOutcome, Notifier, Observation, ObservationStore, Result};
use crate::logging::Logger;
use crate::scrapers::Scraper;

/// What a single run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observation: Observation,
    pub outcome: InsertOutcome,
    pub notified: bool,
}

/// Owns the store for the length of a run: fetch, extract, insert, notify.
pub struct ScraperManager {
    store: Box<dyn ObservationStore>,
    notifier: Option<Box<dyn Notifier>>,
}

impl ScraperManager {
    /// Takes ownership of `store` and makes sure its table exists.
    pub async fn new(mut store: Box<dyn ObservationStore>) -> Result<Self> {
        store.ensure_schema().await?;
        Ok(Self { store, notifier: None })
    }

    pub fn with_notifier(mut self, notifier: Option<Box<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub async fn run(&mut self, scraper: &dyn Scraper) -> Result<RunReport> {
        let meta = scraper.source_metadata();
        let logger = Logger::new()
            .with_prefix(meta.emoji.to_string())
            .with_prefix(format!("[{}]", meta.region));

        logger.info(&format!("🦗 Scraping {} from {}", meta.name, scraper.source_url()));
        let observation = scraper.scrape().await.map_err(|e| {
            logger.error(&format!("Failed to scrape {}: {}", meta.name, e));
            e
        })?;
        logger.info(&format!("📰 {}", serde_json::to_string(&observation)?));

        let outcome = self.store.insert(&observation).await?;
        if outcome == InsertOutcome::Duplicate {
            logger.info("⏭️ Nothing new to store");
        }

        let notified = self.notify(&logger).await;
        logger.info("✅ Run completed");

        Ok(RunReport { observation, outcome, notified })
    }

    /// Failures are logged and never fail the run.
    async fn notify(&self, logger: &Logger) -> bool {
        let Some(notifier) = &self.notifier else {
            logger.debug("No notifier configured");
            return false;
        };

        let logger = logger.clone().with_new_prefixes(format!("📣 [{}]", notifier.name()));
        match notifier.notify().await {
            Ok(()) => {
                logger.info("Notified downstream consumers");
                true
            }
            Err(e) => {
                logger.warn(&format!("Notification failed: {}", e));
                false
            }
        }
    }

    /// Releases the store. Call on every exit path once the run is over.
    pub async fn shutdown(self) -> Result<()> {
        self.store.close().await
    }
}
