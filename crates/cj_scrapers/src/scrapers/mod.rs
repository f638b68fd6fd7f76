use async_trait::async_trait;
use cj_core::{Observation, Result};
use scraper::Html;

pub mod matcher;
pub mod switzerland;

pub use matcher::{HeadingTableMatcher, TableLocation};
pub use switzerland::JuraScraper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub name: &'static str,
    pub emoji: &'static str,
    /// Short code stored with every observation, e.g. `JU`
    pub region: &'static str,
}

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the name and region of the source
    fn source_metadata(&self) -> SourceMetadata;

    /// The page this scraper reads
    fn source_url(&self) -> &str;

    /// Builds an observation from the parsed page
    fn extract(&self, document: &Html) -> Result<Observation>;

    /// Downloads the raw page
    async fn fetch_page(&self) -> Result<String> {
        utils::fetch_page(self.source_url()).await
    }

    fn extract_from_html(&self, html: &str) -> Result<Observation> {
        let document = Html::parse_document(html);
        self.extract(&document)
    }

    /// Fetches, parses and extracts in one go
    async fn scrape(&self) -> Result<Observation> {
        let html = self.fetch_page().await?;
        self.extract_from_html(&html)
    }
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use cj_core::{Error, Result};
    use scraper::ElementRef;
    use tracing::debug;

    pub async fn fetch_page(url: &str) -> Result<String> {
        let response = reqwest::get(url).await?.error_for_status()?;
        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }

    /// All text under `element`, with whitespace runs collapsed to single spaces.
    pub fn collapse_text(element: ElementRef<'_>) -> String {
        collapse_whitespace(&element.text().collect::<String>())
    }

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn parse_count(text: &str) -> Result<u32> {
        let text = text.trim();
        text.parse::<u32>()
            .map_err(|_| Error::extraction(format!("Expected an integer count, found {:?}", text)))
    }
}
