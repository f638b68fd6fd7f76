pub mod dates;
pub mod logging;
pub mod manager;
pub mod scrapers;

pub use logging::{init_logging, Logger};
pub use manager::{RunReport, ScraperManager};
pub use scrapers::{JuraScraper, Scraper};

pub mod prelude {
    pub use super::scrapers::Scraper;
    pub use cj_core::{Error, Observation, Result};
}
