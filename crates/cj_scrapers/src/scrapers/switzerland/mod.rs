pub mod jura;

pub use jura::JuraScraper;

pub const COUNTRY_EMOJI: &str = "🇨🇭";
