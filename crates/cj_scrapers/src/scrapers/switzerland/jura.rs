use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveTime};
use cj_core::{Error, Observation, Result};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use crate::dates::parse_french_date;
use crate::scrapers::utils::{collapse_text, parse_count};
use crate::scrapers::{HeadingTableMatcher, Scraper, SourceMetadata};
use super::COUNTRY_EMOJI;

pub const SOURCE_URL: &str =
    "https://www.jura.ch/fr/Autorites/Coronavirus/Accueil/Coronavirus-Informations-officielles-a-la-population-jurassienne.html";
pub const REGION: &str = "JU";

const HEADING_TAG: &str = "h3";
const HEADING_PATTERN: &str =
    r"(?i)cas\s.*infection\s+au\s+coronavirus\s+covid-19\s.*canton\s.*jura";

lazy_static! {
    static ref SITUATION: Regex = Regex::new(r"(?i)situation\s+(.+?)\s*\(\s*(\d+)\s*h\s*\)")
        .expect("SITUATION to compile");
    static ref ROW: Selector = Selector::parse("tr").expect("row selector to parse");
    static ref CELL: Selector = Selector::parse("td").expect("cell selector to parse");
}

/// Cantonal bulletin of the Jura: one table with the cumulative confirmed
/// cases next to a `Situation <date> (<hour>h)` cell.
#[derive(Debug, Clone)]
pub struct JuraScraper {
    matcher: HeadingTableMatcher,
    reference_date: Option<NaiveDate>,
}

impl JuraScraper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            matcher: HeadingTableMatcher::new(HEADING_TAG, HEADING_PATTERN)?,
            reference_date: None,
        })
    }

    /// Swap the table lookup when the page layout changes.
    pub fn with_matcher(mut self, matcher: HeadingTableMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Resolve relative phrases such as `hier` against `date` instead of the local clock.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn cells<'a>(table: ElementRef<'a>) -> Result<(ElementRef<'a>, ElementRef<'a>)> {
        let cells = table
            .select(&ROW)
            .map(|row| row.select(&CELL).collect::<Vec<_>>())
            .find(|cells| !cells.is_empty())
            .ok_or_else(|| Error::extraction("Case table has no cells"))?;

        match cells.as_slice() {
            [confirmed, situation] => Ok((*confirmed, *situation)),
            other => Err(Error::extraction(format!(
                "Expected 2 cells in the case table, found {}",
                other.len()
            ))),
        }
    }

    /// The count sits in the first nested element that carries text; spacers
    /// such as `<br>` or an empty `<span>` are skipped.
    fn confirmed(cell: ElementRef<'_>) -> Result<u32> {
        let text = cell
            .children()
            .filter_map(ElementRef::wrap)
            .map(collapse_text)
            .find(|text| !text.is_empty())
            .ok_or_else(|| Error::extraction("Confirmed-case cell has no nested element"))?;
        parse_count(&text)
    }

    fn situation(&self, cell: ElementRef<'_>) -> Result<(NaiveDate, NaiveTime)> {
        let text = collapse_text(cell);
        let captures = SITUATION
            .captures(&text)
            .ok_or_else(|| Error::extraction(format!("Unrecognised situation phrase {:?}", text)))?;

        let phrase = &captures[1];
        let date = parse_french_date(phrase, self.today())
            .ok_or_else(|| Error::extraction(format!("Could not resolve date {:?}", phrase)))?;

        let hour: u32 = captures[2]
            .parse()
            .map_err(|_| Error::extraction(format!("Invalid hour {:?}", &captures[2])))?;
        let time = NaiveTime::from_hms_opt(hour, 0, 0)
            .ok_or_else(|| Error::extraction(format!("Hour {} is out of range", hour)))?;

        Ok((date, time))
    }
}

#[async_trait]
impl Scraper for JuraScraper {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "Canton du Jura",
            emoji: COUNTRY_EMOJI,
            region: REGION,
        }
    }

    fn source_url(&self) -> &str {
        SOURCE_URL
    }

    fn extract(&self, document: &Html) -> Result<Observation> {
        let table = self.matcher.find_table(document)?;
        let (confirmed_cell, situation_cell) = Self::cells(table)?;

        let confirmed = Self::confirmed(confirmed_cell)?;
        let (date, time) = self.situation(situation_cell)?;
        debug!("Jura bulletin: {} confirmed on {} at {}", confirmed, date, time);

        Ok(Observation::new(date, time, REGION, SOURCE_URL).with_confirmed(confirmed))
    }
}
