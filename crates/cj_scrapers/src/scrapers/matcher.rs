use cj_core::{Error, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use super::utils::collapse_text;

/// Where the table sits relative to the matched heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableLocation {
    /// First `table` anywhere under the heading's parent element.
    #[default]
    ParentDescendant,
    /// First element sibling after the heading, which must be a `table`.
    NextSibling,
}

/// Finds a table by the text of the heading that introduces it.
#[derive(Debug, Clone)]
pub struct HeadingTableMatcher {
    heading: Selector,
    heading_tag: String,
    pattern: Regex,
    location: TableLocation,
}

impl HeadingTableMatcher {
    pub fn new(heading_tag: &str, pattern: &str) -> Result<Self> {
        let heading = Selector::parse(heading_tag)
            .map_err(|e| Error::Config(format!("Invalid heading selector {:?}: {}", heading_tag, e)))?;
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("Invalid heading pattern: {}", e)))?;
        Ok(Self {
            heading,
            heading_tag: heading_tag.to_string(),
            pattern,
            location: TableLocation::default(),
        })
    }

    pub fn with_location(mut self, location: TableLocation) -> Self {
        self.location = location;
        self
    }

    /// The first heading whose whitespace-collapsed text matches the pattern.
    pub fn find_heading<'a>(&self, document: &'a Html) -> Result<ElementRef<'a>> {
        document
            .select(&self.heading)
            .find(|heading| self.pattern.is_match(&collapse_text(*heading)))
            .ok_or_else(|| Error::extraction(format!(
                "No <{}> heading matching {:?}",
                self.heading_tag,
                self.pattern.as_str()
            )))
    }

    pub fn find_table<'a>(&self, document: &'a Html) -> Result<ElementRef<'a>> {
        let heading = self.find_heading(document)?;
        match self.location {
            TableLocation::ParentDescendant => {
                let parent = heading
                    .parent()
                    .and_then(ElementRef::wrap)
                    .ok_or_else(|| Error::extraction("Matched heading has no parent element"))?;
                let table = Selector::parse("table")
                    .map_err(|e| Error::Config(format!("Invalid table selector: {}", e)))?;
                parent
                    .select(&table)
                    .next()
                    .ok_or_else(|| Error::extraction("No table next to the matched heading"))
            }
            TableLocation::NextSibling => heading
                .next_siblings()
                .find_map(ElementRef::wrap)
                .filter(|sibling| sibling.value().name() == "table")
                .ok_or_else(|| Error::extraction("Element after the matched heading is not a table")),
        }
    }
}
