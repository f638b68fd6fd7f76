//! French natural-language date phrases, as they appear in cantonal bulletins.
//!
//! Handles absolute dates (`le 14 avril 2020`, `mardi 1er mai`, `14 avr. 2020`),
//! ISO dates (`2020-04-14`), numeric day-first dates (`14.04.2020`, `14/04/20`)
//! and relative phrases (`aujourd'hui`, `hier`, `il y a 3 jours`, `mardi`),
//! resolved against a reference date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TEXTUAL_DATE: Regex =
        Regex::new(r"(?:^|\s)(\d{1,2})(?:er)?\s+([a-zéèêûô]+)\.?(?:\s+(\d{4}))?(?:\s|$)")
            .expect("TEXTUAL_DATE to compile");
    static ref ISO_DATE: Regex =
        Regex::new(r"(?:^|\s)(\d{4})-(\d{1,2})-(\d{1,2})(?:\s|$)")
            .expect("ISO_DATE to compile");
    static ref NUMERIC_DATE: Regex =
        Regex::new(r"(?:^|\s)(\d{1,2})[./-](\d{1,2})[./-](\d{4}|\d{2})(?:\s|$)")
            .expect("NUMERIC_DATE to compile");
    static ref AGO: Regex =
        Regex::new(r"il\s+y\s+a\s+(\d+)\s+(jours?|semaines?)")
            .expect("AGO to compile");
}

/// Offsets beyond this many days are treated as unresolvable.
const MAX_DAYS_AGO: i64 = 366 * 100;

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("lundi", Weekday::Mon),
    ("mardi", Weekday::Tue),
    ("mercredi", Weekday::Wed),
    ("jeudi", Weekday::Thu),
    ("vendredi", Weekday::Fri),
    ("samedi", Weekday::Sat),
    ("dimanche", Weekday::Sun),
];

/// Accepted spellings per month, full names and common abbreviations.
const MONTHS: [&[&str]; 12] = [
    &["janvier", "janv", "jan"],
    &["février", "fevrier", "févr", "fevr", "fév", "fev"],
    &["mars", "mar"],
    &["avril", "avr"],
    &["mai"],
    &["juin"],
    &["juillet", "juil"],
    &["août", "aout"],
    &["septembre", "sept", "sep"],
    &["octobre", "oct"],
    &["novembre", "nov"],
    &["décembre", "decembre", "déc", "dec"],
];

pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.trim_end_matches('.');
    MONTHS
        .iter()
        .position(|spellings| spellings.contains(&name))
        .map(|index| index as u32 + 1)
}

fn normalize(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .replace(['’', '`'], "'")
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn relative(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
    let words: Vec<&str> = phrase.split(' ').collect();
    let has = |word: &str| words.contains(&word);

    if phrase.contains("avant-hier") || phrase.contains("avant hier") {
        return today.checked_sub_signed(Duration::days(2));
    }
    if has("hier") {
        return today.checked_sub_signed(Duration::days(1));
    }
    if has("aujourd'hui") || phrase.contains("ce jour") {
        return Some(today);
    }
    if phrase.contains("après-demain") || phrase.contains("après demain") {
        return today.checked_add_signed(Duration::days(2));
    }
    if has("demain") {
        return today.checked_add_signed(Duration::days(1));
    }

    if let Some(captures) = AGO.captures(phrase) {
        let amount: i64 = captures[1].parse().ok()?;
        let factor = if captures[2].starts_with("semaine") { 7 } else { 1 };
        let days = amount.checked_mul(factor).filter(|days| *days <= MAX_DAYS_AGO)?;
        return today.checked_sub_signed(Duration::try_days(days)?);
    }

    weekday(&words, today)
}

/// A bare weekday name is the most recent such day, today included.
fn weekday(words: &[&str], today: NaiveDate) -> Option<NaiveDate> {
    let target = WEEKDAYS
        .iter()
        .find(|(name, _)| words.contains(name))
        .map(|(_, day)| *day)?;
    let back = (7 + today.weekday().num_days_from_monday() - target.num_days_from_monday()) % 7;
    today.checked_sub_signed(Duration::try_days(i64::from(back))?)
}

fn textual(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
    TEXTUAL_DATE.captures_iter(phrase).find_map(|captures| {
        let day: u32 = captures[1].parse().ok()?;
        let month = month_from_name(&captures[2])?;
        let year = match captures.get(3) {
            Some(year) => year.as_str().parse().ok()?,
            None => today.year(),
        };
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

fn iso(phrase: &str) -> Option<NaiveDate> {
    let captures = ISO_DATE.captures(phrase)?;
    NaiveDate::from_ymd_opt(
        captures[1].parse().ok()?,
        captures[2].parse().ok()?,
        captures[3].parse().ok()?,
    )
}

fn numeric(phrase: &str) -> Option<NaiveDate> {
    let captures = NUMERIC_DATE.captures(phrase)?;
    let day: u32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let year: i32 = match &captures[3] {
        short if short.len() == 2 => 2000 + short.parse::<i32>().ok()?,
        full => full.parse().ok()?,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolve a French date phrase, using `today` for relative phrases and missing years.
pub fn parse_french_date(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
    let phrase = normalize(phrase);
    if phrase.is_empty() {
        return None;
    }

    iso(&phrase)
        .or_else(|| numeric(&phrase))
        .or_else(|| textual(&phrase, today))
        .or_else(|| relative(&phrase, today))
}
