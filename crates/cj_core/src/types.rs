use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

/// One report of cumulative counts for a region.
///
/// Identified by `(date, time, region)`; stores never hold two rows with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_time")]
    pub time: NaiveTime,
    pub region: String,
    pub tested: Option<u32>,
    pub confirmed: Option<u32>,
    pub hospitalized: Option<u32>,
    pub icu: Option<u32>,
    pub ventilated: Option<u32>,
    pub released: Option<u32>,
    pub deceased: Option<u32>,
    pub source: String,
}

impl Observation {
    /// An observation with every count absent.
    pub fn new(date: NaiveDate, time: NaiveTime, region: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            date,
            time,
            region: region.into(),
            tested: None,
            confirmed: None,
            hospitalized: None,
            icu: None,
            ventilated: None,
            released: None,
            deceased: None,
            source: source.into(),
        }
    }

    pub fn with_confirmed(mut self, confirmed: u32) -> Self {
        self.confirmed = Some(confirmed);
        self
    }

    /// ISO 8601 calendar date, e.g. `2020-04-14`.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Hour resolution, e.g. `18:00`.
    pub fn time_string(&self) -> String {
        format!("{:02}:00", self.time.hour())
    }

    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            date: self.date_string(),
            time: self.time_string(),
            region: self.region.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservationKey {
    pub date: String,
    pub time: String,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same date, time and region was already stored.
    Duplicate,
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
}

fn serialize_time<S: Serializer>(time: &NaiveTime, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:02}:00", time.hour()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Observation {
        Observation::new(
            NaiveDate::from_ymd_opt(2020, 4, 14).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            "JU",
            "https://example.com",
        )
        .with_confirmed(42)
    }

    #[test]
    fn test_time_is_zero_padded() {
        let observation = sample();
        assert_eq!(observation.date_string(), "2020-04-14");
        assert_eq!(observation.time_string(), "08:00");
    }

    #[test]
    fn test_serializes_storage_formats() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["date"], "2020-04-14");
        assert_eq!(json["time"], "08:00");
        assert_eq!(json["confirmed"], 42);
        assert!(json["deceased"].is_null());
    }

    #[test]
    fn test_key_ignores_counts() {
        let a = sample();
        let mut b = sample();
        b.confirmed = Some(43);
        assert_eq!(a.key(), b.key());
    }
}
