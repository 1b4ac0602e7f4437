//! Display fields derived from stored timestamps at read time.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::warn;

/// SQLite `datetime('now')` format.
const STORED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_stored(ts: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(ts, STORED_FORMAT).ok()
}

/// `YYYY-MM-DD HH:MM`, or the raw value if it does not parse.
pub fn minute_stamp(ts: &str) -> String {
    match parse_stored(ts) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => {
            warn!("Unparseable created_at '{}'", ts);
            ts.to_string()
        }
    }
}

/// Calendar pieces shown on a moment card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MomentStamp {
    pub date_str: String,
    pub time_str: String,
    pub day: u32,
    /// Month label, e.g. `03月`.
    pub month: String,
}

impl MomentStamp {
    pub fn from_stored(ts: &str) -> Option<Self> {
        let dt = parse_stored(ts)?;
        Some(Self {
            date_str: dt.format("%Y-%m-%d").to_string(),
            time_str: dt.format("%H:%M").to_string(),
            day: dt.day(),
            month: format!("{:02}月", dt.month()),
        })
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_stamp_drops_seconds() {
        assert_eq!(minute_stamp("2024-03-09 07:05:59"), "2024-03-09 07:05");
    }

    #[test]
    fn minute_stamp_passes_through_garbage() {
        assert_eq!(minute_stamp("yesterday"), "yesterday");
    }

    #[test]
    fn moment_stamp_fields() {
        let stamp = MomentStamp::from_stored("2024-03-09 17:45:00").unwrap();
        assert_eq!(stamp.date_str, "2024-03-09");
        assert_eq!(stamp.time_str, "17:45");
        assert_eq!(stamp.day, 9);
        assert_eq!(stamp.month, "03月");

        assert!(MomentStamp::from_stored("").is_none());
    }

    #[test]
    fn calendar_dates() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_none());
        assert!(parse_date("05/01/2024").is_none());
    }
}
