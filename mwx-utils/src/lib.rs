//! Shared utility functions for MWX crates.

/// Date utility functions
pub mod dates {
    use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Format an instant as `YYYY-MM-DDTHH:MM:SSZ`.
    ///
    /// Every timestamp written to the store goes through here so that one
    /// instant always has exactly one spelling.
    pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
        instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Parse an RFC 3339 timestamp with any offset into UTC.
    pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(s.trim())?.with_timezone(&Utc))
    }

    /// Re-spell an RFC 3339 timestamp in the canonical UTC form.
    pub fn normalize_timestamp(s: &str) -> anyhow::Result<String> {
        Ok(format_timestamp(&parse_timestamp(s)?))
    }

    /// Get the snow season start year for a given date.
    /// Seasons run Sep 1 to Aug 31.
    /// e.g., Sep 1 2022 -> 2022, Aug 31 2023 -> 2022
    pub fn season_start_year(date: &NaiveDate) -> i32 {
        let year = date.year();
        if date.month() >= 9 {
            year
        } else {
            year - 1
        }
    }

    /// Season label ("2022-2023") for a given date.
    pub fn season_label(date: &NaiveDate) -> String {
        let start = season_start_year(date);
        format!("{}-{}", start, start + 1)
    }

    /// Parse a "YYYY-YYYY" season label back into its start year.
    ///
    /// Returns `None` unless the second year directly follows the first.
    pub fn parse_season_label(label: &str) -> Option<i32> {
        let (first, second) = label.trim().split_once('-')?;
        let first: i32 = first.parse().ok()?;
        let second: i32 = second.parse().ok()?;
        (second == first + 1).then_some(first)
    }

    /// Calendar day label without zero padding, e.g. "1/5" for January 5th.
    pub fn day_label(date: &NaiveDate) -> String {
        format!("{}/{}", date.month(), date.day())
    }

    /// All day labels of a season in order, Sep 1 through Aug 31, including 2/29.
    pub fn season_day_labels() -> Vec<String> {
        // 2023-2024 contains a leap day, so it yields every label a season can use.
        let Some(start) = NaiveDate::from_ymd_opt(2023, 9, 1) else {
            return Vec::new();
        };
        start.iter_days().take(366).map(|d| day_label(&d)).collect()
    }

}

/// Gzip helpers for artifacts served with `Content-Encoding: gzip`.
pub mod compression {
    use flate2::{read::GzDecoder, write::GzEncoder, Compression};
    use std::io::{Read, Write};

    /// Compress a buffer with gzip at the default level.
    pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    /// Decompress a gzip buffer.
    pub fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(data);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Decompress a gzip buffer holding UTF-8 text.
    pub fn gunzip_to_string(data: &[u8]) -> anyhow::Result<String> {
        Ok(String::from_utf8(gunzip(data)?)?)
    }

}
