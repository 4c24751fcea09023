//! Append-only CSV log of summit table readings (`mansfield_observations.csv`).
//!
//! One line per reading: `timestamp,temperature,direction,wind,gust`, with the
//! timestamp in local time as `YYYY-MM-DDTHH:MM:SS`.

use anyhow::Context;
use chrono::NaiveDateTime;
use mwx_sources::summit_table::SummitReading;

pub const LOG_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn field(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn format_line(reading: &SummitReading) -> String {
    format!(
        "{},{},{},{},{}\n",
        reading.timestamp.format(LOG_FORMAT),
        field(reading.temperature_f),
        field(reading.direction_deg),
        field(reading.wind_mph),
        field(reading.gust_mph)
    )
}

/// Timestamp of the last non-blank line, `None` for an empty log.
pub fn last_timestamp(log: &str) -> anyhow::Result<Option<NaiveDateTime>> {
    let Some(line) = log.lines().rev().find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    let raw = line.split(',').next().unwrap_or_default().trim();
    let timestamp = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("last log line has timestamp {raw:?}"))?;
    Ok(Some(timestamp))
}

/// Append the readings newer than the log's last line.
///
/// `readings` must be oldest first. Returns the new log and how many lines
/// were appended.
pub fn append_newer(log: &str, readings: &[SummitReading]) -> anyhow::Result<(String, usize)> {
    let last = last_timestamp(log)?;
    let mut out = log.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    let mut appended = 0;
    for reading in readings {
        if last.is_some_and(|ts| reading.timestamp <= ts) {
            continue;
        }
        out.push_str(&format_line(reading));
        appended += 1;
    }
    Ok((out, appended))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(hour: u32, wind: Option<i32>) -> SummitReading {
        SummitReading {
            timestamp: NaiveDate::from_ymd_opt(2019, 2, 10)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            temperature_f: Some(18),
            direction_deg: Some(290),
            wind_mph: wind,
            gust_mph: Some(41),
        }
    }

    #[test]
    fn test_append_only_newer() {
        let log = "2019-02-10T09:00:00,17,280,20,30\n2019-02-10T10:00:00,17,280,22,35\n";
        let readings = [reading(9, Some(1)), reading(10, Some(1)), reading(11, Some(25))];
        let (out, appended) = append_newer(log, &readings).unwrap();
        assert_eq!(appended, 1);
        assert!(out.starts_with(log));
        assert!(out.ends_with("2019-02-10T11:00:00,18,290,25,41\n"));
    }

    #[test]
    fn test_wind_and_direction_are_separate_columns() {
        let line = format_line(&reading(11, Some(25)));
        assert_eq!(line, "2019-02-10T11:00:00,18,290,25,41\n");
        assert_eq!(format_line(&reading(11, None)), "2019-02-10T11:00:00,18,290,,41\n");
    }

    #[test]
    fn test_empty_log_takes_everything() {
        let readings = [reading(10, Some(1)), reading(11, Some(2))];
        let (out, appended) = append_newer("", &readings).unwrap();
        assert_eq!(appended, 2);
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_missing_trailing_newline_and_fractional_seconds() {
        let log = "2019-02-10T10:00:00.000000,17,280,22,35";
        let (out, appended) = append_newer(log, &[reading(11, Some(3))]).unwrap();
        assert_eq!(appended, 1);
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_garbage_last_line_is_error() {
        assert!(append_newer("timestamp,temp\n", &[]).is_err());
    }
}
