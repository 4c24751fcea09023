//! Synoptic Data `stations/timeseries` responses.

use anyhow::bail;
use serde::Deserialize;

#[cfg(feature = "api")]
use crate::http;
#[cfg(feature = "api")]
use chrono::{DateTime, Utc};
#[cfg(feature = "api")]
use reqwest::Client;

pub const TIMESERIES_URL: &str = "https://api.synopticdata.com/v2/stations/timeseries";

/// Variables requested from the timeseries endpoint.
pub const VARS: &str = "air_temp,wind_speed,wind_gust,wind_direction,precip_accum";

/// Query timestamp format, "YYYYMMDDHHmm" in UTC.
pub const QUERY_FORMAT: &str = "%Y%m%d%H%M";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeseriesResponse {
    #[serde(rename = "STATION", default)]
    pub station: Vec<StationTimeseries>,
    #[serde(rename = "SUMMARY", default)]
    pub summary: Summary,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Summary {
    #[serde(rename = "RESPONSE_CODE")]
    pub response_code: Option<i64>,
    #[serde(rename = "RESPONSE_MESSAGE")]
    pub response_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationTimeseries {
    #[serde(rename = "STID")]
    pub stid: Option<String>,
    #[serde(rename = "OBSERVATIONS", default)]
    pub observations: ObservationArrays,
}

/// Column-oriented observations: every `*_set_1` array is indexed by `date_time`.
///
/// Arrays may be missing or shorter than `date_time`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationArrays {
    #[serde(default)]
    pub date_time: Vec<String>,
    #[serde(default)]
    pub air_temp_set_1: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_set_1: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_gust_set_1: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_set_1: Vec<Option<f64>>,
    #[serde(default)]
    pub precip_accum_set_1: Vec<Option<f64>>,
}

/// Value at `index`, or `None` when the array is short or the slot is null.
pub fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

/// Parse a timeseries body.
///
/// Response code 1 is success and 2 means no data in the window; anything
/// else (bad token, unknown station) is an error.
pub fn parse_timeseries(body: &str) -> anyhow::Result<TimeseriesResponse> {
    let response: TimeseriesResponse = serde_json::from_str(body)?;
    match response.summary.response_code {
        None | Some(1) | Some(2) => Ok(response),
        Some(code) => bail!(
            "synoptic response code {code}: {}",
            response.summary.response_message.as_deref().unwrap_or("")
        ),
    }
}

/// GET the observations of `station` between `start` and `end`.
#[cfg(feature = "api")]
pub async fn fetch_timeseries(
    client: &Client,
    token: &str,
    station: &str,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> anyhow::Result<String> {
    let request = client.get(TIMESERIES_URL).query(&[
        ("token", token.to_string()),
        ("stid", station.to_string()),
        ("start", start.format(QUERY_FORMAT).to_string()),
        ("end", end.format(QUERY_FORMAT).to_string()),
        ("vars", VARS.to_string()),
    ]);
    http::send_for_text(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
  "STATION": [
    {
      "STID": "MMNV1",
      "NAME": "MOUNT MANSFIELD",
      "OBSERVATIONS": {
        "date_time": ["2025-01-13T12:00:00Z", "2025-01-13T12:05:00Z", "2025-01-13T12:10:00Z"],
        "air_temp_set_1": [-11.2, null, -11.0],
        "wind_speed_set_1": [10.0, 12.5],
        "wind_direction_set_1": [290, 300, 310],
        "precip_accum_set_1": [0.0, 0.25, 0.0]
      }
    }
  ],
  "SUMMARY": {"RESPONSE_CODE": 1, "RESPONSE_MESSAGE": "OK", "NUMBER_OF_OBJECTS": 1}
}"#;

    #[test]
    fn test_parse_timeseries() {
        let response = parse_timeseries(BODY).unwrap();
        let station = &response.station[0];
        assert_eq!(station.stid.as_deref(), Some("MMNV1"));
        let obs = &station.observations;
        assert_eq!(obs.date_time.len(), 3);
        assert_eq!(value_at(&obs.air_temp_set_1, 0), Some(-11.2));
        assert_eq!(value_at(&obs.air_temp_set_1, 1), None);
        // short array
        assert_eq!(value_at(&obs.wind_speed_set_1, 2), None);
        // missing array
        assert!(obs.wind_gust_set_1.is_empty());
        assert_eq!(value_at(&obs.wind_gust_set_1, 0), None);
    }

    #[test]
    fn test_parse_no_station_block() {
        let body = r#"{"SUMMARY": {"RESPONSE_CODE": 2, "RESPONSE_MESSAGE": "No stations found for this request."}}"#;
        let response = parse_timeseries(body).unwrap();
        assert!(response.station.is_empty());
    }

    #[test]
    fn test_parse_auth_error() {
        let body = r#"{"SUMMARY": {"RESPONSE_CODE": 200, "RESPONSE_MESSAGE": "Authentication failure"}}"#;
        let err = parse_timeseries(body).unwrap_err();
        assert!(err.to_string().contains("Authentication failure"));
    }
}
