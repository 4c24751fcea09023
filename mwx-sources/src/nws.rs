//! `api.weather.gov` station observations (GeoJSON).

use serde::Deserialize;

#[cfg(feature = "api")]
use crate::http;
#[cfg(feature = "api")]
use reqwest::Client;

/// Observations endpoint for one station.
pub const OBSERVATIONS_URL: &str = "https://api.weather.gov/stations";

/// Default page size for the collection job; ~1.5 hours at 5 minute cadence.
pub const DEFAULT_LIMIT: u32 = 20;

/// Page size used when the feed serves as a temperature reference.
pub const REFERENCE_LIMIT: u32 = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Properties,
}

/// The subset of observation properties the jobs read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    pub timestamp: Option<String>,
    pub text_description: Option<String>,
    #[serde(default)]
    pub temperature: QuantitativeValue,
    #[serde(default)]
    pub wind_speed: QuantitativeValue,
    #[serde(default)]
    pub wind_gust: QuantitativeValue,
    #[serde(default)]
    pub wind_direction: QuantitativeValue,
    #[serde(default)]
    pub wind_chill: QuantitativeValue,
    #[serde(default)]
    pub precipitation_last3_hours: QuantitativeValue,
}

/// `{"unitCode": "wmoUnit:degC", "value": -3.2}`; `value` is null when unreported.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeValue {
    pub value: Option<f64>,
    pub unit_code: Option<String>,
}

/// Parse an observations response body.
pub fn parse_observation_collection(body: &str) -> anyhow::Result<ObservationCollection> {
    Ok(serde_json::from_str(body)?)
}

/// GET the latest `limit` observations for `station`.
#[cfg(feature = "api")]
pub async fn fetch_observations(
    client: &Client,
    station: &str,
    limit: u32,
) -> anyhow::Result<String> {
    let url = format!("{OBSERVATIONS_URL}/{station}/observations");
    let request = client
        .get(url)
        .query(&[("limit", limit.to_string())])
        .header(reqwest::header::ACCEPT, "application/geo+json");
    http::send_for_text(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "id": "https://api.weather.gov/stations/MMNV1/observations/2025-01-13T12:00:00+00:00",
      "type": "Feature",
      "properties": {
        "timestamp": "2025-01-13T12:00:00+00:00",
        "textDescription": "Snow",
        "temperature": {"unitCode": "wmoUnit:degC", "value": -11.1, "qualityControl": "V"},
        "windSpeed": {"unitCode": "wmoUnit:km_h-1", "value": 38.9},
        "windGust": {"unitCode": "wmoUnit:km_h-1", "value": null},
        "windDirection": {"unitCode": "wmoUnit:degree_(angle)", "value": 290},
        "windChill": {"unitCode": "wmoUnit:degC", "value": -22.4},
        "precipitationLast3Hours": {"unitCode": "wmoUnit:mm", "value": 0}
      }
    },
    {
      "type": "Feature",
      "properties": {
        "timestamp": "2025-01-13T11:55:00+00:00"
      }
    }
  ]
}"#;

    #[test]
    fn test_parse_observation_collection() {
        let collection = parse_observation_collection(BODY).unwrap();
        assert_eq!(collection.features.len(), 2);
        let first = &collection.features[0].properties;
        assert_eq!(first.timestamp.as_deref(), Some("2025-01-13T12:00:00+00:00"));
        assert_eq!(first.temperature.value, Some(-11.1));
        assert_eq!(first.wind_gust.value, None);
        assert_eq!(first.wind_direction.value, Some(290.0));
        assert_eq!(first.precipitation_last3_hours.value, Some(0.0));
        assert_eq!(first.text_description.as_deref(), Some("Snow"));

        let second = &collection.features[1].properties;
        assert_eq!(second.temperature.value, None);
        assert!(second.text_description.is_none());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_observation_collection("<html>503</html>").is_err());
    }
}
