//! The public observation snapshot (`mansfield-observations.json`).
//!
//! Regenerated in full on every run from the last days of stored
//! observations, after correcting temperatures against the NWS feed.

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use mwx_data::{
    freezing::last_above_freezing,
    normalize::nws_reference,
    reconcile::{correct_observations, ReferencePoint},
    units::{celsius_to_fahrenheit, kmh_to_mph, mm_to_inches, round_to, to_f64},
};
use mwx_db::{models::SortOrder, Database};
use mwx_sources::{nws, observation::Observation};
use mwx_utils::{compression::gzip, dates::format_timestamp};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::JobError;
use crate::storage::{ObjectStore, PutOptions, SNAPSHOT_KEY};

pub const DEFAULT_WINDOW_DAYS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotObservation {
    pub timestamp: String,
    pub temperature_f: Option<f64>,
    pub wind_speed_mph: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub precip_1h_in: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub last_updated: String,
    pub last_above_freezing: Option<String>,
    pub observations: Vec<SnapshotObservation>,
}

fn imperial(value: &Option<Decimal>, convert: fn(f64) -> f64, places: i32) -> Option<f64> {
    value
        .as_ref()
        .and_then(to_f64)
        .map(|v| round_to(convert(v), places))
}

impl From<&Observation> for SnapshotObservation {
    fn from(obs: &Observation) -> Self {
        SnapshotObservation {
            timestamp: obs.timestamp.clone(),
            temperature_f: imperial(&obs.temp_c, celsius_to_fahrenheit, 1),
            wind_speed_mph: imperial(&obs.wind_speed_kmh, kmh_to_mph, 1),
            wind_direction_deg: obs.wind_direction_deg.as_ref().and_then(to_f64),
            precip_1h_in: imperial(&obs.precip_1h_mm, mm_to_inches, 2),
        }
    }
}

/// Build the snapshot from a newest-first window.
///
/// `last_above_freezing` is taken from the stored values, the observation
/// list from the corrected ones.
pub fn build_snapshot(
    window: &[Observation],
    reference: &anyhow::Result<Vec<ReferencePoint>>,
    now: &DateTime<Utc>,
) -> Snapshot {
    let last_above_freezing = last_above_freezing(window);
    let corrected = correct_observations(window, reference);
    Snapshot {
        last_updated: format_timestamp(now),
        last_above_freezing,
        observations: corrected.iter().map(SnapshotObservation::from).collect(),
    }
}

/// Serialize, gzip and publish a snapshot.
pub fn publish_snapshot(store: &dyn ObjectStore, snapshot: &Snapshot) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    let body = gzip(&json)?;
    store.put_object(
        SNAPSHOT_KEY,
        &body,
        &PutOptions::public_gzip(Some("application/json")),
    )?;
    info!(
        "published {SNAPSHOT_KEY} with {} observations",
        snapshot.observations.len()
    );
    Ok(())
}

/// NWS temperatures in °F for the reconciliation reference.
pub async fn load_reference(
    client: &Client,
    station: &str,
    limit: u32,
) -> anyhow::Result<Vec<ReferencePoint>> {
    let body = nws::fetch_observations(client, station, limit).await?;
    let collection = nws::parse_observation_collection(&body)?;
    Ok(nws_reference(&collection))
}

/// Canonical timestamp `window_days` before `now`.
pub fn window_since(now: &DateTime<Utc>, window_days: i64) -> Result<String, JobError> {
    Duration::try_days(window_days)
        .and_then(|d| now.checked_sub_signed(d))
        .map(|since| format_timestamp(&since))
        .ok_or_else(|| JobError::Parse(anyhow!("window of {window_days} days is out of range")))
}

/// Read the window, correct it against `reference` and publish it.
///
/// Returns how many observations were exported; zero means nothing was
/// published.
pub fn export_stored(
    db: &Database,
    store: &dyn ObjectStore,
    station: &str,
    window_days: i64,
    reference: &anyhow::Result<Vec<ReferencePoint>>,
) -> Result<usize, JobError> {
    let now = Utc::now();
    let since = window_since(&now, window_days)?;
    let window = db
        .observations_since(station, &since, SortOrder::Descending)
        .map_err(JobError::Store)?;
    if window.is_empty() {
        warn!("no observations since {since} to export");
        return Ok(0);
    }
    let snapshot = build_snapshot(&window, reference, &now);
    publish_snapshot(store, &snapshot).map_err(JobError::Export)?;
    Ok(snapshot.observations.len())
}

/// Load the NWS reference, then export the stored window.
pub async fn export_snapshot(
    db: &Database,
    store: &dyn ObjectStore,
    client: &Client,
    station: &str,
    window_days: i64,
    reference_limit: u32,
) -> Result<usize, JobError> {
    let reference = load_reference(client, station, reference_limit).await;
    export_stored(db, store, station, window_days, &reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalBucket;
    use chrono::TimeZone;
    use mwx_utils::compression::gunzip_to_string;
    use std::str::FromStr;

    fn dec(s: &str) -> Option<Decimal> {
        Some(Decimal::from_str(s).unwrap())
    }

    fn window() -> Vec<Observation> {
        let mut newest = Observation::new("MMNV1", "2025-01-13T12:10:00Z");
        newest.temp_c = dec("-1.0");
        newest.wind_speed_kmh = dec("38.9");
        newest.wind_direction_deg = dec("290");
        newest.precip_1h_mm = Some(Decimal::ZERO);
        let mut spike = Observation::new("MMNV1", "2025-01-13T12:05:00Z");
        spike.temp_c = dec("60.0");
        let mut older = Observation::new("MMNV1", "2025-01-13T12:00:00Z");
        older.temp_c = dec("0.5");
        older.precip_1h_mm = dec("2.54");
        vec![newest, spike, older]
    }

    #[test]
    fn test_build_snapshot_without_reference() {
        let now = Utc.with_ymd_and_hms(2025, 1, 13, 12, 15, 0).unwrap();
        let reference: anyhow::Result<Vec<ReferencePoint>> = Err(anyhow::anyhow!("offline"));
        let snapshot = build_snapshot(&window(), &reference, &now);

        assert_eq!(snapshot.last_updated, "2025-01-13T12:15:00Z");
        // the 60 °C spike still counts as the newest temperature above freezing
        assert_eq!(
            snapshot.last_above_freezing.as_deref(),
            Some("2025-01-13T12:05:00Z")
        );
        let first = &snapshot.observations[0];
        assert_eq!(first.temperature_f, Some(30.2));
        assert_eq!(first.wind_speed_mph, Some(24.2));
        assert_eq!(first.wind_direction_deg, Some(290.0));
        assert_eq!(first.precip_1h_in, Some(0.0));
        // 140 °F is outside the absolute bounds
        assert_eq!(snapshot.observations[1].temperature_f, None);
        assert_eq!(snapshot.observations[2].precip_1h_in, Some(0.1));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let now = Utc.with_ymd_and_hms(2025, 1, 13, 12, 15, 0).unwrap();
        let reference: anyhow::Result<Vec<ReferencePoint>> = Ok(Vec::new());
        let snapshot = build_snapshot(&window()[..1], &reference, &now);
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["last_above_freezing"], serde_json::Value::Null);
        let obs = &value["observations"][0];
        assert_eq!(obs["timestamp"], "2025-01-13T12:10:00Z");
        assert_eq!(obs["temperature_f"], 30.2);
        assert!(obs.get("precip_1h_in").is_some());
    }

    #[test]
    fn test_window_since() {
        let now = Utc.with_ymd_and_hms(2025, 1, 13, 12, 15, 0).unwrap();
        assert_eq!(window_since(&now, 10).unwrap(), "2025-01-03T12:15:00Z");
        let err = window_since(&now, i64::MAX / 1000).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_export_stored_empty_window_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path());
        let db = Database::new().unwrap();
        let reference: anyhow::Result<Vec<ReferencePoint>> = Err(anyhow!("offline"));
        assert_eq!(export_stored(&db, &bucket, "MMNV1", 10, &reference).unwrap(), 0);
        assert!(bucket.get_object(SNAPSHOT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_publish_writes_gzip_json() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path());
        let snapshot = Snapshot {
            last_updated: "2025-01-13T12:15:00Z".to_string(),
            last_above_freezing: None,
            observations: Vec::new(),
        };
        publish_snapshot(&bucket, &snapshot).unwrap();
        let object = bucket.get_object(SNAPSHOT_KEY).unwrap().unwrap();
        assert_eq!(object.options.content_encoding.as_deref(), Some("gzip"));
        assert_eq!(object.options.content_type.as_deref(), Some("application/json"));
        let text = gunzip_to_string(&object.body).unwrap();
        assert!(text.contains("\"last_updated\": \"2025-01-13T12:15:00Z\""));
    }
}
