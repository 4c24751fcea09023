//! Feed records to store records.
//!
//! Every record produced here carries its identity key: observations
//! without a parseable timestamp and reports without a date are dropped.

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use mwx_sources::{
    cocorahs::ExportRow,
    nws::{ObservationCollection, Properties},
    observation::{DailyReport, Observation},
    synoptic::{value_at, TimeseriesResponse},
};
use mwx_utils::dates::{format_date, format_timestamp, normalize_timestamp, parse_timestamp};

use crate::reconcile::{prepare_reference, ReferencePoint};
use crate::units::{celsius_to_fahrenheit, decimal_from_f64, decimal_from_text, ms_to_kmh};

fn canonical_timestamp(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match normalize_timestamp(raw) {
        Ok(ts) => Some(ts),
        Err(e) => {
            warn!("dropping record with timestamp {raw:?}: {e}");
            None
        }
    }
}

/// One `api.weather.gov` observation.
pub fn from_nws_properties(station_id: &str, props: &Properties) -> Option<Observation> {
    let timestamp = canonical_timestamp(props.timestamp.as_deref())?;
    Some(Observation {
        station_id: station_id.to_string(),
        timestamp,
        temp_c: props.temperature.value.and_then(decimal_from_f64),
        wind_speed_kmh: props.wind_speed.value.and_then(decimal_from_f64),
        wind_gust_kmh: props.wind_gust.value.and_then(decimal_from_f64),
        wind_direction_deg: props.wind_direction.value.and_then(decimal_from_f64),
        wind_chill_c: props.wind_chill.value.and_then(decimal_from_f64),
        precip_1h_mm: None,
        precip_3h_mm: props.precipitation_last3_hours.value.and_then(decimal_from_f64),
        text_desc: props
            .text_description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

/// Every observation in an `api.weather.gov` collection.
pub fn from_nws(station_id: &str, collection: &ObservationCollection) -> Vec<Observation> {
    collection
        .features
        .iter()
        .filter_map(|f| from_nws_properties(station_id, &f.properties))
        .collect()
}

/// NWS air temperatures in °F, time-sorted, for use as a reconciliation reference.
pub fn nws_reference(collection: &ObservationCollection) -> Vec<ReferencePoint> {
    let points = collection
        .features
        .iter()
        .filter_map(|f| {
            let props = &f.properties;
            let timestamp = parse_timestamp(props.timestamp.as_deref()?).ok()?;
            let temp_c = props.temperature.value?;
            Some(ReferencePoint {
                timestamp,
                value: celsius_to_fahrenheit(temp_c),
            })
        })
        .collect();
    let points = prepare_reference(points);
    info!("{} NWS reference observations", points.len());
    points
}

/// Observations of `station_id` from a Synoptic timeseries response.
///
/// Wind is converted from m/s to km/h. Accumulated precipitation is stored
/// as the one hour amount; zero is a reading, not an absence.
pub fn from_synoptic(station_id: &str, response: &TimeseriesResponse) -> Vec<Observation> {
    let Some(station) = response
        .station
        .iter()
        .find(|s| s.stid.as_deref() == Some(station_id))
        .or_else(|| response.station.first())
    else {
        warn!("no station data in synoptic response");
        return Vec::new();
    };
    let arrays = &station.observations;
    arrays
        .date_time
        .iter()
        .enumerate()
        .filter_map(|(i, dt)| {
            let timestamp = canonical_timestamp(Some(dt))?;
            Some(Observation {
                station_id: station_id.to_string(),
                timestamp,
                temp_c: value_at(&arrays.air_temp_set_1, i).and_then(decimal_from_f64),
                wind_speed_kmh: value_at(&arrays.wind_speed_set_1, i)
                    .map(ms_to_kmh)
                    .and_then(decimal_from_f64),
                wind_gust_kmh: value_at(&arrays.wind_gust_set_1, i)
                    .map(ms_to_kmh)
                    .and_then(decimal_from_f64),
                wind_direction_deg: value_at(&arrays.wind_direction_set_1, i)
                    .and_then(decimal_from_f64),
                precip_1h_mm: value_at(&arrays.precip_accum_set_1, i).and_then(decimal_from_f64),
                ..Default::default()
            })
        })
        .collect()
}

/// Export dates come as "YYYY-MM-DD" with `dtf=1`, "M/D/YYYY" otherwise.
fn report_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Daily reports of the watched stations.
pub fn from_cocorahs(
    rows: &[ExportRow],
    stations: &[String],
    now: &DateTime<Utc>,
) -> Vec<DailyReport> {
    let last_updated = format_timestamp(now);
    rows.iter()
        .filter(|row| stations.iter().any(|s| s == row.station_number.trim()))
        .filter_map(|row| {
            if row.observation_date.trim().is_empty() {
                return None;
            }
            let Some(date) = report_date(&row.observation_date) else {
                warn!(
                    "dropping {} report with date {:?}",
                    row.station_number, row.observation_date
                );
                return None;
            };
            Some(DailyReport {
                station_id: row.station_number.trim().to_string(),
                observation_date: format_date(&date),
                station_name: row.station_name.trim().to_string(),
                snow_depth_in: decimal_from_text(&row.total_snow_depth),
                snowfall_in: decimal_from_text(&row.total_snowfall),
                precip_in: decimal_from_text(&row.total_precip_amt),
                last_updated: last_updated.clone(),
            })
        })
        .collect()
}
