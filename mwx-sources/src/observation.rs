use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single summit observation in metric units.
///
/// Identity is `(station_id, timestamp)`. The timestamp is kept in the
/// canonical UTC spelling produced by `mwx_utils::dates::format_timestamp`,
/// so string order equals chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub station_id: String,
    pub timestamp: String,
    pub temp_c: Option<Decimal>,
    pub wind_speed_kmh: Option<Decimal>,
    pub wind_gust_kmh: Option<Decimal>,
    pub wind_direction_deg: Option<Decimal>,
    pub wind_chill_c: Option<Decimal>,
    pub precip_1h_mm: Option<Decimal>,
    pub precip_3h_mm: Option<Decimal>,
    pub text_desc: Option<String>,
}

impl Observation {
    /// An observation carrying only its identity.
    pub fn new(station_id: &str, timestamp: &str) -> Self {
        Observation {
            station_id: station_id.to_string(),
            timestamp: timestamp.to_string(),
            ..Default::default()
        }
    }
}

/// One CoCoRaHS daily report, in inches.
///
/// Identity is `(station_id, observation_date)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub station_id: String,
    /// "YYYY-MM-DD"
    pub observation_date: String,
    pub station_name: String,
    pub snow_depth_in: Option<Decimal>,
    pub snowfall_in: Option<Decimal>,
    pub precip_in: Option<Decimal>,
    /// Canonical UTC timestamp of when the report was collected.
    pub last_updated: String,
}
