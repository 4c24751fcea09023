//! SQL schema for the observation store.
//!
//! Numeric payload columns are `TEXT` holding the exact decimal spelling,
//! so values round-trip without binary float error.

/// Returns the full SQL schema as a single batch string.
///
/// - `observations` - summit observations keyed by (station, timestamp)
/// - `cocorahs_reports` - daily reports keyed by (station, observation_date)
///
/// Timestamps are canonical UTC strings (`YYYY-MM-DDTHH:MM:SSZ`), so range
/// filters and `ORDER BY` on the text column are chronological.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS observations (
        station TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        temp_c TEXT,
        wind_speed_kmh TEXT,
        wind_gust_kmh TEXT,
        wind_direction_deg TEXT,
        wind_chill_c TEXT,
        precip_1h_mm TEXT,
        precip_3h_mm TEXT,
        text_desc TEXT,
        PRIMARY KEY (station, timestamp)
    );

    CREATE TABLE IF NOT EXISTS cocorahs_reports (
        station TEXT NOT NULL,
        observation_date TEXT NOT NULL,
        station_name TEXT NOT NULL,
        snow_depth_in TEXT,
        snowfall_in TEXT,
        precip_in TEXT,
        last_updated TEXT NOT NULL,
        PRIMARY KEY (station, observation_date)
    );
    "#
}
