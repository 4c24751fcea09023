//! Upserts. A write replaces any record with the same key.

use crate::models::decimal_to_sql;
use crate::Database;
use mwx_sources::observation::{DailyReport, Observation};
use rusqlite::params;

impl Database {
    /// Store one observation under `(station_id, timestamp)`.
    pub fn put_observation(&self, obs: &Observation) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        conn.execute(
            "INSERT OR REPLACE INTO observations (
                station, timestamp, temp_c, wind_speed_kmh, wind_gust_kmh,
                wind_direction_deg, wind_chill_c, precip_1h_mm, precip_3h_mm, text_desc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                obs.station_id,
                obs.timestamp,
                decimal_to_sql(&obs.temp_c),
                decimal_to_sql(&obs.wind_speed_kmh),
                decimal_to_sql(&obs.wind_gust_kmh),
                decimal_to_sql(&obs.wind_direction_deg),
                decimal_to_sql(&obs.wind_chill_c),
                decimal_to_sql(&obs.precip_1h_mm),
                decimal_to_sql(&obs.precip_3h_mm),
                obs.text_desc,
            ],
        )?;
        log::debug!("store: observation {} {}", obs.station_id, obs.timestamp);
        Ok(())
    }

    /// Store a batch of observations one by one; returns how many were written.
    pub fn put_observations(&self, observations: &[Observation]) -> anyhow::Result<usize> {
        for obs in observations {
            self.put_observation(obs)?;
        }
        log::info!("store: wrote {} observations", observations.len());
        Ok(observations.len())
    }

    /// Store one report under `(station_id, observation_date)`.
    pub fn put_daily_report(&self, report: &DailyReport) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        conn.execute(
            "INSERT OR REPLACE INTO cocorahs_reports (
                station, observation_date, station_name, snow_depth_in,
                snowfall_in, precip_in, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.station_id,
                report.observation_date,
                report.station_name,
                decimal_to_sql(&report.snow_depth_in),
                decimal_to_sql(&report.snowfall_in),
                decimal_to_sql(&report.precip_in),
                report.last_updated,
            ],
        )?;
        log::debug!(
            "store: report {} {}",
            report.station_id,
            report.observation_date
        );
        Ok(())
    }

    /// Store a batch of reports; returns how many were written.
    pub fn put_daily_reports(&self, reports: &[DailyReport]) -> anyhow::Result<usize> {
        for report in reports {
            self.put_daily_report(report)?;
        }
        log::info!("store: wrote {} reports", reports.len());
        Ok(reports.len())
    }
}
