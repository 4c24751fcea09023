//! Range and latest-by-key queries.

use crate::models::{decimal_column, SortOrder};
use crate::Database;
use mwx_sources::observation::{DailyReport, Observation};
use rusqlite::{params, OptionalExtension, Row};

const OBSERVATION_COLUMNS: &str = "station, timestamp, temp_c, wind_speed_kmh, wind_gust_kmh,
    wind_direction_deg, wind_chill_c, precip_1h_mm, precip_3h_mm, text_desc";

fn observation_from_row(row: &Row) -> rusqlite::Result<Observation> {
    Ok(Observation {
        station_id: row.get(0)?,
        timestamp: row.get(1)?,
        temp_c: decimal_column(row, 2)?,
        wind_speed_kmh: decimal_column(row, 3)?,
        wind_gust_kmh: decimal_column(row, 4)?,
        wind_direction_deg: decimal_column(row, 5)?,
        wind_chill_c: decimal_column(row, 6)?,
        precip_1h_mm: decimal_column(row, 7)?,
        precip_3h_mm: decimal_column(row, 8)?,
        text_desc: row.get(9)?,
    })
}

fn report_from_row(row: &Row) -> rusqlite::Result<DailyReport> {
    Ok(DailyReport {
        station_id: row.get(0)?,
        observation_date: row.get(1)?,
        station_name: row.get(2)?,
        snow_depth_in: decimal_column(row, 3)?,
        snowfall_in: decimal_column(row, 4)?,
        precip_in: decimal_column(row, 5)?,
        last_updated: row.get(6)?,
    })
}

impl Database {
    /// Observations of one station with `timestamp >= since`, in time order.
    ///
    /// `since` must use the canonical UTC spelling for the comparison to be
    /// chronological.
    pub fn observations_since(
        &self,
        station_id: &str,
        since: &str,
        order: SortOrder,
    ) -> anyhow::Result<Vec<Observation>> {
        let conn = self.conn.borrow();
        let sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations
             WHERE station = ?1 AND timestamp >= ?2
             ORDER BY timestamp {}",
            order.as_sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![station_id, since], observation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "store: {} observations for {station_id} since {since}",
            rows.len()
        );
        Ok(rows)
    }

    /// The most recent report of a station, by observation date.
    pub fn latest_daily_report(&self, station_id: &str) -> anyhow::Result<Option<DailyReport>> {
        let conn = self.conn.borrow();
        let report = conn
            .query_row(
                "SELECT station, observation_date, station_name, snow_depth_in,
                        snowfall_in, precip_in, last_updated
                 FROM cocorahs_reports
                 WHERE station = ?1
                 ORDER BY observation_date DESC
                 LIMIT 1",
                params![station_id],
                report_from_row,
            )
            .optional()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::SortOrder;
    use crate::Database;
    use mwx_sources::observation::{DailyReport, Observation};

    fn sample_db() -> Database {
        let db = Database::new().unwrap();
        for ts in [
            "2025-01-03T12:00:00Z",
            "2025-01-13T11:00:00Z",
            "2025-01-13T12:00:00Z",
            "2025-01-13T09:30:00Z",
        ] {
            db.put_observation(&Observation::new("MMNV1", ts)).unwrap();
        }
        db.put_observation(&Observation::new("KMVL", "2025-01-13T12:00:00Z"))
            .unwrap();
        db
    }

    fn timestamps(rows: &[Observation]) -> Vec<&str> {
        rows.iter().map(|o| o.timestamp.as_str()).collect()
    }

    #[test]
    fn observations_since_descending() {
        let db = sample_db();
        let rows = db
            .observations_since("MMNV1", "2025-01-10T00:00:00Z", SortOrder::Descending)
            .unwrap();
        assert_eq!(
            timestamps(&rows),
            vec![
                "2025-01-13T12:00:00Z",
                "2025-01-13T11:00:00Z",
                "2025-01-13T09:30:00Z"
            ]
        );
    }

    #[test]
    fn observations_since_ascending_and_inclusive() {
        let db = sample_db();
        let rows = db
            .observations_since("MMNV1", "2025-01-13T11:00:00Z", SortOrder::Ascending)
            .unwrap();
        assert_eq!(
            timestamps(&rows),
            vec!["2025-01-13T11:00:00Z", "2025-01-13T12:00:00Z"]
        );
    }

    #[test]
    fn observations_since_unknown_station() {
        let db = sample_db();
        let rows = db
            .observations_since("NOPE", "2000-01-01T00:00:00Z", SortOrder::Ascending)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn latest_daily_report_picks_newest_date() {
        let db = Database::new().unwrap();
        assert_eq!(db.latest_daily_report("VT-WS-41").unwrap(), None);
        for date in ["2025-01-11", "2025-01-12", "2025-01-10"] {
            db.put_daily_report(&DailyReport {
                station_id: "VT-WS-41".to_string(),
                observation_date: date.to_string(),
                last_updated: "2025-01-13T15:00:00Z".to_string(),
                ..Default::default()
            })
            .unwrap();
        }
        let latest = db.latest_daily_report("VT-WS-41").unwrap().unwrap();
        assert_eq!(latest.observation_date, "2025-01-12");
    }
}
