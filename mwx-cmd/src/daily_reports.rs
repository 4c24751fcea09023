//! CoCoRaHS daily reports for the watched Vermont stations.

use anyhow::anyhow;
use chrono::{Duration, Local, NaiveDate, Utc};
use log::{info, warn};
use mwx_data::normalize::from_cocorahs;
use mwx_db::Database;
use mwx_sources::{cocorahs, station::Station};

use crate::error::{JobError, RunStatus};
use crate::settings::JobContext;

pub const DEFAULT_DAYS_BACK: i64 = 2;

/// Report dates to request: `days_back` days ending yesterday.
pub fn report_window(
    today: NaiveDate,
    days_back: i64,
) -> Result<(NaiveDate, NaiveDate), JobError> {
    let end = today.checked_sub_signed(Duration::days(1));
    let start = Duration::try_days(days_back)
        .and_then(|d| end.and_then(|end| end.checked_sub_signed(d)));
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(JobError::Parse(anyhow!(
            "window of {days_back} days before {today} is out of range"
        ))),
    }
}

fn log_latest(db: &Database, stations: &[String]) -> Result<(), JobError> {
    for station in stations {
        match db.latest_daily_report(station).map_err(JobError::Store)? {
            Some(report) => info!(
                "{station}: latest report {} depth {:?} snowfall {:?}",
                report.observation_date, report.snow_depth_in, report.snowfall_in
            ),
            None => info!("{station}: no reports stored"),
        }
    }
    Ok(())
}

pub async fn run(ctx: &JobContext, state: &str, days_back: i64) -> Result<RunStatus, JobError> {
    let stations = Station::cocorahs_ids().map_err(JobError::Parse)?;
    let (start, end) = report_window(Local::now().date_naive(), days_back)?;
    info!("fetching CoCoRaHS reports for {state} from {start} to {end}");

    let body = cocorahs::fetch_export(&ctx.client, state, &start, &end)
        .await
        .map_err(JobError::Fetch)?;
    let rows = cocorahs::parse_export(&body).map_err(JobError::Parse)?;
    let reports = from_cocorahs(&rows, &stations, &Utc::now());
    if reports.is_empty() {
        warn!("none of {} rows came from watched stations", rows.len());
        return Ok(RunStatus::no_data());
    }

    let db = ctx.database()?;
    let stored = db.put_daily_reports(&reports).map_err(JobError::Store)?;
    log_latest(&db, &stations)?;
    Ok(RunStatus::ok(format!("Stored {stored} CoCoRaHS reports")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ends_yesterday() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let (start, end) = report_window(today, DEFAULT_DAYS_BACK).unwrap();
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 2, 26).unwrap());
    }

    #[test]
    fn test_window_out_of_range_is_parse_error() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let err = report_window(today, i64::MAX / 1000).unwrap_err();
        assert_eq!(err.kind(), "parse");
        let err = report_window(today, 100_000_000).unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(report_window(NaiveDate::MIN, 0).is_err());
    }

    #[test]
    fn test_latest_reports_logged_from_empty_store() {
        let db = Database::new().unwrap();
        let stations = vec!["VT-WS-41".to_string(), "VT-LM-1".to_string()];
        assert!(log_latest(&db, &stations).is_ok());
    }
}
