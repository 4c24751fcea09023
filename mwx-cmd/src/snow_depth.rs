//! Snow depth jobs writing the seasonal grid (`snowDepth.csv`).

use anyhow::anyhow;
use chrono::Local;
use log::info;
use mwx_data::season_grid::SeasonGrid;
use mwx_sources::{hydro_report, hydro_report::HydroReport, uvm};
use mwx_utils::{
    compression::gzip,
    dates::{day_label, season_label, season_start_year},
};
use std::collections::BTreeMap;

use crate::error::{JobError, RunStatus};
use crate::settings::JobContext;
use crate::storage::{ObjectStore, PutOptions, SNOW_DEPTH_KEY};

pub const NO_NEW_DATA: &str = "No new snow depth data";

/// Read the published grid. A missing grid is a fetch failure.
pub fn load_grid(store: &dyn ObjectStore) -> Result<SeasonGrid, JobError> {
    let object = store
        .get_object(SNOW_DEPTH_KEY)
        .map_err(JobError::Fetch)?
        .ok_or_else(|| {
            JobError::Fetch(anyhow!("{SNOW_DEPTH_KEY} not found; run grid-init first"))
        })?;
    let text = object.text().map_err(JobError::Parse)?;
    SeasonGrid::from_csv(&text).map_err(JobError::Parse)
}

pub fn save_grid(store: &dyn ObjectStore, grid: &SeasonGrid) -> Result<(), JobError> {
    let csv = grid.to_csv().map_err(JobError::Export)?;
    let body = gzip(csv.as_bytes()).map_err(|e| JobError::Export(e.into()))?;
    store
        .put_object(SNOW_DEPTH_KEY, &body, &PutOptions::public_gzip(Some("text/csv")))
        .map_err(JobError::Export)
}

/// Write the summit depth of one HYD product into its season row.
pub fn record_hydro_report(
    store: &dyn ObjectStore,
    report: &HydroReport,
) -> Result<RunStatus, JobError> {
    let issued = report
        .issued
        .ok_or_else(|| JobError::Parse(anyhow!("no issuance date in text product")))?;
    let Some(depth) = report.snow_depth_in else {
        info!("no summit snow depth in product issued {issued}");
        return Ok(RunStatus::ok("No depth in current text report"));
    };

    let mut grid = load_grid(store)?;
    let update = grid
        .upsert(&issued, &depth.to_string())
        .map_err(JobError::Parse)?;
    if !update.changed() {
        return Ok(RunStatus::ok(NO_NEW_DATA));
    }
    save_grid(store, &grid)?;
    Ok(RunStatus::ok(format!(
        "Recorded {depth} in for {} in {} ({update:?})",
        day_label(&issued),
        season_label(&issued)
    )))
}

/// Replace one season row with the UVM series.
pub fn record_season(
    store: &dyn ObjectStore,
    start_year: i32,
    values: &BTreeMap<String, String>,
) -> Result<RunStatus, JobError> {
    if values.is_empty() {
        return Ok(RunStatus::ok(NO_NEW_DATA));
    }
    let label = format!("{start_year}-{}", start_year + 1);
    let mut grid = load_grid(store)?;
    let update = grid.replace_season(&label, values);
    if !update.changed() {
        return Ok(RunStatus::ok(NO_NEW_DATA));
    }
    save_grid(store, &grid)?;
    Ok(RunStatus::ok(format!(
        "Wrote {} days to {label} ({update:?})",
        values.len()
    )))
}

pub async fn run_hydro(ctx: &JobContext) -> Result<RunStatus, JobError> {
    let html = hydro_report::fetch_product(&ctx.client)
        .await
        .map_err(JobError::Fetch)?;
    let report = hydro_report::parse_product_page(&html).map_err(JobError::Parse)?;
    if let Some(t) = report.temperatures {
        info!(
            "summit temperatures max {} min {} current {}",
            t.max_f, t.min_f, t.current_f
        );
    }
    record_hydro_report(&ctx.bucket, &report)
}

pub async fn run_uvm(ctx: &JobContext, season_start: Option<i32>) -> Result<RunStatus, JobError> {
    let start_year = season_start.unwrap_or_else(|| season_start_year(&Local::now().date_naive()));
    info!("fetching UVM snow depth for season starting {start_year}");
    let body = uvm::fetch_season(&ctx.client, start_year)
        .await
        .map_err(JobError::Fetch)?;
    let values = uvm::parse_season(&body).map_err(JobError::Parse)?;
    record_season(&ctx.bucket, start_year, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalBucket;
    use chrono::NaiveDate;

    fn bucket_with_empty_grid(dir: &tempfile::TempDir) -> LocalBucket {
        let bucket = LocalBucket::new(dir.path());
        save_grid(&bucket, &SeasonGrid::empty()).unwrap();
        bucket
    }

    fn report(depth: Option<i32>) -> HydroReport {
        HydroReport {
            issued: NaiveDate::from_ymd_opt(2019, 2, 10),
            snow_depth_in: depth,
            temperatures: None,
        }
    }

    #[test]
    fn test_missing_grid_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path());
        let err = load_grid(&bucket).unwrap_err();
        assert_eq!(err.kind(), "fetch");
    }

    #[test]
    fn test_saved_grid_is_gzip_csv() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket_with_empty_grid(&dir);
        let object = bucket.get_object(SNOW_DEPTH_KEY).unwrap().unwrap();
        assert_eq!(object.options.content_type.as_deref(), Some("text/csv"));
        assert!(object.options.public_read);
        assert_eq!(load_grid(&bucket).unwrap(), SeasonGrid::empty());
    }

    #[test]
    fn test_hydro_report_creates_then_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket_with_empty_grid(&dir);

        let status = record_hydro_report(&bucket, &report(Some(63))).unwrap();
        assert!(status.body.contains("2018-2019"));
        let grid = load_grid(&bucket).unwrap();
        assert_eq!(grid.cell("2018-2019", "2/10"), Some("63"));

        let again = record_hydro_report(&bucket, &report(Some(63))).unwrap();
        assert_eq!(again.body, NO_NEW_DATA);
    }

    #[test]
    fn test_hydro_report_without_depth() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket_with_empty_grid(&dir);
        let status = record_hydro_report(&bucket, &report(None)).unwrap();
        assert_eq!(status.body, "No depth in current text report");
        assert!(load_grid(&bucket).unwrap().seasons().is_empty());
    }

    #[test]
    fn test_hydro_report_without_date_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket_with_empty_grid(&dir);
        let mut undated = report(Some(63));
        undated.issued = None;
        let err = record_hydro_report(&bucket, &undated).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_season_replaced_once() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket_with_empty_grid(&dir);
        let values: BTreeMap<String, String> = [("1/5", "30"), ("1/6", "31")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let status = record_season(&bucket, 2024, &values).unwrap();
        assert!(status.body.starts_with("Wrote 2 days to 2024-2025"));
        let grid = load_grid(&bucket).unwrap();
        assert_eq!(grid.cell("2024-2025", "1/6"), Some("31"));
        assert_eq!(grid.cell("2024-2025", "1/7"), Some(""));

        let again = record_season(&bucket, 2024, &values).unwrap();
        assert_eq!(again.body, NO_NEW_DATA);
    }
}
