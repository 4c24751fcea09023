use log::info;
use mwx_data::observation_log::append_newer;
use mwx_sources::summit_table::{self, SummitReading};

use crate::error::{JobError, RunStatus};
use crate::settings::JobContext;
use crate::storage::{ObjectStore, PutOptions, SUMMIT_LOG_KEY};

/// Append the readings newer than the log's last line and write it back.
///
/// A missing log starts empty.
pub fn append_readings(
    store: &dyn ObjectStore,
    readings: &[SummitReading],
) -> Result<usize, JobError> {
    let existing = match store.get_object(SUMMIT_LOG_KEY).map_err(JobError::Fetch)? {
        Some(object) => object.text().map_err(JobError::Parse)?,
        None => {
            info!("{SUMMIT_LOG_KEY} not found, starting a new log");
            String::new()
        }
    };
    let (log, appended) = append_newer(&existing, readings).map_err(JobError::Parse)?;
    if appended == 0 {
        return Ok(0);
    }
    let options = PutOptions {
        content_type: Some("text/csv".to_string()),
        ..PutOptions::default()
    };
    store
        .put_object(SUMMIT_LOG_KEY, log.as_bytes(), &options)
        .map_err(JobError::Export)?;
    Ok(appended)
}

pub async fn run(ctx: &JobContext) -> Result<RunStatus, JobError> {
    let html = summit_table::fetch_page(&ctx.client)
        .await
        .map_err(JobError::Fetch)?;
    let readings = summit_table::parse_page(&html).map_err(JobError::Parse)?;
    if readings.is_empty() {
        return Ok(RunStatus::no_data());
    }
    let appended = append_readings(&ctx.bucket, &readings)?;
    info!("appended {appended} of {} summit readings", readings.len());
    Ok(RunStatus::ok(format!("Appended {appended} summit readings")))
}
