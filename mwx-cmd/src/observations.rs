//! Summit observation collection from the NWS and Synoptic feeds.

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};
use mwx_data::{
    normalize::{from_nws, from_synoptic},
    reconcile::ReferencePoint,
};
use mwx_db::Database;
use mwx_sources::{nws, observation::Observation, synoptic};

use crate::alert::Alerter;
use crate::error::{JobError, RunStatus};
use crate::export::{export_snapshot, export_stored, load_reference};
use crate::settings::JobContext;
use crate::storage::ObjectStore;

/// Store the latest `limit` NWS observations.
pub async fn run_nws(ctx: &JobContext, station: &str, limit: u32) -> Result<RunStatus, JobError> {
    info!("fetching {limit} NWS observations for {station}");
    let body = nws::fetch_observations(&ctx.client, station, limit)
        .await
        .map_err(JobError::Fetch)?;
    let collection = nws::parse_observation_collection(&body).map_err(JobError::Parse)?;
    let observations = from_nws(station, &collection);
    if observations.is_empty() {
        warn!("no observations in NWS response");
        return Ok(RunStatus::no_data());
    }

    let db = ctx.database()?;
    let stored = db.put_observations(&observations).map_err(JobError::Store)?;
    Ok(RunStatus::ok(format!("Successfully stored {stored} observations")))
}

/// Start of a lookback of `hours` ending at `end`.
pub fn lookback_start(end: &DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>, JobError> {
    Duration::try_hours(hours)
        .and_then(|d| end.checked_sub_signed(d))
        .ok_or_else(|| JobError::Parse(anyhow!("lookback of {hours} hours is out of range")))
}

/// Store `observations`, then republish the snapshot.
///
/// A snapshot failure after a successful store is a partial success and is
/// alerted.
pub async fn store_and_export(
    db: &Database,
    store: &dyn ObjectStore,
    alerter: &Alerter,
    observations: &[Observation],
    station: &str,
    window_days: i64,
    reference: &anyhow::Result<Vec<ReferencePoint>>,
) -> Result<RunStatus, JobError> {
    let stored = db.put_observations(observations).map_err(JobError::Store)?;

    match export_stored(db, store, station, window_days, reference) {
        Ok(0) => Ok(RunStatus::ok(format!(
            "Successfully stored {stored} observations; nothing to export"
        ))),
        Ok(_) => Ok(RunStatus::ok(format!(
            "Successfully stored {stored} observations and wrote JSON"
        ))),
        Err(e) => {
            error!("snapshot export failed after storing {stored} observations: {e}");
            alerter
                .notify("Mount Mansfield Observations Error", &e.to_string())
                .await;
            Ok(RunStatus::partial(format!("Stored {stored} observations; {e}")))
        }
    }
}

/// Store the last `lookback_hours` of Synoptic observations, then refresh
/// the snapshot.
pub async fn run_synoptic(
    ctx: &JobContext,
    station: &str,
    lookback_hours: i64,
    window_days: i64,
    reference_limit: u32,
) -> Result<RunStatus, JobError> {
    let token = ctx
        .settings
        .synoptic_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| JobError::Parse(anyhow!("SYNOPTIC_API_TOKEN is not set")))?;

    let end = Utc::now();
    let start = lookback_start(&end, lookback_hours)?;
    info!("fetching Synoptic observations for {station} from {start} to {end}");
    let body = synoptic::fetch_timeseries(&ctx.client, token, station, &start, &end)
        .await
        .map_err(JobError::Fetch)?;
    let response = synoptic::parse_timeseries(&body).map_err(JobError::Parse)?;
    let observations = from_synoptic(station, &response);
    if observations.is_empty() {
        warn!("no observations retrieved from Synoptic");
        return Ok(RunStatus::no_data());
    }
    info!("fetched {} observations from Synoptic", observations.len());

    let db = ctx.database()?;
    let reference = load_reference(&ctx.client, station, reference_limit).await;
    store_and_export(
        &db,
        &ctx.bucket,
        &ctx.alerter,
        &observations,
        station,
        window_days,
        &reference,
    )
    .await
}

/// Regenerate the snapshot from what is already stored.
pub async fn run_export(
    ctx: &JobContext,
    station: &str,
    window_days: i64,
    reference_limit: u32,
) -> Result<RunStatus, JobError> {
    let db = ctx.database()?;
    let exported = export_snapshot(
        &db,
        &ctx.bucket,
        &ctx.client,
        station,
        window_days,
        reference_limit,
    )
    .await?;
    if exported == 0 {
        return Ok(RunStatus::no_data());
    }
    Ok(RunStatus::ok(format!("Exported {exported} observations")))
}
