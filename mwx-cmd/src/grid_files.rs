//! Manual maintenance of the published grid: backup, restore and bootstrap.

use anyhow::{anyhow, Context};
use chrono::{Local, NaiveDate};
use log::info;
use mwx_data::season_grid::SeasonGrid;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{JobError, RunStatus};
use crate::snow_depth::save_grid;
use crate::storage::{ObjectStore, SNOW_DEPTH_KEY};

pub fn backup_name(date: &NaiveDate) -> String {
    format!("snowDepth-{}.csv.bak", date.format("%Y%m%d"))
}

/// Copy the published grid, as stored, to a dated file under `out_dir`.
pub fn pull(
    store: &dyn ObjectStore,
    out_dir: &Path,
    today: &NaiveDate,
) -> Result<PathBuf, JobError> {
    let object = store
        .get_object(SNOW_DEPTH_KEY)
        .map_err(JobError::Fetch)?
        .ok_or_else(|| {
            JobError::Fetch(anyhow!("{SNOW_DEPTH_KEY} not found; run grid-init first"))
        })?;
    let text = object.text().map_err(JobError::Parse)?;
    let path = out_dir.join(backup_name(today));
    fs::write(&path, &text)
        .with_context(|| format!("writing {}", path.display()))
        .map_err(JobError::Export)?;
    info!("saved {} bytes to {}", text.len(), path.display());
    Ok(path)
}

/// Publish a local grid file after checking that it parses.
pub fn push(store: &dyn ObjectStore, file: &Path) -> Result<SeasonGrid, JobError> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))
        .map_err(JobError::Fetch)?;
    let grid = SeasonGrid::from_csv(&text).map_err(JobError::Parse)?;
    save_grid(store, &grid)?;
    Ok(grid)
}

/// Publish an empty grid unless one already exists.
pub fn init(store: &dyn ObjectStore) -> Result<(), JobError> {
    if store.get_object(SNOW_DEPTH_KEY).map_err(JobError::Fetch)?.is_some() {
        return Err(JobError::Export(anyhow!(
            "{SNOW_DEPTH_KEY} already exists; use grid-push to replace it"
        )));
    }
    save_grid(store, &SeasonGrid::empty())
}

pub fn run_pull(store: &dyn ObjectStore, out_dir: &Path) -> Result<RunStatus, JobError> {
    let path = pull(store, out_dir, &Local::now().date_naive())?;
    Ok(RunStatus::ok(format!("Saved {}", path.display())))
}

pub fn run_push(store: &dyn ObjectStore, file: &Path) -> Result<RunStatus, JobError> {
    let grid = push(store, file)?;
    Ok(RunStatus::ok(format!(
        "Published {SNOW_DEPTH_KEY} with {} seasons",
        grid.seasons().len()
    )))
}

pub fn run_init(store: &dyn ObjectStore) -> Result<RunStatus, JobError> {
    init(store)?;
    Ok(RunStatus::ok(format!("Created empty {SNOW_DEPTH_KEY}")))
}
