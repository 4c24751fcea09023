//! Command implementations for the mwx CLI.
//!
//! Each subcommand is one scheduled job: fetch a source, normalize it, store
//! it, and optionally publish a derived artifact.

use clap::Subcommand;
use log::error;
use mwx_sources::{
    nws::{DEFAULT_LIMIT, REFERENCE_LIMIT},
    station::{COCORAHS_STATE, SUMMIT_STATION},
};
use std::path::PathBuf;

pub mod alert;
pub mod daily_reports;
pub mod error;
pub mod export;
pub mod grid_files;
pub mod observations;
pub mod settings;
pub mod snow_depth;
pub mod storage;
pub mod summit_wind;

use error::{JobError, RunStatus};
use settings::{JobContext, Settings};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Store the latest NWS observations for a station
    NwsObservations {
        #[arg(long, default_value = SUMMIT_STATION)]
        station: String,

        /// Number of observations to request
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },

    /// Store recent Synoptic observations and refresh the snapshot
    SynopticObservations {
        #[arg(long, default_value = SUMMIT_STATION)]
        station: String,

        #[arg(long, default_value_t = 2)]
        lookback_hours: i64,

        /// Days of stored observations in the snapshot
        #[arg(long, default_value_t = export::DEFAULT_WINDOW_DAYS)]
        window_days: i64,
    },

    /// Regenerate the observation snapshot from the store
    ExportSnapshot {
        #[arg(long, default_value = SUMMIT_STATION)]
        station: String,

        #[arg(long, default_value_t = export::DEFAULT_WINDOW_DAYS)]
        window_days: i64,

        /// NWS observations used as the temperature reference
        #[arg(long, default_value_t = REFERENCE_LIMIT)]
        reference_limit: u32,
    },

    /// Store CoCoRaHS daily reports for the watched stations
    Cocorahs {
        #[arg(long, default_value = COCORAHS_STATE)]
        state: String,

        #[arg(long, default_value_t = daily_reports::DEFAULT_DAYS_BACK)]
        days_back: i64,
    },

    /// Record the summit depth from the NWS hydrologic text product
    HydroReport,

    /// Rewrite a season of the grid from the UVM summit station
    UvmSnowDepth {
        /// First year of the season; defaults to the current season
        #[arg(long)]
        season_start: Option<i32>,
    },

    /// Append new rows of the NWS summit table to the wind log
    SummitWind,

    /// Download the published grid to a dated backup file
    GridPull {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Publish a local grid file
    GridPush {
        #[arg(long, default_value = "snowDepth.csv")]
        file: PathBuf,
    },

    /// Publish an empty grid when none exists
    GridInit,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::NwsObservations { .. } => "nws-observations",
            Command::SynopticObservations { .. } => "synoptic-observations",
            Command::ExportSnapshot { .. } => "export-snapshot",
            Command::Cocorahs { .. } => "cocorahs",
            Command::HydroReport => "hydro-report",
            Command::UvmSnowDepth { .. } => "uvm-snow-depth",
            Command::SummitWind => "summit-wind",
            Command::GridPull { .. } => "grid-pull",
            Command::GridPush { .. } => "grid-push",
            Command::GridInit => "grid-init",
        }
    }
}

async fn dispatch(ctx: &JobContext, command: Command) -> Result<RunStatus, JobError> {
    match command {
        Command::NwsObservations { station, limit } => {
            observations::run_nws(ctx, &station, limit).await
        }
        Command::SynopticObservations {
            station,
            lookback_hours,
            window_days,
        } => {
            observations::run_synoptic(ctx, &station, lookback_hours, window_days, REFERENCE_LIMIT)
                .await
        }
        Command::ExportSnapshot {
            station,
            window_days,
            reference_limit,
        } => observations::run_export(ctx, &station, window_days, reference_limit).await,
        Command::Cocorahs { state, days_back } => daily_reports::run(ctx, &state, days_back).await,
        Command::HydroReport => snow_depth::run_hydro(ctx).await,
        Command::UvmSnowDepth { season_start } => snow_depth::run_uvm(ctx, season_start).await,
        Command::SummitWind => summit_wind::run(ctx).await,
        Command::GridPull { out_dir } => grid_files::run_pull(&ctx.bucket, &out_dir),
        Command::GridPush { file } => grid_files::run_push(&ctx.bucket, &file),
        Command::GridInit => grid_files::run_init(&ctx.bucket),
    }
}

/// Run one job and report its status. Failures are logged and alerted.
pub async fn run(settings: Settings, command: Command) -> RunStatus {
    let name = command.name();
    let ctx = match JobContext::from_settings(settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            let err = JobError::Fetch(e.context("building HTTP client"));
            error!("mwx {name}: {err}");
            return RunStatus::failed(&err);
        }
    };
    match dispatch(&ctx, command).await {
        Ok(status) => status,
        Err(e) => {
            error!("mwx {name} failed ({}): {e}", e.kind());
            ctx.alerter
                .notify(&format!("mwx {name} failed"), &e.to_string())
                .await;
            RunStatus::failed(&e)
        }
    }
}
