use clap::Args;
use mwx_db::Database;
use mwx_sources::http::build_client;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::alert::Alerter;
use crate::error::JobError;
use crate::storage::LocalBucket;

pub const DEFAULT_USER_AGENT: &str = "mwx (weather collection)";

/// Options shared by every job. Each falls back to an environment variable.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// SQLite file holding observations and reports
    #[arg(long, env = "MWX_DB_PATH", default_value = "mwx.sqlite3", global = true)]
    pub db_path: PathBuf,

    /// Directory standing in for the public bucket
    #[arg(long, env = "MWX_BUCKET_DIR", default_value = "bucket", global = true)]
    pub bucket_dir: PathBuf,

    /// Webhook that receives failure notifications as JSON
    #[arg(long, env = "MWX_ALERT_WEBHOOK", global = true)]
    pub alert_webhook: Option<String>,

    /// Synoptic Data API token
    #[arg(long, env = "SYNOPTIC_API_TOKEN", hide_env_values = true, global = true)]
    pub synoptic_token: Option<String>,

    /// User-Agent sent with every request
    #[arg(long, env = "MWX_USER_AGENT", default_value = DEFAULT_USER_AGENT, global = true)]
    pub user_agent: String,

    /// Timeout for each outbound request, in seconds
    #[arg(long, env = "MWX_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,
}

/// Everything a job touches, built once per run.
pub struct JobContext {
    pub client: Client,
    pub bucket: LocalBucket,
    pub alerter: Alerter,
    pub settings: Settings,
}

impl JobContext {
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = build_client(&settings.user_agent, timeout)?;
        Ok(JobContext {
            bucket: LocalBucket::new(&settings.bucket_dir),
            alerter: Alerter::new(client.clone(), settings.alert_webhook.clone()),
            client,
            settings,
        })
    }

    /// Open the observation store.
    pub fn database(&self) -> Result<Database, JobError> {
        Database::open(&self.settings.db_path).map_err(JobError::Store)
    }
}
