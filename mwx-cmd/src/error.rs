use thiserror::Error;

/// Why a job failed.
#[derive(Debug, Error)]
pub enum JobError {
    /// Network failure or non-2xx response, or a missing input object.
    #[error("fetch failed: {0:#}")]
    Fetch(anyhow::Error),

    /// A response or artifact lacked an expected field or was malformed.
    #[error("parse failed: {0:#}")]
    Parse(anyhow::Error),

    /// The observation store rejected a read or write.
    #[error("store failed: {0:#}")]
    Store(anyhow::Error),

    /// Writing a derived artifact to object storage failed.
    #[error("export failed: {0:#}")]
    Export(anyhow::Error),
}

impl JobError {
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Fetch(_) => "fetch",
            JobError::Parse(_) => "parse",
            JobError::Store(_) => "store",
            JobError::Export(_) => "export",
        }
    }
}

/// Outcome reported to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub status_code: u16,
    pub body: String,
}

impl RunStatus {
    pub fn ok(body: impl Into<String>) -> Self {
        RunStatus {
            status_code: 200,
            body: body.into(),
        }
    }

    pub fn no_data() -> Self {
        RunStatus::ok("No observation data available")
    }

    /// Records were stored but a later step failed.
    pub fn partial(body: impl Into<String>) -> Self {
        RunStatus {
            status_code: 207,
            body: body.into(),
        }
    }

    pub fn failed(error: &JobError) -> Self {
        RunStatus {
            status_code: 500,
            body: format!("Error: {error}"),
        }
    }

    /// 5xx statuses map to a non-zero exit code.
    pub fn is_failure(&self) -> bool {
        self.status_code >= 500
    }
}
