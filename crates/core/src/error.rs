use thiserror::Error;

/// Failures of a single request against the report backend.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{}", status_message(*status, detail.as_deref()))]
    Status { status: u16, detail: Option<String> },

    #[error("{}", status_message(404, detail.as_deref()))]
    NotFound { detail: Option<String> },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Server-provided detail text, falling back to the status code.
    pub fn detail_or_status(&self) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Status {
                status,
                detail: None,
            } => format!("HTTP {status}"),
            ApiError::NotFound {
                detail: Some(detail),
            } => detail.clone(),
            ApiError::NotFound { detail: None } => "HTTP 404".to_string(),
            other => other.to_string(),
        }
    }
}

fn status_message(status: u16, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("HTTP {status}: {detail}"),
        None => format!("HTTP {status}"),
    }
}

/// User-facing failures of the job lifecycle.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Invalid video URL: {reason}")]
    Validation { reason: String },

    #[error("Job submission failed: {detail}")]
    Submission { detail: String },

    #[error("Status polling failed for job {job_id}: {reason}")]
    Polling { job_id: String, reason: String },

    #[error("Job {job_id} did not finish after {attempts} status checks")]
    Timeout { job_id: String, attempts: u32 },

    #[error("Could not fetch the result of job {job_id}: {detail}")]
    ResultFetch { job_id: String, detail: String },

    #[error("Tracking was cancelled")]
    Cancelled,
}

impl TrackerError {
    /// Cancellation is a local decision, not something to show in the error banner.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, TrackerError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
