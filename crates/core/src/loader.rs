use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    api::{Backend, ResultResponse},
    config::ResultRetryConfig,
    error::{Result, TrackerError},
    report::Report,
    schedule::PollHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready(Report),
    /// The backend answered `202`: ask again later.
    Pending,
}

/// Fetches and normalizes the report of a completed job.
pub struct ResultLoader<B: Backend + ?Sized> {
    backend: Arc<B>,
    retry: ResultRetryConfig,
}

impl<B: Backend + ?Sized> Clone for ResultLoader<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            retry: self.retry.clone(),
        }
    }
}

impl<B: Backend + ?Sized> ResultLoader<B> {
    pub fn new(backend: Arc<B>, retry: ResultRetryConfig) -> Self {
        Self { backend, retry }
    }

    /// One attempt at fetching the result.
    pub async fn load(&self, job_id: &str) -> Result<LoadOutcome> {
        let payload = match self.backend.job_result(job_id).await {
            Ok(ResultResponse::Ready(payload)) => payload,
            Ok(ResultResponse::Pending) => {
                debug!(job_id, "result not materialized yet");
                return Ok(LoadOutcome::Pending);
            }
            Err(e) => {
                return Err(TrackerError::ResultFetch {
                    job_id: job_id.to_string(),
                    detail: e.detail_or_status(),
                });
            }
        };

        let payload = self.expand(job_id, payload).await;
        let report = Report::from_value(payload).map_err(|e| TrackerError::ResultFetch {
            job_id: job_id.to_string(),
            detail: format!("malformed report: {e}"),
        })?;

        info!(job_id, sections = report.sections.len(), "report loaded");
        Ok(LoadOutcome::Ready(report))
    }

    /// Load, retrying `202` answers. `Ok(None)` means the report is still not ready, which is not an error.
    pub async fn load_when_ready(&self, job_id: &str, handle: &PollHandle) -> Result<Option<Report>> {
        for attempt in 1..=self.retry.max_attempts.max(1) {
            if handle.is_cancelled() {
                return Err(TrackerError::Cancelled);
            }
            let outcome = self.load(job_id).await?;
            if handle.is_cancelled() {
                return Err(TrackerError::Cancelled);
            }
            match outcome {
                LoadOutcome::Ready(report) => return Ok(Some(report)),
                LoadOutcome::Pending if attempt < self.retry.max_attempts => {
                    if !handle.sleep(self.retry.delay).await {
                        return Err(TrackerError::Cancelled);
                    }
                }
                LoadOutcome::Pending => {}
            }
        }
        Ok(None)
    }

    /// Follow a `report_id` reference to the full report, keeping the primary payload on failure.
    async fn expand(&self, job_id: &str, payload: Value) -> Value {
        let Some(report_id) = report_reference(&payload) else {
            return payload;
        };

        match self.backend.report(&report_id).await {
            Ok(full) if full.is_object() => full,
            Ok(_) => {
                warn!(job_id, %report_id, "expanded report is not an object, using job result");
                payload
            }
            Err(e) => {
                warn!(job_id, %report_id, error = %e, "expanded report unavailable, using job result");
                payload
            }
        }
    }
}

fn report_reference(payload: &Value) -> Option<String> {
    match payload.get("report_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
