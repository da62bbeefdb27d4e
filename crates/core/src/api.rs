//! HTTP surface of the report backend.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::ApiError,
    types::{
        HealthInfo, Job, JobHistory, JobHistoryPayload, ProcessRequest, ProcessResponse,
        UrlValidation,
    },
    validation::is_valid_video_url,
};

/// Answer of `GET /jobs/{id}/result`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultResponse {
    Ready(Value),
    /// `202 Accepted`: the job finished but the report is not materialized yet.
    Pending,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn health(&self) -> Result<HealthInfo, ApiError>;
    async fn validate_url(&self, url: &str) -> Result<bool, ApiError>;
    async fn create_job(&self, request: &ProcessRequest) -> Result<ProcessResponse, ApiError>;
    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError>;
    async fn job_result(&self, job_id: &str) -> Result<ResultResponse, ApiError>;
    async fn report(&self, report_id: &str) -> Result<Value, ApiError>;
    async fn list_jobs(&self) -> Result<JobHistory, ApiError>;
    async fn delete_job(&self, job_id: &str) -> Result<String, ApiError>;
}

pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        decode(check(response).await?).await
    }
}

/// Turn a non-success response into `ApiError`, keeping the server's `detail`.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body);
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound { detail });
    }
    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// `{"detail": ...}` from an error body. Non-string details are kept as compact JSON.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(detail) if detail.trim().is_empty() => None,
        Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}

/// Normalize both history shapes, warning on the legacy bare list.
pub fn normalize_history(payload: JobHistoryPayload) -> JobHistory {
    match payload {
        JobHistoryPayload::Wrapped(history) => history,
        JobHistoryPayload::Legacy(jobs) => {
            warn!("backend returned job history as a bare list; expected {{\"jobs\": [...]}}");
            JobHistory {
                total: Some(jobs.len()),
                jobs,
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<HealthInfo, ApiError> {
        self.get("").await
    }

    async fn validate_url(&self, url: &str) -> Result<bool, ApiError> {
        let endpoint = self.config.endpoint("validate-url");
        let response = self
            .client
            .get(&endpoint)
            .query(&[("url", url)])
            .send()
            .await?;
        let validation: UrlValidation = decode(check(response).await?).await?;
        Ok(validation.is_valid)
    }

    async fn create_job(&self, request: &ProcessRequest) -> Result<ProcessResponse, ApiError> {
        let url = self.config.endpoint("process");
        debug!(%url, youtube_url = %request.youtube_url, "POST");
        let response = self.client.post(&url).json(request).send().await?;
        decode(check(response).await?).await
    }

    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError> {
        self.get(&format!("jobs/{}/status", job_id)).await
    }

    async fn job_result(&self, job_id: &str) -> Result<ResultResponse, ApiError> {
        let url = self.config.endpoint(&format!("jobs/{}/result", job_id));
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::ACCEPTED {
            return Ok(ResultResponse::Pending);
        }
        let value = decode(check(response).await?).await?;
        Ok(ResultResponse::Ready(value))
    }

    async fn report(&self, report_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("reports/{}", report_id)).await
    }

    async fn list_jobs(&self) -> Result<JobHistory, ApiError> {
        let payload: JobHistoryPayload = self.get("jobs").await?;
        Ok(normalize_history(payload))
    }

    async fn delete_job(&self, job_id: &str) -> Result<String, ApiError> {
        let url = self.config.endpoint(&format!("jobs/{}", job_id));
        debug!(%url, "DELETE");
        let response = self.client.delete(&url).send().await?;
        let body: Map<String, Value> = decode(check(response).await?).await?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Job {} deleted", job_id)))
    }
}

/// Ask the backend whether `url` is valid, falling back to the local check when it cannot answer.
pub async fn validate_url_with_fallback<B: Backend + ?Sized>(backend: &B, url: &str) -> bool {
    match backend.validate_url(url).await {
        Ok(valid) => valid,
        Err(e) => {
            debug!(error = %e, "server-side URL validation unavailable, using local check");
            is_valid_video_url(url)
        }
    }
}
