#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::Instant;
use tubereport_core::{
    ApiError, Backend, ClientConfig, JobHistory, ResultResponse,
    types::{HealthInfo, Job, ProcessRequest, ProcessResponse},
};

/// One scripted answer of the fake backend.
#[derive(Clone, Debug)]
pub enum Reply {
    Json(Value),
    /// `202 Accepted`.
    Pending,
    Transport,
    Status(u16, Option<&'static str>),
    NotFound,
}

impl Reply {
    pub fn status(status: &str, progress: u8) -> Self {
        Reply::Json(json!({
            "job_id": "job-1",
            "status": status,
            "progress": progress,
            "message": format!("{status} {progress}%"),
        }))
    }
}

async fn transport_error() -> ApiError {
    // A relative URL fails inside reqwest before any I/O happens.
    reqwest::Client::new()
        .get("not a url")
        .send()
        .await
        .expect_err("relative URL must be rejected")
        .into()
}

async fn into_error(reply: Reply) -> ApiError {
    match reply {
        Reply::Transport => transport_error().await,
        Reply::Status(status, detail) => ApiError::Status {
            status,
            detail: detail.map(str::to_string),
        },
        Reply::NotFound => ApiError::NotFound { detail: None },
        other => panic!("{other:?} is not an error reply"),
    }
}

/// In-memory backend answering from per-endpoint scripts and recording every call.
///
/// When a script is down to its last reply, that reply is repeated.
#[derive(Default)]
pub struct ScriptedBackend {
    create: Mutex<VecDeque<Reply>>,
    statuses: Mutex<VecDeque<Reply>>,
    results: Mutex<VecDeque<Reply>>,
    reports: Mutex<HashMap<String, Reply>>,
    status_delay: Mutex<Duration>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_create(&self, reply: Reply) -> &Self {
        self.create.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_status(&self, reply: Reply) -> &Self {
        self.statuses.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_result(&self, reply: Reply) -> &Self {
        self.results.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_report(&self, report_id: &str, reply: Reply) -> &Self {
        self.reports
            .lock()
            .unwrap()
            .insert(report_id.to_string(), reply);
        self
    }

    pub fn delay_status(&self, delay: Duration) -> &Self {
        *self.status_delay.lock().unwrap() = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Instants at which the given endpoint was called.
    pub fn call_times(&self, endpoint: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == endpoint)
            .map(|(_, at)| *at)
            .collect()
    }

    fn record(&self, endpoint: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), Instant::now()));
    }

    fn next(script: &Mutex<VecDeque<Reply>>) -> Reply {
        let mut script = script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or(Reply::Status(500, Some("script exhausted")))
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn health(&self) -> Result<HealthInfo, ApiError> {
        self.record("health");
        Ok(serde_json::from_value(json!({"status": "running"}))?)
    }

    async fn validate_url(&self, _url: &str) -> Result<bool, ApiError> {
        self.record("validate_url");
        Err(transport_error().await)
    }

    async fn create_job(&self, _request: &ProcessRequest) -> Result<ProcessResponse, ApiError> {
        self.record("create_job");
        match Self::next(&self.create) {
            Reply::Json(value) => Ok(serde_json::from_value(value)?),
            other => Err(into_error(other).await),
        }
    }

    async fn job_status(&self, _job_id: &str) -> Result<Job, ApiError> {
        self.record("job_status");
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match Self::next(&self.statuses) {
            Reply::Json(value) => Ok(serde_json::from_value(value)?),
            other => Err(into_error(other).await),
        }
    }

    async fn job_result(&self, _job_id: &str) -> Result<ResultResponse, ApiError> {
        self.record("job_result");
        match Self::next(&self.results) {
            Reply::Json(value) => Ok(ResultResponse::Ready(value)),
            Reply::Pending => Ok(ResultResponse::Pending),
            other => Err(into_error(other).await),
        }
    }

    async fn report(&self, report_id: &str) -> Result<Value, ApiError> {
        self.record("report");
        let reply = self
            .reports
            .lock()
            .unwrap()
            .get(report_id)
            .cloned()
            .unwrap_or(Reply::NotFound);
        match reply {
            Reply::Json(value) => Ok(value),
            other => Err(into_error(other).await),
        }
    }

    async fn list_jobs(&self) -> Result<JobHistory, ApiError> {
        self.record("list_jobs");
        Ok(JobHistory::default())
    }

    async fn delete_job(&self, job_id: &str) -> Result<String, ApiError> {
        self.record("delete_job");
        Ok(format!("Job {job_id} deleted"))
    }
}

pub fn queued_job() -> Reply {
    Reply::Json(json!({"job_id": "job-1", "status": "queued", "message": "queued"}))
}

pub fn test_config() -> ClientConfig {
    ClientConfig::with_base_url("http://backend.test")
}
