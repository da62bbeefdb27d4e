//! Drives one job from submission to a terminal status.
//!
//! The tracker owns the only shared state the presentation layer reads: the
//! current [`Job`], its [`Report`] once loaded, and the error banner text.
//! Every step replaces that state as a whole through a `watch` channel, so a
//! subscriber never sees half of an update.
//!
//! Polling is strictly sequential: the next status request is issued only
//! after the previous one resolved and the inter-attempt sleep elapsed, so
//! snapshots are applied in request order. Each run is tied to a
//! [`PollHandle`]; a new submission or [`JobTracker::cancel`] invalidates it,
//! and any response that arrives afterwards is dropped instead of applied.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::Backend,
    config::{ClientConfig, PollConfig},
    error::{ApiError, Result, TrackerError},
    loader::ResultLoader,
    report::Report,
    schedule::PollHandle,
    types::{Job, JobStatus, ProcessRequest},
    validation::validate_video_url,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    pub job: Option<Job>,
    pub report: Option<Report>,
    /// Text of the dismissible error banner.
    pub error: Option<String>,
    /// The job completed but the backend has not materialized its report yet.
    pub awaiting_report: bool,
}

impl TrackerState {
    pub fn is_busy(&self) -> bool {
        self.job.as_ref().is_some_and(|job| !job.is_terminal())
    }
}

pub struct JobTracker<B: Backend + ?Sized> {
    backend: Arc<B>,
    poll: PollConfig,
    loader: ResultLoader<B>,
    state: watch::Sender<TrackerState>,
    current: Mutex<PollHandle>,
}

impl<B: Backend + ?Sized> JobTracker<B> {
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Self {
        let loader = ResultLoader::new(Arc::clone(&backend), config.result.clone());
        let (state, _) = watch::channel(TrackerState::default());
        Self {
            backend,
            poll: config.poll.clone(),
            loader,
            state,
            current: Mutex::new(PollHandle::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Stop polling locally. The backend job keeps running.
    pub fn cancel(&self) {
        self.handle().cancel();
    }

    pub fn dismiss_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    /// Cancel and go back to the pre-submission state.
    pub fn reset(&self) {
        self.cancel();
        self.state.send_replace(TrackerState::default());
    }

    pub async fn submit(&self, url: &str) -> Result<Job> {
        self.submit_with_options(url, Map::new()).await
    }

    pub async fn submit_with_options(&self, url: &str, options: Map<String, Value>) -> Result<Job> {
        let url = match validate_video_url(url) {
            Ok(url) => url,
            Err(e) => {
                self.record_error(&e);
                return Err(e);
            }
        };

        let handle = self.begin();
        let provisional = Job::starting(url);
        self.state.send_replace(TrackerState {
            job: Some(provisional.clone()),
            ..TrackerState::default()
        });

        let request = ProcessRequest {
            youtube_url: url.to_string(),
            options,
        };
        let response = self.backend.create_job(&request).await;
        if handle.is_cancelled() {
            debug!("discarding job creation response after cancellation");
            return Err(TrackerError::Cancelled);
        }

        match response {
            Ok(response) => {
                let job = response.into_job(url, &provisional);
                info!(job_id = job.job_id.as_deref().unwrap_or_default(), "job created");
                self.state.send_replace(TrackerState {
                    job: Some(job.clone()),
                    ..TrackerState::default()
                });
                Ok(job)
            }
            Err(e) => {
                let err = TrackerError::Submission {
                    detail: e.detail_or_status(),
                };
                self.state.send_replace(TrackerState {
                    error: Some(err.to_string()),
                    ..TrackerState::default()
                });
                Err(err)
            }
        }
    }

    pub async fn poll(&self, job_id: &str) -> Result<Job> {
        self.poll_with(job_id, |_| {}).await
    }

    /// Poll until the job is terminal, calling `on_update` with every applied snapshot.
    pub async fn poll_with(&self, job_id: &str, mut on_update: impl FnMut(&Job)) -> Result<Job> {
        let handle = self.handle();
        let mut attempts = 0u32;
        let mut consecutive_failures = 0u32;

        loop {
            if handle.is_cancelled() {
                return Err(TrackerError::Cancelled);
            }

            attempts += 1;
            let response = self.backend.job_status(job_id).await;
            if handle.is_cancelled() {
                debug!(job_id, "discarding status response after cancellation");
                return Err(TrackerError::Cancelled);
            }

            let delay = match response {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    let job = self.apply(job_id, snapshot);
                    debug!(job_id, attempts, status = %job.status, progress = job.progress, "status");
                    on_update(&job);

                    if job.is_terminal() {
                        if job.status == JobStatus::Failed {
                            let message = job.error.clone().unwrap_or_else(|| "Job failed".into());
                            warn!(job_id, %message, "job failed");
                            self.state.send_modify(|state| state.error = Some(message));
                        } else {
                            info!(job_id, attempts, "job completed");
                        }
                        return Ok(job);
                    }
                    self.poll.interval
                }
                Err(ApiError::NotFound { .. }) => {
                    return Err(self.fail(TrackerError::Polling {
                        job_id: job_id.to_string(),
                        reason: "job not found".to_string(),
                    }));
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        job_id,
                        attempts,
                        consecutive_failures,
                        error = %e,
                        "status check failed"
                    );
                    if consecutive_failures >= self.poll.failure_threshold {
                        return Err(self.fail(TrackerError::Polling {
                            job_id: job_id.to_string(),
                            reason: e.to_string(),
                        }));
                    }
                    self.poll.error_backoff
                }
            };

            if attempts >= self.poll.max_attempts {
                return Err(self.fail(TrackerError::Timeout {
                    job_id: job_id.to_string(),
                    attempts,
                }));
            }

            if !handle.sleep(delay).await {
                return Err(TrackerError::Cancelled);
            }
        }
    }

    /// Follow an already submitted job.
    pub async fn track(&self, job_id: &str) -> Result<Job> {
        self.track_with(job_id, |_| {}).await
    }

    pub async fn track_with(&self, job_id: &str, on_update: impl FnMut(&Job)) -> Result<Job> {
        self.begin();
        self.state.send_replace(TrackerState::default());
        self.poll_with(job_id, on_update).await
    }

    /// Fetch the report of a completed job into the tracker state.
    ///
    /// `Ok(None)` means the backend kept answering `202`; this is not an error
    /// and leaves `awaiting_report` set.
    pub async fn load_result(&self, job_id: &str) -> Result<Option<Report>> {
        let handle = self.handle();
        match self.loader.load_when_ready(job_id, &handle).await {
            Ok(Some(report)) => {
                let stored = report.clone();
                self.state.send_modify(|state| {
                    state.report = Some(stored);
                    state.awaiting_report = false;
                });
                Ok(Some(report))
            }
            Ok(None) => {
                info!(job_id, "report still being prepared");
                self.state.send_modify(|state| state.awaiting_report = true);
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Submit, poll to a terminal status and load the report if the job completed.
    pub async fn run(&self, url: &str, options: Map<String, Value>) -> Result<TrackerState> {
        self.run_with(url, options, |_| {}).await
    }

    pub async fn run_with(
        &self,
        url: &str,
        options: Map<String, Value>,
        on_update: impl FnMut(&Job),
    ) -> Result<TrackerState> {
        let job = self.submit_with_options(url, options).await?;
        let job_id = job.job_id.clone().unwrap_or_default();
        let job = self.poll_with(&job_id, on_update).await?;
        if job.status == JobStatus::Completed {
            self.load_result(&job_id).await?;
        }
        Ok(self.snapshot())
    }

    fn handle(&self) -> PollHandle {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Invalidate the previous run and start a new one.
    fn begin(&self) -> PollHandle {
        let handle = PollHandle::new();
        let previous = std::mem::replace(
            &mut *self.current.lock().unwrap_or_else(PoisonError::into_inner),
            handle.clone(),
        );
        previous.cancel();
        handle
    }

    fn apply(&self, job_id: &str, snapshot: Job) -> Job {
        let next = match &self.state.borrow().job {
            Some(current) if current.job_id.as_deref() == Some(job_id) => current.advance(snapshot),
            _ => {
                let mut job = snapshot;
                job.job_id.get_or_insert_with(|| job_id.to_string());
                job
            }
        };
        let stored = next.clone();
        self.state.send_modify(|state| state.job = Some(stored));
        next
    }

    fn record_error(&self, err: &TrackerError) {
        if err.is_user_visible() {
            let message = err.to_string();
            self.state.send_modify(|state| state.error = Some(message));
        }
    }

    fn fail(&self, err: TrackerError) -> TrackerError {
        if err.is_user_visible() {
            warn!(error = %err, "tracking failed");
            self.record_error(&err);
        }
        err
    }
}
