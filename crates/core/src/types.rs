use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Client-side only: submitted, backend has not acknowledged yet.
    Starting,
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position in `starting -> queued -> processing -> {completed | failed}`.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Starting => 0,
            JobStatus::Queued => 1,
            JobStatus::Processing => 2,
            JobStatus::Completed | JobStatus::Failed => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "starting" => Some(JobStatus::Starting),
            "queued" | "pending" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Unknown labels are intermediate backend steps and count as processing.
    pub fn parse(label: &str) -> Self {
        Self::from_label(label).unwrap_or(JobStatus::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(JobStatus::parse(&label))
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// `None` until the backend has assigned one.
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: JobStatus,
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default, deserialize_with = "deserialize_message")]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

impl Job {
    /// Provisional job shown between submission and the backend's answer.
    pub fn starting(youtube_url: &str) -> Self {
        Self {
            job_id: None,
            status: JobStatus::Starting,
            progress: 0,
            message: "Submitting job...".to_string(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            completed_at: None,
            error: None,
            youtube_url: Some(youtube_url.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Replace this snapshot with `next`, never moving status or progress backwards.
    pub fn advance(&self, mut next: Job) -> Job {
        if next.status.rank() < self.status.rank() {
            next.status = self.status;
        }
        next.progress = next.progress.max(self.progress).min(100);
        if next.job_id.is_none() {
            next.job_id = self.job_id.clone();
        }
        if next.created_at.is_none() {
            next.created_at = self.created_at.clone();
        }
        if next.youtube_url.is_none() {
            next.youtube_url = self.youtube_url.clone();
        }
        if next.status != JobStatus::Failed {
            next.error = None;
        }
        next
    }
}

/// Accepts integers, floats and `null`, clamped to 0..=100.
fn deserialize_progress<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|p| p.clamp(0.0, 100.0).round() as u8).unwrap_or(0))
}

fn deserialize_message<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /api/v1/process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRequest {
    pub youtube_url: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

/// Response of `POST /api/v1/process`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    pub job_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ProcessResponse {
    /// The acknowledged job. Anything other than an explicit known status counts as queued.
    pub fn into_job(self, youtube_url: &str, provisional: &Job) -> Job {
        let status = match self.status.as_deref().and_then(JobStatus::from_label) {
            None | Some(JobStatus::Starting) => JobStatus::Queued,
            Some(status) => status,
        };

        Job {
            job_id: Some(self.job_id),
            status,
            progress: 0,
            message: self.message.unwrap_or_else(|| "Job queued".to_string()),
            created_at: self.created_at.or_else(|| provisional.created_at.clone()),
            completed_at: None,
            error: None,
            youtube_url: Some(youtube_url.to_string()),
        }
    }
}

/// Canonical `GET /api/v1/jobs` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobHistory {
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub total: Option<usize>,
}

/// Both history shapes the backend has served. The bare list is a legacy shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobHistoryPayload {
    Wrapped(JobHistory),
    Legacy(Vec<Job>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlValidation {
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus, progress: u8) -> Job {
        Job {
            job_id: Some("job-1".into()),
            status,
            progress,
            message: String::new(),
            created_at: None,
            completed_at: None,
            error: None,
            youtube_url: None,
        }
    }

    #[test]
    fn status_parses_backend_strings() {
        let job: Job = serde_json::from_str(
            r#"{"job_id":"job-1","status":"processing","progress":40,"message":"Transcribing","created_at":"2024-05-01T10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 40);
        assert!(!job.is_terminal());
    }

    #[test]
    fn unknown_labels_count_as_processing() {
        let job: Job =
            serde_json::from_str(r#"{"status":"transcribing","progress":null,"message":null}"#)
                .unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 0);
        assert!(job.message.is_empty());
    }

    #[test]
    fn advance_never_moves_backwards() {
        let current = job(JobStatus::Processing, 60);
        let next = current.advance(job(JobStatus::Queued, 20));
        assert_eq!(next.status, JobStatus::Processing);
        assert_eq!(next.progress, 60);
    }

    #[test]
    fn advance_keeps_identity_fields() {
        let mut current = job(JobStatus::Queued, 0);
        current.created_at = Some("t0".into());
        let mut incoming = job(JobStatus::Processing, 10);
        incoming.job_id = None;
        let next = current.advance(incoming);
        assert_eq!(next.job_id.as_deref(), Some("job-1"));
        assert_eq!(next.created_at.as_deref(), Some("t0"));
    }

    #[test]
    fn process_response_defaults_to_queued() {
        let provisional = Job::starting("https://youtu.be/abc");
        let response: ProcessResponse =
            serde_json::from_str(r#"{"job_id":"job-1","status":"weird"}"#).unwrap();
        let job = response.into_job("https://youtu.be/abc", &provisional);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.job_id.as_deref(), Some("job-1"));
        assert_eq!(job.created_at, provisional.created_at);
    }

    #[test]
    fn history_accepts_both_shapes() {
        let wrapped: JobHistoryPayload =
            serde_json::from_str(r#"{"jobs":[{"job_id":"a","status":"queued"}],"total":1}"#)
                .unwrap();
        assert!(matches!(wrapped, JobHistoryPayload::Wrapped(h) if h.jobs.len() == 1));

        let legacy: JobHistoryPayload =
            serde_json::from_str(r#"[{"job_id":"a","status":"completed"}]"#).unwrap();
        assert!(matches!(legacy, JobHistoryPayload::Legacy(jobs) if jobs.len() == 1));
    }
}
