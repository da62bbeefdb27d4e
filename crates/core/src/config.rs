use std::time::Duration;

pub const API_BASE_ENV_VAR: &str = "TUBEREPORT_API_BASE";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Timing of the status polling loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay after a successful status fetch.
    pub interval: Duration,
    /// Delay after a failed status fetch.
    pub error_backoff: Duration,
    /// Status fetches allowed before giving up, failed ones included.
    pub max_attempts: u32,
    /// Consecutive failed fetches that end polling.
    pub failure_threshold: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            error_backoff: Duration::from_millis(5000),
            max_attempts: 120,
            failure_threshold: 3,
        }
    }
}

impl PollConfig {
    /// Upper bound on the time spent sleeping between attempts.
    pub fn worst_case_wait(&self) -> Duration {
        self.interval.max(self.error_backoff) * self.max_attempts
    }
}

/// How long to wait for a result that the backend answers with `202 Accepted`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRetryConfig {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for ResultRetryConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            max_attempts: 5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub poll: PollConfig,
    pub result: ResultRetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }
}

impl ClientConfig {
    pub fn with_base_url(api_base_url: &str) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url),
            request_timeout: Duration::from_secs(30),
            poll: PollConfig::default(),
            result: ResultRetryConfig::default(),
        }
    }

    /// Read the backend base URL from `TUBEREPORT_API_BASE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(API_BASE_ENV_VAR).filter(|value| !value.trim().is_empty()) {
            Some(base) => Self::with_base_url(&base),
            None => Self::default(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_polling() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_secs(3));
        assert_eq!(poll.error_backoff, Duration::from_secs(5));
        assert_eq!(poll.max_attempts, 120);
        assert_eq!(poll.failure_threshold, 3);
    }

    #[test]
    fn env_override_trims_trailing_slash() {
        let config = ClientConfig::from_lookup(|key| {
            (key == API_BASE_ENV_VAR).then(|| "https://reports.example.com/".to_string())
        });
        assert_eq!(config.api_base_url, "https://reports.example.com");
        assert_eq!(
            config.endpoint("jobs/abc/status"),
            "https://reports.example.com/api/v1/jobs/abc/status"
        );
    }

    #[test]
    fn blank_env_falls_back_to_default() {
        let config = ClientConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.endpoint(""), "http://localhost:8000/api/v1/");
    }
}
