pub mod api;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod loader;
pub mod report;
pub mod schedule;
pub mod tracker;
pub mod types;
pub mod validation;

pub use api::{Backend, HttpBackend, ResultResponse, validate_url_with_fallback};
pub use cache::{get_report_path, get_root_cache_dir, load_report, save_report};
pub use config::{ClientConfig, PollConfig, ResultRetryConfig};
pub use dispatch::{SectionRenderer, dispatch, dispatch_all};
pub use error::{ApiError, Result, TrackerError};
pub use format::{MarkdownRenderer, format_job_line, format_report_readable};
pub use loader::{LoadOutcome, ResultLoader};
pub use report::{Report, Section, SectionBody};
pub use schedule::PollHandle;
pub use tracker::{JobTracker, TrackerState};
pub use types::{Job, JobHistory, JobStatus};
pub use validation::{is_valid_video_url, validate_video_url};
