use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, TrackerError};

lazy_static! {
    /// `watch?v=`, `youtu.be/` short links and `embed/` links, scheme and `www.` optional.
    pub static ref VIDEO_URL_REGEX: Regex = Regex::new(
        r"^(https?://)?(www\.|m\.)?(youtube\.com/(watch\?(.*&)?v=|embed/)|youtu\.be/)[\w-]+"
    )
    .unwrap();
}

pub fn is_valid_video_url(url: &str) -> bool {
    VIDEO_URL_REGEX.is_match(url.trim())
}

/// Returns the trimmed URL, or a validation error.
pub fn validate_video_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(TrackerError::Validation {
            reason: "URL is empty".to_string(),
        });
    }
    if !is_valid_video_url(url) {
        return Err(TrackerError::Validation {
            reason: format!("'{url}' is not a YouTube watch, short or embed link"),
        });
    }
    Ok(url)
}
