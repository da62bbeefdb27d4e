use std::path::{Path, PathBuf};

use crate::report::Report;

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tubereport")
}

pub fn get_reports_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("reports")
}

/// Get the path for a cached report file
pub fn get_report_path(cache_dir: &Path, job_id: &str) -> PathBuf {
    let file_name: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    get_reports_dir(cache_dir).join(format!("{}.json", file_name))
}

pub async fn save_report(report: &Report, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(path, json).await
}

/// `Ok(None)` when nothing is cached at `path`.
pub async fn load_report(path: &Path) -> std::io::Result<Option<Report>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}
