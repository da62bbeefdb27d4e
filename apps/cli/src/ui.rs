use std::time::Duration;

use console::{StyledObject, style};
use indicatif::{ProgressBar, ProgressStyle};
use tubereport_core::JobStatus;

pub fn format_duration(d: Duration) -> String {
    let tenths = (d.as_secs_f64() * 10.0).round() as u64;
    if tenths < 600 {
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = d.as_secs_f64().round() as u64;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Percentage bar driven by the job's reported progress.
pub fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg} {elapsed:.dim}")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn check() -> StyledObject<&'static str> {
    style("✓").green().bold()
}

pub fn cross() -> StyledObject<&'static str> {
    style("✗").red().bold()
}

pub fn styled_status(status: JobStatus) -> StyledObject<&'static str> {
    let label = style(status.as_str());
    match status {
        JobStatus::Completed => label.green(),
        JobStatus::Failed => label.red(),
        JobStatus::Processing => label.yellow(),
        JobStatus::Queued | JobStatus::Starting => label.dim(),
    }
}

pub fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}
