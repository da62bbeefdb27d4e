use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result, bail};
use console::style;
use serde_json::{Map, Value};
use tubereport_core::{
    Backend, ClientConfig, HttpBackend, JobStatus, JobTracker, Report, TrackerError,
    format_job_line, format_report_readable, get_report_path, get_root_cache_dir, load_report,
    save_report, validate_url_with_fallback,
};

use crate::ui::{
    check, create_progress_bar, create_spinner, cross, format_duration, rule, styled_status,
};

/// Parse `key=value` pairs. Values that are valid JSON keep their type.
pub fn parse_options(raw: &[String]) -> Result<Map<String, Value>> {
    let mut options = Map::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("option '{}' must look like key=value", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("option '{}' has an empty key", pair);
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.into()));
        options.insert(key.to_string(), value);
    }
    Ok(options)
}

fn backend(config: &ClientConfig) -> Result<Arc<HttpBackend>> {
    Ok(Arc::new(
        HttpBackend::new(config.clone()).context("Failed to create HTTP client")?,
    ))
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", format_report_readable(report));
    }
    Ok(())
}

async fn cache_report(job_id: &str, report: &Report) {
    let path = get_report_path(&get_root_cache_dir(), job_id);
    match save_report(report, &path).await {
        Ok(()) => println!("{} {}", style("Saved:").dim(), style(path.display()).cyan()),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not cache report"),
    }
}

/// Ctrl-C stops local polling; the backend job keeps running.
fn cancel_on_ctrl_c(tracker: &Arc<JobTracker<HttpBackend>>) {
    let tracker = Arc::clone(tracker);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracker.cancel();
        }
    });
}

fn print_detached(job_id: &str) {
    println!(
        "\n{} Stopped following job {}. It keeps running on the server; check it with `tubereport status {} --follow`.",
        style("!").yellow().bold(),
        style(job_id).cyan(),
        job_id
    );
}

pub async fn analyze(
    config: ClientConfig,
    url: &str,
    options: Map<String, Value>,
    json: bool,
) -> Result<()> {
    let tracker = Arc::new(JobTracker::new(backend(&config)?, &config));
    cancel_on_ctrl_c(&tracker);

    println!(
        "\n{}  {}\n",
        style("tubereport").cyan().bold(),
        style(&config.api_base_url).dim()
    );

    let total_start = Instant::now();
    let spinner = create_spinner("Submitting job...");
    let job = match tracker.submit_with_options(url, options).await {
        Ok(job) => job,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    let job_id = job.job_id.clone().unwrap_or_default();
    spinner.finish_with_message(format!(
        "{} Job created: {}",
        check(),
        style(&job_id).cyan()
    ));

    let pb = create_progress_bar();
    pb.set_message(job.message.clone());
    let polled = tracker
        .poll_with(&job_id, |job| {
            pb.set_position(u64::from(job.progress));
            pb.set_message(job.message.clone());
        })
        .await;
    pb.finish_and_clear();

    let job = match polled {
        Ok(job) => job,
        Err(TrackerError::Cancelled) => {
            print_detached(&job_id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if job.status == JobStatus::Failed {
        println!(
            "{} Job failed {}",
            cross(),
            style(format!("[{}]", format_duration(total_start.elapsed()))).dim()
        );
        bail!(job.error.unwrap_or_else(|| "Job failed".to_string()));
    }
    println!(
        "{} Processed {}",
        check(),
        style(format!("[{}]", format_duration(total_start.elapsed()))).dim()
    );

    let spinner = create_spinner("Fetching report...");
    let report = match tracker.load_result(&job_id).await {
        Ok(report) => report,
        Err(TrackerError::Cancelled) => {
            spinner.finish_and_clear();
            print_detached(&job_id);
            return Ok(());
        }
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    let Some(report) = report else {
        spinner.finish_with_message(format!(
            "{} Report is still being prepared. Run `tubereport result {}` in a moment.",
            style("…").yellow().bold(),
            job_id
        ));
        return Ok(());
    };
    spinner.finish_with_message(format!(
        "{} Report fetched: {} sections",
        check(),
        report.sections.len()
    ));

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    cache_report(&job_id, &report).await;
    rule();
    print_report(&report, json)
}

pub async fn status(config: ClientConfig, job_id: &str, follow: bool) -> Result<()> {
    let backend = backend(&config)?;

    if !follow {
        let job = backend
            .job_status(job_id)
            .await
            .with_context(|| format!("Failed to get status of job {}", job_id))?;
        println!("{}", format_job_line(&job));
        if let Some(error) = &job.error {
            println!("{} {}", style("Error:").red().bold(), error);
        }
        return Ok(());
    }

    let tracker = Arc::new(JobTracker::new(backend, &config));
    cancel_on_ctrl_c(&tracker);
    let pb = create_progress_bar();
    let tracked = tracker
        .track_with(job_id, |job| {
            pb.set_position(u64::from(job.progress));
            pb.set_message(job.message.clone());
        })
        .await;
    pb.finish_and_clear();

    match tracked {
        Ok(job) => {
            println!("{} {}", styled_status(job.status), format_job_line(&job));
            if let Some(error) = &job.error {
                println!("{} {}", style("Error:").red().bold(), error);
            }
            Ok(())
        }
        Err(TrackerError::Cancelled) => {
            print_detached(job_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn result(config: ClientConfig, job_id: &str, force: bool, json: bool) -> Result<()> {
    let path = get_report_path(&get_root_cache_dir(), job_id);
    if !force {
        match load_report(&path).await {
            Ok(Some(report)) => {
                println!("{} Report loaded {}", check(), style("(cached)").dim());
                rule();
                return print_report(&report, json);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cache entry"),
        }
    }

    let tracker = JobTracker::new(backend(&config)?, &config);
    let spinner = create_spinner("Fetching report...");
    let report = tracker.load_result(job_id).await;
    spinner.finish_and_clear();

    match report? {
        Some(report) => {
            cache_report(job_id, &report).await;
            rule();
            print_report(&report, json)
        }
        None => {
            println!(
                "{} Report for job {} is not ready yet.",
                style("…").yellow().bold(),
                job_id
            );
            Ok(())
        }
    }
}

pub async fn jobs(config: ClientConfig) -> Result<()> {
    let history = backend(&config)?
        .list_jobs()
        .await
        .context("Failed to list jobs")?;

    if history.jobs.is_empty() {
        println!("{}", style("No jobs yet.").dim());
        return Ok(());
    }
    for job in &history.jobs {
        println!("{} {}", styled_status(job.status), format_job_line(job));
    }
    rule();
    println!(
        "{} {}",
        style("Total:").dim(),
        history.total.unwrap_or(history.jobs.len())
    );
    Ok(())
}

pub async fn delete(config: ClientConfig, job_id: &str) -> Result<()> {
    let message = backend(&config)?
        .delete_job(job_id)
        .await
        .with_context(|| format!("Failed to delete job {}", job_id))?;
    println!("{} {}", check(), message);
    Ok(())
}

pub async fn health(config: ClientConfig) -> Result<()> {
    let info = backend(&config)?
        .health()
        .await
        .with_context(|| format!("Backend at {} is not reachable", config.api_base_url))?;
    println!(
        "{} {} {} {}",
        check(),
        info.message.as_deref().unwrap_or("Backend is up"),
        style(info.version.as_deref().unwrap_or("")).dim(),
        style(info.status.as_deref().unwrap_or("")).dim()
    );
    Ok(())
}

pub async fn validate(config: ClientConfig, url: &str) -> Result<()> {
    let backend = backend(&config)?;
    if validate_url_with_fallback(backend.as_ref(), url).await {
        println!("{} {} is a valid video URL", check(), style(url).cyan());
        Ok(())
    } else {
        bail!("{} is not a valid video URL", url)
    }
}
