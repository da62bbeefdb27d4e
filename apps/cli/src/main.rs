use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;
use tubereport_core::ClientConfig;

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "tubereport")]
#[command(
    about = "Submit YouTube videos to the report backend, follow the job and read the generated report"
)]
struct Cli {
    /// Backend base URL. Defaults to $TUBEREPORT_API_BASE or http://localhost:8000
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a video, wait for the job and print its report
    Analyze {
        /// Video URL (watch, youtu.be or embed link)
        url: String,

        /// Processing option forwarded to the backend, as key=value
        #[arg(short, long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Milliseconds between status checks
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Status checks before giving up
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Print the report as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// Show the status of a job
    Status {
        job_id: String,

        /// Keep polling until the job finishes
        #[arg(short, long)]
        follow: bool,
    },

    /// Print the report of a completed job
    Result {
        job_id: String,

        /// Fetch from the backend even if the report is cached
        #[arg(short, long)]
        force: bool,

        /// Print the report as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// List previously submitted jobs
    Jobs,

    /// Delete a job on the backend
    Delete { job_id: String },

    /// Check that the backend is reachable
    Health,

    /// Check whether a URL would be accepted
    Validate { url: String },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> ClientConfig {
    match &cli.api_base {
        Some(base) => ClientConfig::with_base_url(base),
        None => ClientConfig::from_env(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = build_config(&cli);

    match cli.command {
        Command::Analyze {
            url,
            options,
            interval_ms,
            max_attempts,
            json,
        } => {
            if let Some(ms) = interval_ms {
                config.poll.interval = Duration::from_millis(ms);
            }
            if let Some(attempts) = max_attempts {
                config.poll.max_attempts = attempts;
            }
            let options = commands::parse_options(&options)?;
            commands::analyze(config, &url, options, json).await
        }
        Command::Status { job_id, follow } => commands::status(config, &job_id, follow).await,
        Command::Result {
            job_id,
            force,
            json,
        } => commands::result(config, &job_id, force, json).await,
        Command::Jobs => commands::jobs(config).await,
        Command::Delete { job_id } => commands::delete(config, &job_id).await,
        Command::Health => commands::health(config).await,
        Command::Validate { url } => commands::validate(config, &url).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_collects_repeated_options() {
        let cli = Cli::try_parse_from([
            "tubereport",
            "--api-base",
            "http://backend:9000/",
            "analyze",
            "https://youtu.be/abc123",
            "-o",
            "language=en",
            "--option",
            "detail=3",
        ])
        .unwrap();

        assert_eq!(build_config(&cli).api_base_url, "http://backend:9000");
        let Command::Analyze { options, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(options, vec!["language=en", "detail=3"]);
    }
}
