mod alerts;
mod app;
mod charts;
mod client;
mod config;
mod dashboard;
mod format;
mod logs;
mod notify;
mod pipeline;
mod scheduler;
mod ui;

use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::Error as DotenvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::client::ApiClient;
use crate::dashboard::Tab;

#[derive(Debug, Parser)]
#[command(author, version, about = "opsdash — terminal dashboard for the monitoring service")]
struct Cli {
    /// Path to YAML configuration file. Defaults to env OPSDASH_CONFIG or built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monitoring service base URL, overriding the configuration.
    #[arg(short, long)]
    url: Option<String>,

    /// Auto-refresh interval in seconds, 0 disables. Overrides the configuration.
    #[arg(short, long)]
    interval: Option<u64>,

    /// Tab to open first: system, performance, alerts or logs.
    #[arg(short, long)]
    tab: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing()?;

    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.api.base_url = url;
    }
    if let Some(seconds) = cli.interval {
        config.refresh.interval = Duration::from_secs(seconds);
    }

    let initial_tab = match cli.tab.as_deref() {
        Some(name) => {
            let tab = Tab::parse(name);
            if tab.is_none() {
                warn!(tab = name, "unknown tab name, opening the default tab");
            }
            tab
        }
        None => None,
    };

    let client = ApiClient::new(&config.api.base_url, config.api.timeout)?;
    info!(url = %config.api.base_url, "starting dashboard");

    app::run(client, &config, initial_tab).await
}

fn load_env() {
    if let Err(err) = dotenvy::dotenv() {
        match err {
            DotenvError::Io(io_err) if io_err.kind() == ErrorKind::NotFound => {}
            other => eprintln!("warning: failed to load .env file: {other}"),
        }
    }
}

/// Diagnostics go to a file; the terminal itself belongs to the dashboard.
fn init_tracing() -> Result<()> {
    let path = std::env::var("OPSDASH_LOG").unwrap_or_else(|_| "opsdash.log".to_string());
    let file = File::create(&path).with_context(|| format!("failed to create log file {path}"))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("opsdash=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}
