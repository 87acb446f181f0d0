use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siteprobe::config::Config;
use siteprobe::error::Error;
use siteprobe::notifications::{ConsoleSink, LogSink, Notifier, WebhookSink};
use siteprobe::probe::{HttpProber, Prober};
use siteprobe::scheduler::{MonitorState, Scheduler};

#[derive(Parser)]
#[command(
    name = "siteprobe",
    version,
    about = "Watch a website and raise an alert the moment it becomes available",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the target every minute until it answers
    Watch {
        /// Target URL (overrides config and environment)
        #[arg(short, long)]
        url: Option<String>,

        /// Probe timeout in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Webhook to notify when the target is available
        #[arg(long)]
        webhook: Option<String>,

        /// Do not print the countdown on stdout
        #[arg(short, long, default_value = "false")]
        quiet: bool,
    },

    /// Probe the target once and report the outcome
    Probe {
        /// Target URL (overrides config and environment)
        #[arg(short, long)]
        url: Option<String>,

        /// Probe timeout in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logging is not up yet, so a bad file or variable is reported directly.
    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::from(Error::from(e).exit_code()));
        }
    };
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    let outcome = match cli.command {
        Commands::Watch {
            url,
            timeout_ms,
            webhook,
            quiet,
        } => {
            apply_overrides(&mut config, url, timeout_ms);
            if webhook.is_some() {
                config.notifications.webhook_url = webhook;
            }
            if quiet {
                config.notifications.console = false;
            }
            tracing::info!(
                target_url = %config.monitor.target_url,
                console = %config.notifications.console,
                webhook = ?config.notifications.webhook_url,
                "Starting watch command"
            );
            watch(config).await
        }

        Commands::Probe { url, timeout_ms } => {
            apply_overrides(&mut config, url, timeout_ms);
            tracing::info!(target_url = %config.monitor.target_url, "Starting probe command");
            probe(config).await
        }

        Commands::Config => show_config(&config),
    };

    Ok(outcome.unwrap_or_else(|e| {
        tracing::error!(
            category = e.category().as_str(),
            recoverable = e.is_recoverable(),
            "{e}"
        );
        ExitCode::from(e.exit_code())
    }))
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("siteprobe=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("siteprobe={level},warn")))
    };

    // Logs go to stderr so the console countdown owns stdout.
    let installed = match format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.context("Failed to initialise logging")
}

fn apply_overrides(config: &mut Config, url: Option<String>, timeout_ms: Option<u64>) {
    if let Some(url) = url {
        config.monitor.target_url = url;
    }
    if let Some(timeout_ms) = timeout_ms {
        config.monitor.probe_timeout_ms = timeout_ms;
    }
}

async fn watch(config: Config) -> siteprobe::Result<ExitCode> {
    config.validate()?;

    let scheduler = Scheduler::with_http_prober(config.monitor.clone())?;

    let mut notifier = Notifier::new().with_sink(Box::new(LogSink::new()));
    if config.notifications.console {
        notifier.add_sink(Box::new(ConsoleSink::stdout(
            scheduler.config().target_url.trim(),
        )));
    }
    if let Some(webhook) = WebhookSink::from_config(&config.notifications)? {
        notifier.add_sink(Box::new(webhook));
    }

    tracing::debug!(
        sinks = ?notifier.sink_names(),
        poll_interval_secs = scheduler.config().poll_interval_secs,
        "Notifier ready"
    );

    let delivery = tokio::spawn(notifier.run(scheduler.subscribe()));
    let handle = scheduler.start()?;

    let canceller = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let state = handle.wait().await;
    let stats = delivery
        .await
        .map_err(|e| Error::with_source("Notifier task failed", e))?;

    tracing::info!(
        state = %state,
        events = stats.events,
        failed_deliveries = stats.failed,
        "Watch finished"
    );

    Ok(match state {
        MonitorState::Alerted { .. } | MonitorState::Stopped => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn probe(config: Config) -> siteprobe::Result<ExitCode> {
    config.monitor.validate()?;
    let target = config.monitor.target()?;

    let prober = HttpProber::with_user_agent(config.monitor.user_agent.clone())?;
    let outcome = prober.probe(&target, config.monitor.probe_timeout()).await;

    println!("{target}: {outcome}");

    Ok(if outcome.is_available() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_config(config: &Config) -> siteprobe::Result<ExitCode> {
    config.validate()?;
    print!("{}", config.to_toml()?);
    Ok(ExitCode::SUCCESS)
}
