//! LabelCat CLI entry point.
//!
//! This binary is the composition root. It loads [`config::Config`], installs
//! tracing via [`telemetry`], constructs the concrete [`AutoMlClassifier`] and
//! [`GithubClient`], injects them into a [`TriageExecutor`] and runs one of:
//!
//! - `serve`: the webhook receiver, plus the triage worker in queued mode,
//!   until Ctrl-C.
//! - `harvest`: dump issues of a list of repositories to CSV.
//! - `sign`: print the `X-Hub-Signature` value for a payload file, for
//!   replaying deliveries by hand.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use classifier::AutoMlClassifier;
use clap::{Parser, Subcommand};
use github::GithubClient;
use listener::{run_server, run_worker, triage_queue, DeliveryMode, HookLog, ServerState};
use nodes::TriageExecutor;
use pipeline::signature;
use tracing::info;

mod config;
mod harvest;
mod telemetry;

use config::{Config, Mode};

#[derive(Parser)]
#[command(name = "labelcat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Labels newly opened GitHub issues using a trained text classifier", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, env = "LABELCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Listen address, overriding `server.bind`
        #[arg(long)]
        bind: Option<String>,

        /// Delivery mode, overriding `server.mode`
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },

    /// Write the issues of the listed repositories to a training CSV
    Harvest {
        /// File with one `owner/repo` per line
        repos_file: PathBuf,

        /// CSV file to write
        output: PathBuf,

        /// Stop each repository after this many pages
        #[arg(long, default_value_t = 50)]
        max_pages: u32,

        /// Append to `output` instead of overwriting it
        #[arg(long)]
        append: bool,
    },

    /// Print the webhook signature header value for a payload file
    Sign {
        /// Payload file, signed byte for byte
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry = telemetry::init(cli.json)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, mode } => serve(config, bind, mode).await,
        Commands::Harvest {
            repos_file,
            output,
            max_pages,
            append,
        } => {
            let github = GithubClient::new(config.github_config()?)?;
            let summary = harvest::run(&github, &repos_file, &output, max_pages, append).await?;
            if summary.failed_repositories > 0 {
                eprintln!(
                    "{} of {} repositories could not be harvested",
                    summary.failed_repositories, summary.repositories
                );
            }
            Ok(())
        }
        Commands::Sign { file } => {
            let secret = config.webhook_secret()?;
            let body = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            println!("{}", signature::sign(&secret, &body));
            Ok(())
        }
    }
}

async fn serve(mut config: Config, bind: Option<String>, mode: Option<Mode>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(mode) = mode {
        config.server.mode = mode;
    }
    config.validate_server()?;

    let settings = config.triage_settings()?;
    let classifier = Arc::new(AutoMlClassifier::new(config.automl_config()?)?);
    let tracker = Arc::new(GithubClient::new(config.github_config()?)?);
    let executor = Arc::new(TriageExecutor::new(classifier, tracker, settings));
    let hook_log = Arc::new(HookLog::new(config.server.hook_log_capacity));

    info!(
        mode = ?config.server.mode,
        threshold = executor.settings().threshold().as_f64(),
        "starting LabelCat"
    );

    match config.server.mode {
        Mode::Inline => {
            let state = Arc::new(ServerState {
                executor,
                hook_log,
                mode: DeliveryMode::Inline,
            });
            run_server(state, &config.server.bind, shutdown_signal()).await?;
        }
        Mode::Queued => {
            let (sender, receiver) = triage_queue(config.server.queue_capacity);
            let worker = tokio::spawn(run_worker(
                receiver,
                Arc::clone(&executor),
                Arc::clone(&hook_log),
            ));
            let state = Arc::new(ServerState {
                executor,
                hook_log,
                mode: DeliveryMode::Queued(sender),
            });
            // The server owns the only sender; once it stops the worker drains.
            run_server(state, &config.server.bind, shutdown_signal()).await?;
            worker.await.context("triage worker panicked")?;
        }
    }

    info!("LabelCat stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => tracing::error!(error = %err, "failed to listen for Ctrl-C"),
    }
}
