mod args;
mod export;
mod watch;

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use smartsheet_engine::{EngineConfig, RunState, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Cli, Mode};
use crate::watch::{watch_batch, WatchOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env()?;
    if let Some(url) = &cli.url {
        config.job_service_url = url.clone();
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms.max(1));
    }

    let session = Session::connect(&config)?;

    let text = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    session
        .load_csv(&text)
        .with_context(|| format!("Failed to parse {} as CSV", cli.input.display()))?;

    if !cli.skip_health && !session.check_health().await {
        bail!(
            "Job service at {} is not available. Please ensure all services are running.",
            config.job_service_url
        );
    }

    let mut events = session.orchestrator().subscribe();
    let batch_id = match cli.mode {
        Mode::Labels => session.submit_labels().await,
        Mode::Table => session.submit_table().await,
    }
    .context("Failed to start autofill")?;
    tracing::info!(batch_id = %batch_id, mode = ?cli.mode, "Autofill started");

    let outcome = if session.orchestrator().state() == RunState::Complete {
        WatchOutcome::Completed { job_count: 0 }
    } else {
        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        watch_batch(&mut events, Duration::from_secs(cli.wait_secs), interrupt).await
    };

    match &outcome {
        WatchOutcome::Completed { job_count } => {
            tracing::info!(batch_id = %batch_id, job_count, "Autofill complete");
        }
        WatchOutcome::TimedOut | WatchOutcome::Interrupted => {
            session.stop();
            tracing::warn!(batch_id = %batch_id, outcome = ?outcome, "Autofill stopped before completion");
        }
        WatchOutcome::Stopped | WatchOutcome::Failed(_) => {
            tracing::warn!(batch_id = %batch_id, outcome = ?outcome, "Autofill ended early");
        }
    }

    let csv_path = cli
        .csv_out
        .clone()
        .unwrap_or_else(|| export::default_csv_path(chrono::Utc::now()));
    export::write_csv(&session, &csv_path).await?;
    if let Some(json_path) = &cli.json_out {
        export::write_results_json(&session, json_path).await?;
    }

    if !matches!(outcome, WatchOutcome::Completed { .. }) {
        bail!("Autofill did not complete ({outcome:?}); partial results were exported");
    }
    Ok(())
}

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartsheet=info,smartsheet_engine=info,smartsheet_client=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}
