//! mailsheet - download spreadsheet attachments from Gmail
//!
//! Scans the first page of the mailbox for messages with the configured
//! subject and stores their spreadsheet attachments locally. Takes no flags;
//! see `ExtractorConfig::from_env` for the `MAILSHEET_*` overrides.

use anyhow::Context;
use mailsheet_core::{connect, run_scan, CoreError, ExtractorConfig};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the progress lines
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,mailsheet=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            exit_code(&e)
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ExtractorConfig::from_env().context("loading configuration")?;
    info!("Starting mailsheet, store directory {}", config.store_dir.display());

    let client = connect(&config).await.context("acquiring Gmail credential")?;

    let report = run_scan(&config, &client, |event| println!("{}", event)).await?;
    info!(
        "Saved {} attachments from {} matching messages",
        report.saved_count(),
        report.matched().count()
    );
    Ok(())
}

/// 1: auth or config, 2: provider API, 3: local storage
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Api(_)) => ExitCode::from(2),
        Some(CoreError::Sink(_)) => ExitCode::from(3),
        _ => ExitCode::from(1),
    }
}
