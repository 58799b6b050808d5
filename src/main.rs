use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use textcal::cli::Cli;
use textcal::config::Config;
use textcal::{pipeline, TextcalError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("textcal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let text = read_input(cli.input.as_deref()).await?;
    if text.trim().is_empty() {
        bail!("input text is empty");
    }

    let (document, report) = pipeline::run(&config, &text).await?;
    if report.skipped > 0 {
        warn!(
            skipped = report.skipped,
            "some candidates were dropped; see warnings above"
        );
    }

    tokio::fs::write(&config.output, &document)
        .await
        .map_err(|source| TextcalError::Io {
            path: config.output.clone(),
            source,
        })?;
    info!(
        path = %config.output.display(),
        extracted = report.extracted,
        written = report.written,
        "calendar written"
    );

    Ok(())
}

async fn read_input(path: Option<&Path>) -> Result<String, TextcalError> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            tokio::fs::read_to_string(p)
                .await
                .map_err(|source| TextcalError::Io {
                    path: p.to_path_buf(),
                    source,
                })
        }
        _ => std::io::read_to_string(std::io::stdin()).map_err(|source| TextcalError::Io {
            path: "-".into(),
            source,
        }),
    }
}
