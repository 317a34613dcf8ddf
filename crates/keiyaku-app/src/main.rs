// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Keiyaku — contract text extraction and comparison
//
// Entry point. Initialises logging, loads the extractor config, and runs one
// command. Errors are shown in plain language and exit non-zero.

mod cli;
mod services;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use keiyaku_compare::MarkerStyle;
use keiyaku_core::SUPPORTED_EXTENSIONS;
use keiyaku_core::error::Result;
use keiyaku_core::human_errors::humanize_error;

use cli::{Cli, Command};
use services::app_services::AppServices;
use services::config::load_config;
use services::worker::block_on_detached;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // A timed-out request leaves its worker running inside the engine; the
    // runtime is shut down without waiting for it.
    let outcome = match block_on_detached(run(cli)) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("Error: could not start the async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("Error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Command::Formats = cli.command {
        for ext in SUPPORTED_EXTENSIONS {
            println!(".{ext}");
        }
        return Ok(());
    }

    let services = build_services(&cli)?;

    match cli.command {
        Command::Extract { file, json } => {
            let report = services.extract(&file).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render());
            }
        }
        Command::Compare {
            file_a,
            file_b,
            json,
            plain,
        } => {
            let style = if plain {
                MarkerStyle::Plain
            } else {
                MarkerStyle::Html
            };
            let report = services.compare(&file_a, &file_b, style).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }
        Command::Formats => {}
    }
    Ok(())
}

fn build_services(cli: &Cli) -> Result<AppServices> {
    let config = load_config(cli.config.as_deref())?;
    let timeout = Duration::from_secs(cli.timeout_secs);
    tracing::info!(
        tesseract = %config.tesseract_cmd.display(),
        pdftoppm = %config.pdftoppm_cmd.display(),
        timeout_secs = cli.timeout_secs,
        "Keiyaku starting"
    );

    #[cfg(feature = "ocrs")]
    if let Some(dir) = &cli.ocrs_models {
        use keiyaku_document::{Extractor, OcrsEngine, OcrsModels};

        let engine = OcrsEngine::load(&OcrsModels::from_dir(dir))?;
        let extractor = Extractor::new(config)?.with_ocr(engine);
        return Ok(AppServices::with_extractor(extractor, timeout));
    }

    AppServices::init(config, timeout)
}
