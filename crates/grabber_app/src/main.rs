//! Sticker grabber command line.
//!
//! Scans a post or profile in a real browser window, downloads every sticker
//! it finds into `<output>/<id>_<timestamp>/stickers/`, saves the comments to
//! `comments.json` and zips the run folder. A local folder or `.zip` given in
//! place of a URL is imported into the same layout without a browser.

mod cli;
mod config;
mod prompt;
mod run;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use grabber_logging::{grab_error, grab_info, grab_warn, initialize_run_logging, RunLogSettings};
use log::LevelFilter;

use crate::cli::Args;
use crate::config::GrabberConfig;
use crate::run::{LogProgressSink, RunSummary};

/// Exit status after Ctrl-C, as shells report for SIGINT.
const INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = match GrabberConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::from(2);
        }
    };
    args.apply(&mut config);

    let log_settings = RunLogSettings {
        file: config.log_file.clone(),
        terminal_level: if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        },
        ..RunLogSettings::default()
    };
    if let Some(path) = initialize_run_logging(&log_settings) {
        grab_info!("Logging to {}", path.display());
    }

    tokio::select! {
        outcome = execute(&args, &config) => match outcome {
            Ok(summary) => {
                println!("{summary}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                grab_error!("Fatal: {:#}", err);
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            grab_warn!("Interrupted; partial output left in place");
            eprintln!("Interrupted.");
            ExitCode::from(INTERRUPTED)
        }
    }
}

async fn execute(args: &Args, config: &GrabberConfig) -> Result<RunSummary> {
    let input = match &args.input {
        Some(input) => input.clone(),
        None => tokio::task::spawn_blocking(cli::prompt_for_input)
            .await
            .context("input prompt panicked")??
            .context("no input given")?,
    };

    run::run(&input, config, &LogProgressSink)
        .await
        .with_context(|| format!("grabbing {input}"))
}
