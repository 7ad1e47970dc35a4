//! srt-translate - translate SubRip subtitle files with DeepL
//!
//! Entry point: parses the command line, sets up logging, resolves the
//! configuration and API key, then runs the translation workflow.

use std::path::Path;
use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use srt_translate::cli::Args;
use srt_translate::config::{resolve_api_key, Config, DEFAULT_CONFIG_FILE};
use srt_translate::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting srt-translate {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    // Command line flags take precedence over the file
    if let Some(targets) = args.target_languages() {
        config.translate.target_languages = targets;
    }
    if let Some(source) = &args.source_lang {
        config.translate.source_language = source.clone();
    }
    if args.skip_quota_check {
        config.translate.check_quota = false;
    }

    let api_key = resolve_api_key(args.keyfile.as_deref(), &config.deepl.api_key_env)?;

    let workflow = Workflow::new(config);
    let written = workflow
        .translate_subtitles(&args.subfile, args.output.as_deref(), &api_key)
        .await?;

    for path in written {
        println!("Wrote {}", path.display());
    }

    info!("srt-translate completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".srt-translate").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "srt-translate.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("srt-translate.log").display()
    );

    Ok(())
}
