//! ImageNet synset thumbnail scraper CLI
//!
//! Parses arguments, installs the tracing subscriber and drives a single
//! [`SynsetScraper`] run, mapping its outcome to a process exit code.

use super::config::CliConfigBuilder;
use crate::{
    config::ScraperConfig,
    processor::SynsetScraper,
    services::{RunReporter, RunSummary},
    tracing_config::{init_cli_tracing, spans},
    types::{SynsetId, TargetSize},
};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Instrument};

/// Exit code for fatal setup failures. Argument errors exit with clap's code 2.
pub const EXIT_FATAL: u8 = 1;

/// Bulk-download thumbnail images from an ImageNet synset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imagenet-scraper")]
pub struct Cli {
    /// Synset id to download, e.g. n00007846
    #[arg(value_name = "SYNSET_ID")]
    pub synset_id: SynsetId,

    /// Directory to save images into, created if it does not exist
    #[arg(value_name = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of concurrent downloads
    #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: u64,

    /// If specified, images will be rescaled to WIDTH,HEIGHT
    #[arg(short, long, value_name = "WIDTH,HEIGHT")]
    pub size: Option<TargetSize>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose logging on stderr (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JPEG quality for rescaled images (1-100)
    #[arg(long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Serve catalog requests from another origin
    #[arg(long, env = "IMAGENET_SCRAPER_CATALOG_URL", hide = true)]
    pub catalog_url: Option<String>,
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    let session_id = uuid::Uuid::new_v4().to_string();

    if let Err(e) = init_cli_tracing(cli.verbose, &session_id) {
        eprintln!("Failed to initialize tracing: {:#}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    let config = match CliConfigBuilder::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(EXIT_FATAL);
        },
    };

    let reporter = RunReporter::for_config(&config);
    let session = spans::session(&session_id, config.synset_id.as_str());

    match run(config, &reporter).instrument(session).await {
        Ok(summary) => {
            debug!(
                saved = summary.saved,
                failed = summary.failed,
                "Exiting successfully"
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            reporter.fatal(&e);
            ExitCode::from(EXIT_FATAL)
        },
    }
}

async fn run(config: ScraperConfig, reporter: &RunReporter) -> crate::error::Result<RunSummary> {
    debug!(
        output_dir = %config.output_dir.display(),
        concurrency = config.concurrency,
        size = ?config.target_size,
        quiet = config.quiet,
        "Starting scrape"
    );

    SynsetScraper::new(config)?.run(reporter).await
}

/// Parse arguments from an explicit iterator, for tests and embedding
///
/// # Errors
/// Returns clap's error for invalid arguments.
pub fn parse_args<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).context("Invalid command-line arguments")
}
