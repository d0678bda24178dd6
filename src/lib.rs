#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! # ImageNet Synset Scraper
//!
//! Bulk-downloads every thumbnail of an ImageNet synset into a local
//! directory, optionally rescaling each image to an exact size.
//!
//! A run resolves the public synset id (for example `n00007846`) to the
//! catalog's numeric target id, queries the image count, retrieves the full
//! image index and then fetches all thumbnails through a fixed-size pool of
//! workers. Failures during setup abort the run; a failure on an individual
//! image is reported on stderr and the run continues.
//!
//! ## Features
//!
//! - **Bounded concurrency**: at most `concurrency` thumbnail requests in flight
//! - **Exact rescaling**: optional resize to `WIDTH,HEIGHT`, written as JPEG
//! - **Atomic writes**: files appear under their final name only when complete
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imagenet_scraper::{scrape_synset, ScraperConfig, TargetSize};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ScraperConfig::builder("n00007846".parse().map_err(anyhow::Error::msg)?)
//!     .output_dir("thumbs")
//!     .concurrency(16)
//!     .target_size(Some(TargetSize::new(256, 256)))
//!     .build()?;
//!
//! let summary = scrape_synset(config).await?;
//! println!("saved {} of {} images", summary.saved, summary.total);
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface, progress bar and tracing subscriber
//! - `tracing-json`: JSON structured log output for the CLI
//!
//! To use only as a library without CLI dependencies:
//!
//! ```toml
//! [dependencies]
//! imagenet-scraper = { version = "0.2", default-features = false }
//! ```

pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod processor;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Public API exports
pub use catalog::CatalogClient;
pub use config::{CatalogEndpoints, ResizeFilter, ScraperConfig, ScraperConfigBuilder};
pub use download::{FetchResult, FetchScheduler, FetchStream, FetchedImage, HttpFetcher, ImageFetcher};
pub use error::{CatalogFailure, ItemError, ResolutionFailure, Result, ScraperError};
pub use processor::SynsetScraper;
pub use services::{
    ConsoleProgressReporter, ImageCommitter, NoOpProgressReporter, ProgressReporter, RunReporter,
    RunStage, RunSummary,
};
pub use types::{CatalogTargetId, ImageRecord, SynsetId, TargetSize};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Scrape a synset with console reporting
///
/// Progress goes to stdout unless `config.quiet` is set; per-image failures
/// are always written to stderr. Use [`SynsetScraper`] with a custom
/// [`RunReporter`] to control where output goes.
///
/// # Errors
/// Fatal setup failures, see [`SynsetScraper::run`].
pub async fn scrape_synset(config: ScraperConfig) -> Result<RunSummary> {
    let reporter = RunReporter::for_config(&config);
    SynsetScraper::new(config)?.run(&reporter).await
}
