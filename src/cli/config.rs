//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{CatalogEndpoints, ScraperConfig};
use anyhow::{Context, Result};
use std::time::Duration;

/// Convert CLI arguments to a `ScraperConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `ScraperConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<ScraperConfig> {
        let endpoints = match &cli.catalog_url {
            Some(base) if !base.trim().is_empty() => CatalogEndpoints::with_base_url(base),
            _ => CatalogEndpoints::default(),
        };

        ScraperConfig::builder(cli.synset_id.clone())
            .output_dir(&cli.output_dir)
            .concurrency(usize::try_from(cli.concurrency).unwrap_or(usize::MAX))
            .target_size(cli.size)
            .jpeg_quality(cli.jpeg_quality)
            .request_timeout(Duration::from_secs(cli.timeout))
            .endpoints(endpoints)
            .quiet(cli.quiet)
            .build()
            .context("Invalid configuration")
    }
}
