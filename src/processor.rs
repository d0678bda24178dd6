//! Synset scraping processor
//!
//! [`SynsetScraper`] drives one complete run: the sequential catalog setup
//! (resolve, count, index), the bounded-concurrency download phase and the
//! per-item commits. Setup failures abort the run; per-item failures are
//! reported and skipped.

use crate::catalog::{derive_thumb_url, CatalogClient};
use crate::config::ScraperConfig;
use crate::download::{FetchResult, FetchScheduler, FetchedImage, HttpFetcher, ImageFetcher};
use crate::error::{ItemError, Result, ScraperError};
use crate::services::{ImageCommitter, RunReporter, RunStage, RunSummary};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, span, warn, Instrument, Level};

/// Orchestrates a scraping run for one synset
pub struct SynsetScraper {
    config: ScraperConfig,
    catalog: CatalogClient,
    fetcher: Arc<dyn ImageFetcher>,
    committer: Arc<ImageCommitter>,
}

impl SynsetScraper {
    /// Create a scraper using HTTP for both catalog lookups and thumbnails
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create HTTP clients
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.request_timeout, config.concurrency)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Create a scraper with a custom thumbnail fetcher
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create the catalog HTTP client
    pub fn with_fetcher(config: ScraperConfig, fetcher: Arc<dyn ImageFetcher>) -> Result<Self> {
        config.validate()?;
        let catalog = CatalogClient::new(config.endpoints.clone(), config.request_timeout)?;
        let committer = Arc::new(ImageCommitter::from_config(&config));

        Ok(Self {
            config,
            catalog,
            fetcher,
            committer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Run the complete scrape
    ///
    /// Returns once every scheduled URL has produced exactly one outcome.
    ///
    /// # Errors
    /// Fatal setup failures only: output directory creation, target id
    /// resolution, count query or index retrieval. Individual image failures
    /// are reported through `reporter` and counted in the summary.
    #[instrument(
        skip(self, reporter),
        fields(
            synset = %self.config.synset_id,
            concurrency = self.config.concurrency,
            output_dir = %self.config.output_dir.display()
        )
    )]
    pub async fn run(&self, reporter: &RunReporter) -> Result<RunSummary> {
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| ScraperError::output_dir(&self.config.output_dir, e))?;

        reporter.stage(&RunStage::ResolvingTarget);
        let target_id = self.catalog.resolve_target_id(&self.config.synset_id).await?;
        info!(target_id = %target_id, "Resolved synset target id");

        reporter.stage(&RunStage::QueryingCount);
        let total = self.catalog.query_total(target_id).await?;

        reporter.stage(&RunStage::RetrievingIndex);
        let records = self.catalog.fetch_index(target_id, total).await?;
        if records.len() as u64 != total {
            warn!(
                expected = total,
                received = records.len(),
                "Index size differs from reported image count"
            );
        }

        let urls: Vec<String> = records
            .iter()
            .map(|record| derive_thumb_url(record, self.catalog.endpoints()))
            .collect();

        reporter.stage(&RunStage::Downloading {
            total: urls.len() as u64,
            size: self.config.target_size,
        });

        let download_span = span!(Level::INFO, "download", images = urls.len());
        self.download_all(urls, reporter)
            .instrument(download_span)
            .await;

        let summary = reporter.finish();
        info!(
            saved = summary.saved,
            failed = summary.failed,
            elapsed_ms = summary.elapsed_ms,
            "Run complete"
        );
        Ok(summary)
    }

    async fn download_all(&self, urls: Vec<String>, reporter: &RunReporter) {
        let scheduler = FetchScheduler::new(Arc::clone(&self.fetcher), self.config.concurrency);
        let mut results = scheduler.schedule(urls);

        while let Some(result) = results.next().await {
            match result {
                FetchResult::Fetched(image) => {
                    let url = image.requested_url.clone();
                    match self.commit(image).await {
                        Ok(path) => reporter.item_saved(&path),
                        Err(error) => reporter.item_failed(&url, &error),
                    }
                },
                FetchResult::Failed { url, error } => reporter.item_failed(&url, &error),
            }
        }
        debug!("All fetch results consumed");
    }

    /// Commit on the blocking pool; decoding and resizing are CPU-bound
    async fn commit(&self, image: FetchedImage) -> std::result::Result<PathBuf, ItemError> {
        let committer = Arc::clone(&self.committer);
        tokio::task::spawn_blocking(move || committer.commit(&image))
            .await
            .map_err(|e| ItemError::Worker(e.to_string()))?
    }
}
