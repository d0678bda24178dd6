//! Remote catalog client
//!
//! Performs the sequential setup lookups of a run: resolving the public
//! synset id to the catalog's target id, probing the image count and then
//! retrieving the complete image index. Every failure here is fatal.

pub mod urls;
pub mod xml;

use crate::config::CatalogEndpoints;
use crate::error::{CatalogFailure, Result, ResolutionFailure, ScraperError};
use crate::types::{CatalogTargetId, ImageRecord, SynsetId};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

pub use urls::{derive_identifier, derive_thumb_url, identifier_from_url};
pub use xml::{parse_imageset, parse_target_id, ImageSet};

/// Client for the catalog's lookup and index endpoints
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    endpoints: CatalogEndpoints,
}

impl CatalogClient {
    /// Create a catalog client with its own HTTP connection pool
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(endpoints: CatalogEndpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ScraperError::HttpClient)?;

        Ok(Self { client, endpoints })
    }

    #[must_use]
    pub fn endpoints(&self) -> &CatalogEndpoints {
        &self.endpoints
    }

    /// Resolve a public synset id to the catalog's numeric target id
    ///
    /// # Errors
    /// [`ScraperError::Resolution`] on transport failure, non-success status,
    /// or a lookup page without a `target_id` assignment.
    pub async fn resolve_target_id(&self, synset_id: &SynsetId) -> Result<CatalogTargetId> {
        let url = self.endpoints.synset_page_url(synset_id);
        debug!(url = %url, "Resolving synset target id");

        self.fetch_target_id(&url)
            .await
            .map(CatalogTargetId)
            .map_err(|source| ScraperError::Resolution {
                synset_id: synset_id.to_string(),
                source,
            })
    }

    async fn fetch_target_id(&self, url: &str) -> std::result::Result<u64, ResolutionFailure> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionFailure::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        parse_target_id(&body).ok_or(ResolutionFailure::TargetIdNotFound { url: final_url })
    }

    /// Query the index with `count=0` to learn the synset's total image count
    ///
    /// The index endpoint has no "all" sentinel, so the total must be read
    /// from this query and supplied explicitly to [`Self::fetch_index`].
    ///
    /// # Errors
    /// [`ScraperError::CountQuery`] on transport, status or document failures.
    pub async fn query_total(&self, target_id: CatalogTargetId) -> Result<u64> {
        let set = self
            .fetch_imageset(target_id, 0)
            .await
            .map_err(|source| ScraperError::CountQuery { source })?;

        info!(target_id = %target_id, total = set.total, "Queried synset image count");
        Ok(set.total)
    }

    /// Retrieve `count` index records for a target id
    ///
    /// # Errors
    /// [`ScraperError::Index`] on transport, status or document failures.
    pub async fn fetch_index(
        &self,
        target_id: CatalogTargetId,
        count: u64,
    ) -> Result<Vec<ImageRecord>> {
        let set = self
            .fetch_imageset(target_id, count)
            .await
            .map_err(|source| ScraperError::Index { source })?;

        info!(
            target_id = %target_id,
            requested = count,
            received = set.images.len(),
            "Retrieved synset index"
        );
        Ok(set.images)
    }

    async fn fetch_imageset(
        &self,
        target_id: CatalogTargetId,
        count: u64,
    ) -> std::result::Result<ImageSet, CatalogFailure> {
        let url = self.endpoints.index_url(target_id, count);
        debug!(url = %url, "Requesting image index");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogFailure::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_imageset(&body)
    }
}
