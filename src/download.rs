//! Bounded-concurrency thumbnail fetching
//!
//! A fixed pool of tokio worker tasks pulls URLs from a shared queue and
//! pushes one [`FetchResult`] per URL into a bounded channel. The consumer
//! drains the channel through [`FetchStream`], which yields results in
//! completion order. Each worker owns at most one request at a time, so the
//! number of outstanding requests never exceeds the pool size.

use crate::error::{ItemError, Result, ScraperError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::{Client, StatusCode, Url};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A completed thumbnail response
///
/// Status validation is deferred to the committer; the fetcher only
/// reports transport-level failures.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// URL the request was issued for
    pub requested_url: String,
    /// Final URL of the response, after redirects
    pub url: Url,
    /// Response status
    pub status: StatusCode,
    /// Response body
    pub body: Bytes,
}

/// Outcome of one download attempt
#[derive(Debug)]
pub enum FetchResult {
    /// A response arrived, whatever its status
    Fetched(FetchedImage),
    /// The request failed before a response body was received
    Failed { url: String, error: ItemError },
}

impl FetchResult {
    /// URL this result originated from
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Fetched(image) => &image.requested_url,
            Self::Failed { url, .. } => url,
        }
    }
}

/// Source of thumbnail payloads
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Perform a single GET. Must not panic on network errors.
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// Production fetcher backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with an explicit per-request timeout
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(timeout: Duration, max_idle_per_host: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(max_idle_per_host)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ScraperError::HttpClient)?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> std::result::Result<FetchedImage, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().clone();
        let body = response.bytes().await?;

        Ok(FetchedImage {
            requested_url: url.to_string(),
            url: final_url,
            status,
            body,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        match self.get(url).await {
            Ok(image) => {
                trace!(url = %url, status = %image.status, bytes = image.body.len(), "Fetched thumbnail");
                FetchResult::Fetched(image)
            },
            Err(e) => FetchResult::Failed {
                url: url.to_string(),
                error: ItemError::Transport(e),
            },
        }
    }
}

/// Issues downloads through a fixed-size worker pool
pub struct FetchScheduler<F: ?Sized> {
    fetcher: Arc<F>,
    concurrency: usize,
}

impl<F: ImageFetcher + ?Sized + 'static> FetchScheduler<F> {
    /// Create a scheduler; a concurrency of zero is treated as one
    pub fn new(fetcher: Arc<F>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Start fetching `urls` and return the stream of results
    ///
    /// Spawns `min(concurrency, urls.len())` workers immediately; each pulls
    /// the next URL as soon as its previous request completes. Must be called
    /// from within a tokio runtime.
    pub fn schedule<I>(&self, urls: I) -> FetchStream
    where
        I: IntoIterator<Item = String>,
    {
        let queue: VecDeque<String> = urls.into_iter().collect();
        let expected = queue.len();
        let worker_count = self.concurrency.min(expected);
        let queue = Arc::new(Mutex::new(queue));
        // Capacity follows the spawned workers, never the requested limit,
        // which may be far beyond what a channel can hold.
        let (tx, rx) = mpsc::channel(worker_count.max(1));

        debug!(urls = expected, workers = worker_count, "Starting fetch workers");

        let workers = (0..worker_count)
            .map(|worker_id| {
                let fetcher = Arc::clone(&self.fetcher);
                let queue = Arc::clone(&queue);
                let tx = tx.clone();
                tokio::spawn(worker_loop(worker_id, fetcher, queue, tx))
            })
            .collect();

        // Only workers hold senders, so the stream ends once the last one exits.
        drop(tx);

        FetchStream {
            results: rx,
            workers,
            expected,
        }
    }
}

async fn worker_loop<F: ImageFetcher + ?Sized>(
    worker_id: usize,
    fetcher: Arc<F>,
    queue: Arc<Mutex<VecDeque<String>>>,
    results: mpsc::Sender<FetchResult>,
) {
    loop {
        let next = queue.lock().await.pop_front();
        let Some(url) = next else {
            break;
        };

        let result = fetcher.fetch(&url).await;
        if results.send(result).await.is_err() {
            // Consumer is gone; abandon the remaining queue.
            break;
        }
    }
    trace!(worker_id, "Fetch worker finished");
}

/// Results of a scheduled batch, in completion order
///
/// Dropping the stream aborts any workers that are still running.
pub struct FetchStream {
    results: mpsc::Receiver<FetchResult>,
    workers: Vec<JoinHandle<()>>,
    expected: usize,
}

impl FetchStream {
    /// Number of results the stream will yield when fully drained
    #[must_use]
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of worker tasks spawned for this batch
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Stream for FetchStream {
    type Item = FetchResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().results.poll_recv(cx)
    }
}

impl Drop for FetchStream {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}
