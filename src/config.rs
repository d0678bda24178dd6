//! Configuration types for synset scraping runs

use crate::error::{Result, ScraperError};
use crate::types::{CatalogTargetId, ImageRecord, SynsetId, TargetSize};
use image::imageops::FilterType;
use std::path::PathBuf;
use std::time::Duration;

/// Synset lookup page, embeds `target_id = '<id>';`
pub const DEFAULT_SYNSET_PAGE_URL: &str = "http://image-net.org/synset?wnid={wnid}";

/// Image index document for a target id
pub const DEFAULT_SYNSET_INDEX_URL: &str =
    "http://image-net.org/python/gp.py/ImagesXML?type=synsetgood&synsetid={target_id}&start=0&n={count}";

/// Per-image thumbnail
pub const DEFAULT_THUMBNAIL_URL: &str = "http://image-net.org/nodes/{node}/{offset}/{shard}/{prefix}.thumb";

/// Remote catalog URL templates
///
/// Templates use named placeholders which are substituted verbatim:
/// `{wnid}` for the synset page, `{target_id}` and `{count}` for the index,
/// and `{node}`, `{offset}`, `{shard}`, `{prefix}` for thumbnails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoints {
    pub synset_page: String,
    pub synset_index: String,
    pub thumbnail: String,
}

impl Default for CatalogEndpoints {
    fn default() -> Self {
        Self {
            synset_page: DEFAULT_SYNSET_PAGE_URL.to_string(),
            synset_index: DEFAULT_SYNSET_INDEX_URL.to_string(),
            thumbnail: DEFAULT_THUMBNAIL_URL.to_string(),
        }
    }
}

impl CatalogEndpoints {
    const DEFAULT_ORIGIN: &'static str = "http://image-net.org";

    /// Same endpoint paths served from a different origin (mirror or mock server)
    ///
    /// # Examples
    /// ```rust
    /// use imagenet_scraper::CatalogEndpoints;
    ///
    /// let endpoints = CatalogEndpoints::with_base_url("http://127.0.0.1:8080/");
    /// assert!(endpoints.synset_page.starts_with("http://127.0.0.1:8080/synset?"));
    /// ```
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let rebase = |template: &str| template.replacen(Self::DEFAULT_ORIGIN, base, 1);

        Self {
            synset_page: rebase(DEFAULT_SYNSET_PAGE_URL),
            synset_index: rebase(DEFAULT_SYNSET_INDEX_URL),
            thumbnail: rebase(DEFAULT_THUMBNAIL_URL),
        }
    }

    /// Lookup page URL for a synset
    #[must_use]
    pub fn synset_page_url(&self, synset_id: &SynsetId) -> String {
        self.synset_page.replace("{wnid}", synset_id.as_str())
    }

    /// Index URL requesting `count` images starting at zero
    #[must_use]
    pub fn index_url(&self, target_id: CatalogTargetId, count: u64) -> String {
        self.synset_index
            .replace("{target_id}", &target_id.to_string())
            .replace("{count}", &count.to_string())
    }

    /// Thumbnail URL for an index record
    #[must_use]
    pub fn thumbnail_url(&self, record: &ImageRecord, shard: &str) -> String {
        self.thumbnail
            .replace("{node}", &record.node)
            .replace("{offset}", &record.synset_offset)
            .replace("{shard}", shard)
            .replace("{prefix}", &record.prefix)
    }
}

/// Resampling filter used when rescaling thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    /// Bicubic resampling
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Configuration for a single scraping run
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    /// Synset to download
    pub synset_id: SynsetId,

    /// Directory receiving `<prefix>.jpg` files, created if absent
    pub output_dir: PathBuf,

    /// Maximum number of thumbnail requests in flight
    pub concurrency: usize,

    /// Exact rescale dimensions, `None` keeps the downloaded bytes verbatim
    pub target_size: Option<TargetSize>,

    /// JPEG quality for rescaled output (1-100)
    pub jpeg_quality: u8,

    /// Resampling filter for rescaled output
    pub resize_filter: ResizeFilter,

    /// Per-request timeout for catalog and thumbnail requests
    pub request_timeout: Duration,

    /// Remote catalog URL templates
    pub endpoints: CatalogEndpoints,

    /// Suppress progress and completion output on stdout
    pub quiet: bool,
}

impl ScraperConfig {
    pub const DEFAULT_CONCURRENCY: usize = 8;
    pub const DEFAULT_JPEG_QUALITY: u8 = 75;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new configuration builder for the given synset
    ///
    /// # Examples
    /// ```rust
    /// use imagenet_scraper::{ScraperConfig, TargetSize};
    ///
    /// let config = ScraperConfig::builder("n00007846".parse().unwrap())
    ///     .output_dir("thumbs")
    ///     .concurrency(16)
    ///     .target_size(Some(TargetSize::new(256, 256)))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.concurrency, 16);
    /// ```
    #[must_use]
    pub fn builder(synset_id: SynsetId) -> ScraperConfigBuilder {
        ScraperConfigBuilder {
            config: Self {
                synset_id,
                output_dir: PathBuf::from("."),
                concurrency: Self::DEFAULT_CONCURRENCY,
                target_size: None,
                jpeg_quality: Self::DEFAULT_JPEG_QUALITY,
                resize_filter: ResizeFilter::default(),
                request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
                endpoints: CatalogEndpoints::default(),
                quiet: false,
            },
        }
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Concurrency of zero
    /// - JPEG quality outside 1-100
    /// - Zero request timeout
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ScraperError::config_value_error(
                "concurrency",
                self.concurrency,
                ">= 1",
                Some(Self::DEFAULT_CONCURRENCY),
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ScraperError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "1-100",
                Some(Self::DEFAULT_JPEG_QUALITY),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ScraperError::invalid_config(
                "request timeout must be greater than zero",
            ));
        }

        if let Some(size) = self.target_size {
            if size.width == 0 || size.height == 0 {
                return Err(ScraperError::invalid_config(format!(
                    "target size must be at least 1x1, got {}",
                    size
                )));
            }
        }

        Ok(())
    }
}

/// Builder for `ScraperConfig`
#[derive(Debug)]
pub struct ScraperConfigBuilder {
    config: ScraperConfig,
}

impl ScraperConfigBuilder {
    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn target_size(mut self, size: Option<TargetSize>) -> Self {
        self.config.target_size = size;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    #[must_use]
    pub fn resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.config.resize_filter = filter;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn endpoints(mut self, endpoints: CatalogEndpoints) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.config.quiet = quiet;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// Any rule checked by [`ScraperConfig::validate`].
    pub fn build(self) -> Result<ScraperConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
