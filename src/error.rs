//! Error types for synset scraping operations
//!
//! Two severities exist. [`ScraperError`] covers setup failures that abort the
//! run; [`ItemError`] covers a single image that could not be fetched or saved
//! and is reported without stopping the remaining downloads.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scraper setup operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Fatal setup failures. The `Display` text is the user-facing message and
/// the error source carries the underlying cause.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// The output directory could not be created
    #[error("Failed to create output directory: {}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The synset id could not be resolved to a catalog target id
    #[error("Failed to retrieve synset target id, are you sure a synset with id {synset_id} exists?")]
    Resolution {
        synset_id: String,
        #[source]
        source: ResolutionFailure,
    },

    /// The initial `count=0` query failed
    #[error("Failed to retrieve image count, is there a connection issue?")]
    CountQuery {
        #[source]
        source: CatalogFailure,
    },

    /// The full image index could not be retrieved
    #[error("Failed to retrieve synset index, is there a connection issue?")]
    Index {
        #[source]
        source: CatalogFailure,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

impl ScraperError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create output directory error with path context
    pub fn output_dir<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::OutputDir {
            path: path.into(),
            source,
        }
    }

    /// Short stage name used in structured log fields
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::OutputDir { .. } => "output_dir",
            Self::Resolution { .. } => "resolution",
            Self::CountQuery { .. } => "count_query",
            Self::Index { .. } => "index",
            Self::InvalidConfig(_) => "config",
            Self::HttpClient(_) => "http_client",
        }
    }
}

/// Cause of a failed synset lookup page request
#[derive(Error, Debug)]
pub enum ResolutionFailure {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Could not find target id in: {url}")]
    TargetIdNotFound { url: String },
}

/// Cause of a failed image index request
#[derive(Error, Debug)]
pub enum CatalogFailure {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed index document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Index document has no imageset element")]
    MissingImageset,

    #[error("Element <{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Attribute '{attribute}' is not a number: {value}")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
    },
}

impl From<quick_xml::events::attributes::AttrError> for CatalogFailure {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(quick_xml::Error::InvalidAttr(err))
    }
}

/// Per-image failures. These are reported and the image is skipped.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Cannot derive an image identifier from {url}")]
    MissingIdentifier { url: String },

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Commit task failed: {0}")]
    Worker(String),
}

impl ItemError {
    /// Create file write error with path context
    pub fn write<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
