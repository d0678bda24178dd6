//! Mapping between index records, thumbnail URLs and image identifiers

use crate::config::CatalogEndpoints;
use crate::types::ImageRecord;
use reqwest::Url;
use std::path::Path;

/// Number of leading prefix characters used as the shard directory
const SHARD_LEN: usize = 2;

/// Thumbnail URL for a record: node, offset, prefix shard, then the prefix itself
#[must_use]
pub fn derive_thumb_url(record: &ImageRecord, endpoints: &CatalogEndpoints) -> String {
    let shard: String = record.prefix.chars().take(SHARD_LEN).collect();
    endpoints.thumbnail_url(record, &shard)
}

/// Stable content identifier of a record (its raw prefix)
#[must_use]
pub fn derive_identifier(record: &ImageRecord) -> &str {
    &record.prefix
}

/// Recover the identifier from a thumbnail URL: last path segment without extension
///
/// Returns `None` when the path has no usable final segment.
#[must_use]
pub fn identifier_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let stem = Path::new(segment).file_stem()?.to_str()?;
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
