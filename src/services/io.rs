//! Image commit service
//!
//! Turns a fetched thumbnail into a file in the output directory. Every
//! write lands in a temporary file first and is renamed into place only when
//! complete, so a failed commit never leaves a truncated artifact behind.

use crate::catalog::identifier_from_url;
use crate::config::{ResizeFilter, ScraperConfig};
use crate::download::FetchedImage;
use crate::error::ItemError;
use crate::types::TargetSize;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// Extension of every output file, regardless of encoded format
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Service persisting fetched thumbnails
#[derive(Debug, Clone)]
pub struct ImageCommitter {
    output_dir: PathBuf,
    target_size: Option<TargetSize>,
    jpeg_quality: u8,
    resize_filter: ResizeFilter,
}

impl ImageCommitter {
    /// Create a committer writing unscaled payloads into `output_dir`
    #[must_use]
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            target_size: None,
            jpeg_quality: ScraperConfig::DEFAULT_JPEG_QUALITY,
            resize_filter: ResizeFilter::default(),
        }
    }

    /// Create a committer from a run configuration
    #[must_use]
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            target_size: config.target_size,
            jpeg_quality: config.jpeg_quality,
            resize_filter: config.resize_filter,
        }
    }

    /// Rescale every image to exactly `size` before writing
    #[must_use]
    pub fn with_target_size(mut self, size: Option<TargetSize>) -> Self {
        self.target_size = size;
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output path for a response URL: `<identifier>.jpg` in the output directory
    ///
    /// # Errors
    /// [`ItemError::MissingIdentifier`] if the URL has no usable final path segment.
    pub fn output_path_for(&self, url: &reqwest::Url) -> Result<PathBuf, ItemError> {
        let identifier = identifier_from_url(url).ok_or_else(|| ItemError::MissingIdentifier {
            url: url.to_string(),
        })?;
        Ok(self
            .output_dir
            .join(format!("{}.{}", identifier, OUTPUT_EXTENSION)))
    }

    /// Validate, optionally rescale, and write one fetched image
    ///
    /// # Errors
    /// - Non-success response status
    /// - No identifier in the response URL
    /// - Decode or encode failure when rescaling
    /// - File system errors while writing
    pub fn commit(&self, image: &FetchedImage) -> Result<PathBuf, ItemError> {
        if !image.status.is_success() {
            return Err(ItemError::Status {
                status: image.status.as_u16(),
            });
        }

        let path = self.output_path_for(&image.url)?;
        if path.exists() {
            debug!(path = %path.display(), "Overwriting existing image with the same identifier");
        }

        match self.target_size {
            Some(size) => {
                let encoded = self.rescale(&image.body, size)?;
                self.write_atomically(&path, &encoded)?;
            },
            None => self.write_atomically(&path, &image.body)?,
        }

        trace!(url = %image.url, path = %path.display(), "Committed image");
        Ok(path)
    }

    /// Decode, resize to exactly `size` (aspect ratio is not preserved) and
    /// encode as JPEG
    fn rescale(&self, payload: &[u8], size: TargetSize) -> Result<Vec<u8>, ItemError> {
        let decoded = image::load_from_memory(payload).map_err(ItemError::Decode)?;
        let resized = decoded.resize_exact(size.width, size.height, self.resize_filter.into());

        // JPEG carries no alpha channel.
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut encoded = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut encoded, self.jpeg_quality);
        rgb.write_with_encoder(encoder).map_err(ItemError::Encode)?;
        Ok(encoded)
    }

    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> Result<(), ItemError> {
        let mut temp = NamedTempFile::new_in(&self.output_dir)
            .map_err(|e| ItemError::write(&self.output_dir, e))?;
        temp.write_all(bytes)
            .and_then(|()| temp.flush())
            .map_err(|e| ItemError::write(temp.path(), e))?;
        temp.persist(path)
            .map_err(|e| ItemError::write(path, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use image::{ImageFormat, RgbImage};
    use reqwest::{StatusCode, Url};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn fetched(url: &str, status: StatusCode, body: Vec<u8>) -> FetchedImage {
        FetchedImage {
            requested_url: url.to_string(),
            url: Url::parse(url).unwrap(),
            status,
            body: Bytes::from(body),
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_unscaled_payload_is_written_verbatim() {
        let dir = TempDir::new().unwrap();
        let committer = ImageCommitter::new(dir.path());
        let payload = b"not even an image, stored as-is".to_vec();

        let path = committer
            .commit(&fetched(
                "http://host/nodes/1/2/ab/abc123.thumb",
                StatusCode::OK,
                payload.clone(),
            ))
            .unwrap();

        assert_eq!(path, dir.path().join("abc123.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), payload);
        assert_eq!(dir_entries(dir.path()), ["abc123.jpg"]);
    }

    #[test]
    fn test_rescaled_output_has_exact_dimensions() {
        let dir = TempDir::new().unwrap();
        let committer =
            ImageCommitter::new(dir.path()).with_target_size(Some(TargetSize::new(32, 16)));

        let path = committer
            .commit(&fetched(
                "http://host/nodes/1/2/xy/xyz.thumb",
                StatusCode::OK,
                png_bytes(50, 80),
            ))
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn test_non_success_status_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let committer = ImageCommitter::new(dir.path());

        let err = committer
            .commit(&fetched(
                "http://host/nodes/1/2/ab/gone.thumb",
                StatusCode::NOT_FOUND,
                b"missing".to_vec(),
            ))
            .unwrap_err();

        assert!(matches!(err, ItemError::Status { status: 404 }));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_decode_failure_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let committer =
            ImageCommitter::new(dir.path()).with_target_size(Some(TargetSize::new(8, 8)));

        let err = committer
            .commit(&fetched(
                "http://host/nodes/1/2/ba/bad.thumb",
                StatusCode::OK,
                b"\xFF\xD8\xFF garbage".to_vec(),
            ))
            .unwrap_err();

        assert!(matches!(err, ItemError::Decode(_)));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_identifier_is_an_item_error() {
        let dir = TempDir::new().unwrap();
        let committer = ImageCommitter::new(dir.path());

        let err = committer
            .commit(&fetched("http://host/nodes/", StatusCode::OK, vec![1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, ItemError::MissingIdentifier { .. }));
    }

    #[test]
    fn test_identifier_collision_last_writer_wins() {
        let dir = TempDir::new().unwrap();
        let committer = ImageCommitter::new(dir.path());
        let url = "http://host/nodes/1/2/du/dup.thumb";

        committer
            .commit(&fetched(url, StatusCode::OK, b"first".to_vec()))
            .unwrap();
        let path = committer
            .commit(&fetched(url, StatusCode::OK, b"second".to_vec()))
            .unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
        assert_eq!(dir_entries(dir.path()), ["dup.jpg"]);
    }

    #[test]
    fn test_missing_output_dir_is_a_write_error() {
        let dir = TempDir::new().unwrap();
        let committer = ImageCommitter::new(dir.path().join("absent"));

        let err = committer
            .commit(&fetched("http://host/a/b.thumb", StatusCode::OK, vec![0]))
            .unwrap_err();
        assert!(matches!(err, ItemError::Write { .. }));
    }
}
