//! Parsing of the catalog's lookup page and image index document

use crate::error::CatalogFailure;
use crate::types::ImageRecord;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::OnceLock;

/// Parsed `<imageset>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    /// Value of the `total` attribute
    pub total: u64,
    /// Every `<image>` element nested in the imageset
    pub images: Vec<ImageRecord>,
}

fn target_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^target_id = '([0-9]+)';$").expect("target id pattern is valid")
    })
}

/// Extract the numeric `target_id = '<digits>';` assignment from the lookup page
#[must_use]
pub fn parse_target_id(body: &str) -> Option<u64> {
    target_id_pattern()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse the index document
///
/// The first `imageset` element supplies `total`; `image` elements are
/// collected only while inside it.
///
/// # Errors
/// Malformed XML, a missing `imageset`, or missing/non-numeric attributes.
pub fn parse_imageset(xml: &str) -> Result<ImageSet, CatalogFailure> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut total = None;
    let mut images = Vec::new();
    let mut depth_in_set = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth_in_set > 0 {
                    depth_in_set += 1;
                    if e.name().as_ref() == b"image" {
                        images.push(image_record(&e)?);
                    }
                } else if total.is_none() && e.name().as_ref() == b"imageset" {
                    total = Some(imageset_total(&e)?);
                    depth_in_set = 1;
                }
            },
            Event::Empty(e) => {
                if depth_in_set > 0 {
                    if e.name().as_ref() == b"image" {
                        images.push(image_record(&e)?);
                    }
                } else if total.is_none() && e.name().as_ref() == b"imageset" {
                    total = Some(imageset_total(&e)?);
                }
            },
            Event::End(_) => {
                depth_in_set = depth_in_set.saturating_sub(1);
            },
            Event::Eof => break,
            _ => {},
        }
    }

    let total = total.ok_or(CatalogFailure::MissingImageset)?;
    Ok(ImageSet { total, images })
}

fn attribute(
    element: &BytesStart<'_>,
    element_name: &'static str,
    name: &'static str,
) -> Result<String, CatalogFailure> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(attr.unescape_value()?.into_owned());
        }
    }
    Err(CatalogFailure::MissingAttribute {
        element: element_name,
        attribute: name,
    })
}

fn imageset_total(element: &BytesStart<'_>) -> Result<u64, CatalogFailure> {
    let value = attribute(element, "imageset", "total")?;
    value
        .trim()
        .parse()
        .map_err(|_| CatalogFailure::InvalidNumber {
            attribute: "total",
            value,
        })
}

fn image_record(element: &BytesStart<'_>) -> Result<ImageRecord, CatalogFailure> {
    Ok(ImageRecord {
        node: attribute(element, "image", "node")?,
        synset_offset: attribute(element, "image", "synsetoffset")?,
        prefix: attribute(element, "image", "prefix")?,
    })
}
