//! Shared fixtures: a mock catalog server serving a small synset

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, RgbImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SYNSET_ID: &str = "n00007846";
pub const TARGET_ID: &str = "4242";
pub const SYNSET_OFFSET: &str = "00007846";

/// One image served by the mock catalog
pub struct Thumbnail {
    pub prefix: String,
    pub node: String,
    /// `None` makes the thumbnail endpoint answer 404
    pub body: Option<Vec<u8>>,
}

impl Thumbnail {
    pub fn jpeg(prefix: &str, width: u32, height: u32) -> Self {
        Self {
            prefix: prefix.to_string(),
            node: "5".to_string(),
            body: Some(jpeg_bytes(width, height, prefix.len() as u8)),
        }
    }

    pub fn missing(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            node: "5".to_string(),
            body: None,
        }
    }

    pub fn url_path(&self) -> String {
        let shard: String = self.prefix.chars().take(2).collect();
        format!(
            "/nodes/{}/{}/{}/{}.thumb",
            self.node, SYNSET_OFFSET, shard, self.prefix
        )
    }
}

pub fn jpeg_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([x as u8 ^ seed, y as u8, seed.wrapping_mul(31)])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

pub fn sha256(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub fn sha256_file(path: &Path) -> String {
    sha256(&std::fs::read(path).unwrap())
}

/// Mount the lookup page, both index requests and every thumbnail
pub async fn mount_synset(server: &MockServer, thumbnails: &[Thumbnail]) {
    Mock::given(method("GET"))
        .and(path("/synset"))
        .and(query_param("wnid", SYNSET_ID))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><script>\nvar x = 1;\ntarget_id = '{}';\n</script></html>",
            TARGET_ID
        )))
        .mount(server)
        .await;

    // Unknown synsets still get a page, just without an assignment.
    Mock::given(method("GET"))
        .and(path("/synset"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Not found</html>"))
        .with_priority(10)
        .mount(server)
        .await;

    let total = thumbnails.len();
    Mock::given(method("GET"))
        .and(path("/python/gp.py/ImagesXML"))
        .and(query_param("synsetid", TARGET_ID))
        .and(query_param("n", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0"?><ImageNet><imageset total="{}"></imageset></ImageNet>"#,
            total
        )))
        .expect(1)
        .mount(server)
        .await;

    let images: String = thumbnails
        .iter()
        .map(|t| {
            format!(
                r#"<image node="{}" synsetoffset="{}" prefix="{}"/>"#,
                t.node, SYNSET_OFFSET, t.prefix
            )
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/python/gp.py/ImagesXML"))
        .and(query_param("synsetid", TARGET_ID))
        .and(query_param("n", total.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0"?><ImageNet><imageset total="{}">{}</imageset></ImageNet>"#,
            total, images
        )))
        .mount(server)
        .await;

    for thumbnail in thumbnails {
        let response = match &thumbnail.body {
            Some(body) => ResponseTemplate::new(200)
                .set_body_bytes(body.clone())
                .insert_header("content-type", "image/jpeg"),
            None => ResponseTemplate::new(404),
        };
        Mock::given(method("GET"))
            .and(path(thumbnail.url_path()))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }
}
