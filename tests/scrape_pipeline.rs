//! End-to-end scraping runs against a mock catalog server

mod common;

use common::{
    mount_synset, sha256, sha256_file, Thumbnail, SYNSET_ID, SYNSET_OFFSET, TARGET_ID,
};
use imagenet_scraper::{
    CatalogEndpoints, NoOpProgressReporter, ResolutionFailure, RunReporter, ScraperConfig,
    ScraperError, SynsetScraper, TargetSize,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn quiet_reporter() -> (RunReporter, Capture) {
    let diagnostics = Capture::default();
    let reporter = RunReporter::with_diagnostics(
        Box::new(NoOpProgressReporter),
        Box::new(diagnostics.clone()),
    );
    (reporter, diagnostics)
}

fn config(server: &MockServer, output_dir: &Path, synset: &str) -> ScraperConfig {
    ScraperConfig::builder(synset.parse().unwrap())
        .output_dir(output_dir)
        .concurrency(3)
        .endpoints(CatalogEndpoints::with_base_url(&server.uri()))
        .quiet(true)
        .build()
        .unwrap()
}

fn jpg_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_unscaled_images_match_served_bytes() {
    let server = MockServer::start().await;
    let thumbnails = vec![
        Thumbnail::jpeg("a1b2c3", 40, 30),
        Thumbnail::jpeg("d4e5f6", 25, 60),
        Thumbnail::jpeg("0789ab", 64, 64),
        Thumbnail::jpeg("cdef01", 10, 12),
    ];
    mount_synset(&server, &thumbnails).await;

    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("nested").join("out");
    let scraper = SynsetScraper::new(config(&server, &output_dir, SYNSET_ID)).unwrap();
    let (reporter, diagnostics) = quiet_reporter();

    let summary = scraper.run(&reporter).await.unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.saved, 4);
    assert_eq!(summary.failed, 0);
    assert!(diagnostics.text().is_empty());

    let expected: HashMap<String, String> = thumbnails
        .iter()
        .map(|t| {
            (
                format!("{}.jpg", t.prefix),
                sha256(t.body.as_deref().unwrap()),
            )
        })
        .collect();
    let files = jpg_files(&output_dir);
    assert_eq!(files.len(), expected.len());
    for name in files {
        assert_eq!(sha256_file(&output_dir.join(&name)), expected[&name], "{}", name);
    }

    server.verify().await;
}

#[tokio::test]
async fn test_scaled_images_have_exact_size() {
    let server = MockServer::start().await;
    let thumbnails = vec![
        Thumbnail::jpeg("aa0001", 80, 40),
        Thumbnail::jpeg("bb0002", 33, 77),
    ];
    mount_synset(&server, &thumbnails).await;

    let dir = TempDir::new().unwrap();
    let mut config = config(&server, dir.path(), SYNSET_ID);
    config.target_size = Some(TargetSize::new(256, 256));
    let scraper = SynsetScraper::new(config).unwrap();
    let (reporter, _) = quiet_reporter();

    let summary = scraper.run(&reporter).await.unwrap();
    assert_eq!(summary.saved, 2);

    for name in jpg_files(dir.path()) {
        let img = image::open(dir.path().join(&name)).unwrap();
        assert_eq!((img.width(), img.height()), (256, 256), "{}", name);
    }
}

#[tokio::test]
async fn test_missing_thumbnail_is_skipped() {
    let server = MockServer::start().await;
    let thumbnails = vec![
        Thumbnail::jpeg("ok0001", 16, 16),
        Thumbnail::missing("gone02"),
        Thumbnail::jpeg("ok0003", 16, 16),
    ];
    mount_synset(&server, &thumbnails).await;

    let dir = TempDir::new().unwrap();
    let scraper = SynsetScraper::new(config(&server, dir.path(), SYNSET_ID)).unwrap();
    let (reporter, diagnostics) = quiet_reporter();

    let summary = scraper.run(&reporter).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.saved, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(jpg_files(dir.path()), ["ok0001.jpg", "ok0003.jpg"]);

    let text = diagnostics.text();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Failed to save image: "));
    assert!(lines[0].ends_with("/gone02.thumb"));
    assert_eq!(lines[1], "(HTTP status 404)");
}

#[tokio::test]
async fn test_nonexistent_synset_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/synset"))
        .and(query_param("wnid", "n11111111"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Not found</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let scraper = SynsetScraper::new(config(&server, dir.path(), "n11111111")).unwrap();
    let (reporter, _) = quiet_reporter();

    let err = scraper.run(&reporter).await.unwrap_err();
    assert!(matches!(
        err,
        ScraperError::Resolution {
            source: ResolutionFailure::TargetIdNotFound { .. },
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "Failed to retrieve synset target id, are you sure a synset with id n11111111 exists?"
    );
    assert!(jpg_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_progress_output_follows_quiet_setting() {
    for quiet in [false, true] {
        let server = MockServer::start().await;
        mount_synset(&server, &[Thumbnail::jpeg("qq0001", 8, 8)]).await;
        let dir = TempDir::new().unwrap();

        let mut config = config(&server, dir.path(), SYNSET_ID);
        config.quiet = quiet;
        let progress = Capture::default();
        let diagnostics = Capture::default();
        let reporter = RunReporter::for_config_with_sinks(
            &config,
            Box::new(progress.clone()),
            Box::new(diagnostics.clone()),
        );

        let summary = SynsetScraper::new(config)
            .unwrap()
            .run(&reporter)
            .await
            .unwrap();
        assert_eq!(summary.saved, 1);
        assert!(diagnostics.text().is_empty());

        let text = progress.text();
        if quiet {
            assert!(text.is_empty(), "quiet run printed: {}", text);
        } else {
            assert!(text.starts_with("Retrieving synset target id\n"));
            assert!(text.contains("Downloading 1 images"));
            assert!(text.contains("Done!"));
        }
    }
}

#[tokio::test]
async fn test_short_index_completes_with_received_count() {
    let server = MockServer::start().await;
    let served = [Thumbnail::jpeg("sh0001", 8, 8), Thumbnail::jpeg("sh0002", 8, 8)];

    Mock::given(method("GET"))
        .and(path("/synset"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("target_id = '{}';", TARGET_ID)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/python/gp.py/ImagesXML"))
        .and(query_param("n", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<r><imageset total="3"></imageset></r>"#),
        )
        .mount(&server)
        .await;
    let images: String = served
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
        .and(query_param("n", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<r><imageset total="3">{}</imageset></r>"#,
            images
        )))
        .expect(1)
        .mount(&server)
        .await;
    for thumbnail in &served {
        Mock::given(method("GET"))
            .and(path(thumbnail.url_path()))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(thumbnail.body.clone().unwrap()),
            )
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let scraper = SynsetScraper::new(config(&server, dir.path(), SYNSET_ID)).unwrap();
    let (reporter, diagnostics) = quiet_reporter();

    let summary = scraper.run(&reporter).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.saved, 2);
    assert_eq!(summary.failed, 0);
    assert!(diagnostics.text().is_empty());
    assert_eq!(jpg_files(dir.path()), ["sh0001.jpg", "sh0002.jpg"]);
}

#[tokio::test]
async fn test_repeated_runs_produce_identical_files() {
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let server = MockServer::start().await;
        mount_synset(
            &server,
            &[
                Thumbnail::jpeg("rr0001", 20, 10),
                Thumbnail::missing("rr0002"),
                Thumbnail::jpeg("rr0003", 10, 20),
            ],
        )
        .await;
        let dir = TempDir::new().unwrap();

        let mut config = config(&server, dir.path(), SYNSET_ID);
        config.target_size = Some(TargetSize::new(16, 16));
        let (reporter, _) = quiet_reporter();
        SynsetScraper::new(config)
            .unwrap()
            .run(&reporter)
            .await
            .unwrap();

        let files: Vec<(String, String)> = jpg_files(dir.path())
            .into_iter()
            .map(|name| {
                let hash = sha256_file(&dir.path().join(&name));
                (name, hash)
            })
            .collect();
        outputs.push(files);
    }

    assert_eq!(outputs[0].len(), 2);
    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn test_concurrency_far_above_image_count() {
    let server = MockServer::start().await;
    mount_synset(&server, &[Thumbnail::jpeg("cc0001", 8, 8), Thumbnail::jpeg("cc0002", 8, 8)])
        .await;
    let dir = TempDir::new().unwrap();

    let mut config = config(&server, dir.path(), SYNSET_ID);
    config.concurrency = usize::MAX;
    let (reporter, _) = quiet_reporter();

    let summary = SynsetScraper::new(config)
        .unwrap()
        .run(&reporter)
        .await
        .unwrap();
    assert_eq!(summary.saved, 2);
    assert_eq!(jpg_files(dir.path()), ["cc0001.jpg", "cc0002.jpg"]);
}
