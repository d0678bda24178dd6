//! Run reporting: per-item and fatal diagnostics plus the run summary
//!
//! Diagnostics always go to the diagnostic sink (stderr by default), even in
//! quiet mode. Per-item failures never change the outcome of the run.

use crate::error::{ItemError, ScraperError};
use crate::config::ScraperConfig;
use crate::services::progress::{
    create_cli_progress_reporter, progress_reporter_with_writer, ProgressReporter, RunStage,
};
use instant::Instant;
use std::error::Error as _;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Totals for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of index records scheduled
    pub total: u64,
    /// Images committed to disk
    pub saved: u64,
    /// Images reported and skipped
    pub failed: u64,
    /// Wall-clock duration of the run (milliseconds)
    pub elapsed_ms: u64,
}

/// Aggregates run progress and reports failures
pub struct RunReporter {
    progress: Box<dyn ProgressReporter>,
    diagnostics: Mutex<Box<dyn Write + Send>>,
    total: AtomicU64,
    saved: AtomicU64,
    failed: AtomicU64,
    start_time: Instant,
}

impl RunReporter {
    /// Reporter writing diagnostics to stderr
    #[must_use]
    pub fn new(progress: Box<dyn ProgressReporter>) -> Self {
        Self::with_diagnostics(progress, Box::new(std::io::stderr()))
    }

    /// Reporter for a configured run: console progress unless `quiet` is set,
    /// diagnostics on stderr either way
    #[must_use]
    pub fn for_config(config: &ScraperConfig) -> Self {
        Self::new(create_cli_progress_reporter(config.quiet))
    }

    /// Like [`Self::for_config`], with explicit progress and diagnostic sinks
    #[must_use]
    pub fn for_config_with_sinks(
        config: &ScraperConfig,
        progress: Box<dyn Write + Send>,
        diagnostics: Box<dyn Write + Send>,
    ) -> Self {
        Self::with_diagnostics(
            progress_reporter_with_writer(config.quiet, progress),
            diagnostics,
        )
    }

    /// Reporter writing diagnostics to an arbitrary sink
    #[must_use]
    pub fn with_diagnostics(
        progress: Box<dyn ProgressReporter>,
        diagnostics: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            progress,
            diagnostics: Mutex::new(diagnostics),
            total: AtomicU64::new(0),
            saved: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// A new run stage has started
    pub fn stage(&self, stage: &RunStage) {
        if let RunStage::Downloading { total, .. } = stage {
            self.total.store(*total, Ordering::Relaxed);
        }
        self.progress.report_stage(stage);
    }

    /// An image was committed to `path`
    pub fn item_saved(&self, path: &Path) {
        debug!(path = %path.display(), "Saved image");
        self.saved.fetch_add(1, Ordering::Relaxed);
        self.progress.advance();
    }

    /// An image was skipped; prints `Failed to save image: <url>` and the cause
    pub fn item_failed(&self, url: &str, error: &ItemError) {
        debug!(url = %url, error = %error, "Skipping image");
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.emit(&format!("Failed to save image: {}", url), &error.to_string());
        self.progress.advance();
    }

    /// A setup failure ended the run; prints the message and its cause
    pub fn fatal(&self, error: &ScraperError) {
        debug!(stage = error.stage(), error = %error, "Run aborted");
        let cause = error
            .source()
            .map_or_else(|| error.to_string(), ToString::to_string);
        self.emit(&error.to_string(), &cause);
    }

    /// Close the run and report completion
    pub fn finish(&self) -> RunSummary {
        let summary = self.summary();
        self.progress.report_completion(&summary);
        summary
    }

    /// Current totals
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            elapsed_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }

    fn emit(&self, prelude: &str, cause: &str) {
        self.progress.suspend(&mut || {
            // A sink that panicked mid-write must not silence later reports.
            let mut sink = self
                .diagnostics
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let _ = writeln!(sink, "{}", prelude);
            let _ = writeln!(sink, "({})", cause);
            let _ = sink.flush();
        });
    }
}
