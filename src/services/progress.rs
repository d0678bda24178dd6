//! Progress reporting service
//!
//! Progress output is user-facing and goes to stdout. It is entirely
//! suppressed in quiet mode; diagnostics are handled separately by
//! [`crate::services::RunReporter`].

use crate::services::report::RunSummary;
use crate::types::TargetSize;
#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Citation block printed after a successful, non-quiet run
pub const CITATION: &str = r"@Misc{imagenetscraper,
author = {Michael Smith},
title = {imagenetscraper: Bulk-download thumbnails from ImageNet synsets},
howpublished = {\url{https://github.com/spinda/imagenetscraper}},
year = {2017}
}";

/// Stages of a scraping run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStage {
    /// Resolving the synset id to a catalog target id
    ResolvingTarget,
    /// Requesting the index with `count=0` to learn the total
    QueryingCount,
    /// Requesting the full index
    RetrievingIndex,
    /// Downloading thumbnails
    Downloading {
        total: u64,
        size: Option<TargetSize>,
    },
    /// Run finished
    Completed,
}

impl RunStage {
    /// Human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::ResolvingTarget => "Retrieving synset target id".to_string(),
            Self::QueryingCount => "Retrieving image count".to_string(),
            Self::RetrievingIndex => "Retrieving synset index".to_string(),
            Self::Downloading { total, size } => match size {
                Some(size) => format!("Downloading {} images and scaling to {}", total, size),
                None => format!("Downloading {} images", total),
            },
            Self::Completed => "Done!".to_string(),
        }
    }
}

/// Trait for stdout progress output
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started
    fn report_stage(&self, stage: &RunStage);

    /// One item finished, successfully or not
    fn advance(&self);

    /// The run finished
    fn report_completion(&self, summary: &RunSummary);

    /// Run `f` with any live progress display hidden, so diagnostics
    /// written meanwhile do not interleave with it
    fn suspend(&self, f: &mut dyn FnMut()) {
        f();
    }
}

/// No-op progress reporter used in quiet mode
#[derive(Debug, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_stage(&self, _stage: &RunStage) {}

    fn advance(&self) {}

    fn report_completion(&self, _summary: &RunSummary) {}
}

/// Progress bar abstraction that works with and without CLI features
#[derive(Debug)]
pub enum ProgressIndicator {
    #[cfg(feature = "cli")]
    Indicatif(ProgressBar),
    NoOp,
}

impl ProgressIndicator {
    /// Create a progress indicator counting `total` items
    #[must_use]
    pub fn for_items(total: u64) -> Self {
        #[cfg(feature = "cli")]
        {
            let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stdout());
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Self::Indicatif(pb)
        }
        #[cfg(not(feature = "cli"))]
        {
            let _ = total;
            Self::NoOp
        }
    }

    /// Advance by one item
    pub fn inc(&self) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.inc(1),
            Self::NoOp => {},
        }
    }

    /// Finish and leave the final state on screen
    pub fn finish(&self) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.finish(),
            Self::NoOp => {},
        }
    }

    /// Hide the indicator while `f` runs
    pub fn suspend(&self, f: &mut dyn FnMut()) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.suspend(f),
            Self::NoOp => f(),
        }
    }
}

/// Console progress reporter: stage lines, an item progress bar and the
/// completion message with citation
pub struct ConsoleProgressReporter {
    out: Mutex<Box<dyn Write + Send>>,
    indicator: Mutex<ProgressIndicator>,
}

impl ConsoleProgressReporter {
    /// Reporter writing to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Reporter writing stage lines to an arbitrary sink
    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            indicator: Mutex::new(ProgressIndicator::NoOp),
        }
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Progress output is best effort; a closed stdout must not fail the run.
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }

    fn indicator(&self) -> MutexGuard<'_, ProgressIndicator> {
        self.indicator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_stage(&self, stage: &RunStage) {
        self.write_line(&stage.description());
        if let RunStage::Downloading { total, .. } = stage {
            *self.indicator() = ProgressIndicator::for_items(*total);
        }
    }

    fn advance(&self) {
        self.indicator().inc();
    }

    fn report_completion(&self, summary: &RunSummary) {
        self.indicator().finish();

        self.write_line("");
        self.write_line(&format!(
            "{} Saved {} of {} images ({} failed) in {:.1}s.",
            RunStage::Completed.description(),
            summary.saved,
            summary.total,
            summary.failed,
            summary.elapsed_ms as f64 / 1000.0
        ));
        self.write_line("If this tool helped with your research, a citation would be appreciated:");
        self.write_line("");
        self.write_line(CITATION);
    }

    fn suspend(&self, f: &mut dyn FnMut()) {
        self.indicator().suspend(f);
    }
}

/// Create the progress reporter for a CLI run
#[must_use]
pub fn create_cli_progress_reporter(quiet: bool) -> Box<dyn ProgressReporter> {
    progress_reporter_with_writer(quiet, Box::new(std::io::stdout()))
}

/// Progress reporter writing to `out`, or none at all in quiet mode
#[must_use]
pub fn progress_reporter_with_writer(
    quiet: bool,
    out: Box<dyn Write + Send>,
) -> Box<dyn ProgressReporter> {
    if quiet {
        Box::new(NoOpProgressReporter)
    } else {
        Box::new(ConsoleProgressReporter::with_writer(out))
    }
}
