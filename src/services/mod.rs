//! Service layer for imagenet-scraper
//!
//! Separates output concerns (file commits, stdout progress, stderr
//! diagnostics) from the run orchestration in [`crate::processor`].

pub mod io;
pub mod progress;
pub mod report;

pub use io::ImageCommitter;
pub use progress::{
    create_cli_progress_reporter, progress_reporter_with_writer, ConsoleProgressReporter,
    NoOpProgressReporter, ProgressIndicator, ProgressReporter, RunStage, CITATION,
};
pub use report::{RunReporter, RunSummary};
