//! ImageNet synset thumbnail scraper CLI
//!
//! Command-line entry point; see `imagenet_scraper::cli` for the arguments.

#[cfg(feature = "cli")]
use imagenet_scraper::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> std::process::ExitCode {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
