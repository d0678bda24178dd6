//! CLI module for the imagenet-scraper library
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;

pub use main_impl::{main, parse_args, Cli, EXIT_FATAL};
