//! Shared types for the survey pipeline.
//!
//! This crate holds the small vocabulary the other crates agree on:
//! run timestamps (which name staging runs, backups, archives, and
//! publication metadata files) and CLI output formats.

pub mod output;
pub mod timestamp;

pub use output::OutputFormat;
pub use timestamp::{RunTimestamp, RUN_TIMESTAMP_FORMAT};
