//! Output module for inspecting stored runs
//!
//! This module handles:
//! - Summarizing a run manifest
//! - Printing the summary for `--inspect`

pub mod summary;

pub use summary::{load_summary, print_summary, summarize, RunSummary};
