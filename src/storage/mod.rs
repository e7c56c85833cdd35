//! Storage module for persisting run results
//!
//! This module handles everything written to disk during a run:
//! - The timestamped run directory
//! - Gzip-compressed, content-addressed feed bodies
//! - The run manifest, rewritten atomically after every fetched feed

mod codec;
mod error;
mod manifest;
mod run_dir;

pub use codec::{compress, decompress};
pub use error::{StorageError, StorageResult};
pub use manifest::{content_file_name, FetchRecord, Manifest, CONTENT_EXTENSION};
pub use run_dir::{load_feed, load_manifest, run_dir_name, RunDirectory, MANIFEST_FILE};
