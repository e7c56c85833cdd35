//! Saved run directory
//!
//! One directory per run, named from the run start time. Feed bodies are
//! written gzip-compressed under their content-addressed names; the manifest
//! is rewritten in full after every successful feed through a temp file and
//! a rename, so the canonical manifest is always a complete version.

use crate::storage::codec::{compress, decompress};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::manifest::{FetchRecord, Manifest};
use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Canonical manifest file name inside a run directory
pub const MANIFEST_FILE: &str = "meta.json.gz";

/// Suffix of the temporary manifest written before the rename
pub const TEMP_SUFFIX: &str = ".tmp";

/// Directory name for a run started at `started`
///
/// UTC with microseconds and a `Z` suffix, so names sort chronologically.
pub fn run_dir_name(started: DateTime<Utc>) -> String {
    started.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// A run directory that has been created on disk
#[derive(Debug, Clone)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Creates `<save_dir>/<run_dir_name(started)>`
    ///
    /// The base directory is created if needed. The run directory itself must
    /// not exist yet.
    pub fn create(save_dir: &Path, started: DateTime<Utc>) -> StorageResult<Self> {
        fs::create_dir_all(save_dir)?;

        let path = save_dir.join(run_dir_name(started));
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::RunDirExists(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!("Created run directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    pub fn temp_manifest_path(&self) -> PathBuf {
        let mut name = OsString::from(MANIFEST_FILE);
        name.push(TEMP_SUFFIX);
        self.path.join(name)
    }

    /// Writes a compressed feed body under `file_name`
    pub fn write_feed(&self, file_name: &str, body: &str) -> StorageResult<PathBuf> {
        let path = self.path.join(file_name);
        let packed = compress(body.as_bytes())?;

        let mut file = File::create(&path)?;
        file.write_all(&packed)?;
        file.sync_all()?;

        Ok(path)
    }

    /// Atomically replaces the on-disk manifest with `manifest`
    pub fn persist(&self, manifest: &Manifest) -> StorageResult<()> {
        let packed = compress(&manifest.to_bytes()?)?;
        write_atomic(&self.temp_manifest_path(), &self.manifest_path(), &packed)?;
        tracing::trace!(
            "Manifest persisted with {} of {} feeds",
            manifest.fetched_count(),
            manifest.discovered_count()
        );
        Ok(())
    }

    /// Stores a fetched feed and records it in the manifest
    ///
    /// The body is on disk before the manifest that references it is
    /// persisted. A crash in between leaves an unreferenced blob, never a
    /// dangling reference.
    pub fn record_feed(
        &self,
        manifest: &mut Manifest,
        record: FetchRecord,
        body: &str,
    ) -> StorageResult<()> {
        if manifest.contains(&record.url) {
            return Err(StorageError::DuplicateRecord(record.url));
        }

        self.write_feed(&record.file, body)?;
        manifest.record(record)?;
        self.persist(manifest)
    }
}

/// Reads the manifest of an existing run directory
pub fn load_manifest(run_dir: &Path) -> StorageResult<Manifest> {
    let packed = fs::read(run_dir.join(MANIFEST_FILE))?;
    Manifest::from_bytes(&decompress(&packed)?)
}

/// Reads and decompresses a stored feed body
pub fn load_feed(run_dir: &Path, file_name: &str) -> StorageResult<String> {
    let packed = fs::read(run_dir.join(file_name))?;
    let raw = decompress(&packed)?;
    String::from_utf8(raw).map_err(|e| {
        StorageError::Io(std::io::Error::new(ErrorKind::InvalidData, e))
    })
}

/// Write-to-temp-then-rename
///
/// `temp` must be on the same filesystem as `target`; it is synced before the
/// rename so the new version is complete when it becomes visible.
fn write_atomic(temp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp, target)
}
