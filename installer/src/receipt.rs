//! Install receipts for completed installs.
//!
//! A receipt records what was installed, from where, and which files were
//! written. Receipts are stored one per tool in the installer's data
//! directory at `<data_dir>/receipts/<name>.json`, so reinstalling a tool
//! replaces its receipt.

use crate::dirs::BaseDirs;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const RECEIPTS_DIRNAME: &str = "receipts";
const RECEIPT_EXTENSION: &str = "json";

/// Record of one completed install.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallReceipt {
    /// Tool name.
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Platform label of the selected artifact, e.g. `darwin/arm64`.
    pub platform: String,
    /// URL the archive was fetched from.
    pub url: String,
    /// SHA-256 of the downloaded archive.
    pub sha256: String,
    /// Whether the digest was checked against a published checksum.
    pub verified: bool,
    /// Files written by the install.
    pub files: Vec<Utf8PathBuf>,
    /// Seconds since the Unix epoch when the install finished.
    pub installed_at: u64,
}

/// Errors that prevent receipts being read or written.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    /// The installer data directory could not be resolved.
    #[error("could not determine the installer data directory")]
    MissingDataDirectory,

    /// Creating the receipts directory failed.
    #[error("failed to create receipts directory {path}: {source}")]
    CreateDirectory {
        /// Directory path that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading a receipt or the receipts directory failed.
    #[error("failed to read receipts at {path}: {source}")]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing a receipt failed.
    #[error("failed to serialize receipt: {source}")]
    Serialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing a receipt failed.
    #[error("failed to write receipt {path}: {source}")]
    Write {
        /// File path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Seconds since the Unix epoch, or zero if the clock is before it.
#[must_use]
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// The directory holding receipts.
///
/// # Errors
///
/// Returns [`ReceiptError::MissingDataDirectory`] when the platform has no
/// data directory.
pub fn receipts_dir(dirs: &dyn BaseDirs) -> Result<PathBuf, ReceiptError> {
    let data_dir = dirs.data_dir().ok_or(ReceiptError::MissingDataDirectory)?;
    Ok(data_dir.join(RECEIPTS_DIRNAME))
}

/// Store `receipt` in the installer's data directory.
///
/// # Errors
///
/// Returns a [`ReceiptError`] when the directory cannot be resolved or the
/// file cannot be written.
pub fn write_receipt(
    dirs: &dyn BaseDirs,
    receipt: &InstallReceipt,
) -> Result<PathBuf, ReceiptError> {
    write_receipt_in(&receipts_dir(dirs)?, receipt)
}

/// Store `receipt` under an explicit receipts directory.
///
/// # Errors
///
/// Returns a [`ReceiptError`] when the file cannot be written.
pub fn write_receipt_in(dir: &Path, receipt: &InstallReceipt) -> Result<PathBuf, ReceiptError> {
    std::fs::create_dir_all(dir).map_err(|source| ReceiptError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{}.{RECEIPT_EXTENSION}", receipt.name));
    let json = serde_json::to_string_pretty(receipt)
        .map_err(|source| ReceiptError::Serialize { source })?;
    std::fs::write(&path, json).map_err(|source| ReceiptError::Write {
        path: path.clone(),
        source,
    })?;
    log::debug!("wrote install receipt {}", path.display());
    Ok(path)
}

/// Load every receipt from the installer's data directory.
///
/// # Errors
///
/// Returns a [`ReceiptError`] when the directory cannot be resolved or
/// listed.
pub fn load_receipts(dirs: &dyn BaseDirs) -> Result<Vec<InstallReceipt>, ReceiptError> {
    load_receipts_in(&receipts_dir(dirs)?)
}

/// Load every receipt under `dir`, sorted by tool name.
///
/// A missing directory yields no receipts. Files that cannot be read or
/// parsed are skipped with a warning.
///
/// # Errors
///
/// Returns [`ReceiptError::Read`] when the directory cannot be listed.
pub fn load_receipts_in(dir: &Path) -> Result<Vec<InstallReceipt>, ReceiptError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let read_error = |source| ReceiptError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut receipts = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(RECEIPT_EXTENSION) {
            continue;
        }
        match read_receipt(&path) {
            Some(receipt) => receipts.push(receipt),
            None => log::warn!("skipping unreadable receipt {}", path.display()),
        }
    }
    receipts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(receipts)
}

fn read_receipt(path: &Path) -> Option<InstallReceipt> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}
