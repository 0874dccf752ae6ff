//! Error types for the k8ctl installer CLI.
//!
//! This module defines semantic error variants that provide actionable guidance
//! to users when installation fails. Every variant aborts the install at the
//! step where it was raised; placement errors also carry the files that had
//! already been written so the user can clean up.

use crate::artefact::download::DownloadError;
use crate::artefact::error::ArtefactError;
use crate::artefact::release_parser::ReleaseParseError;
use crate::config::ConfigError;
use crate::receipt::ReceiptError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur during the installation process.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The release has no artifact for the requested platform.
    #[error("no artifact for platform {platform}; release provides: {available}")]
    UnsupportedPlatform {
        /// The requested platform.
        platform: String,
        /// Platforms the release declares.
        available: String,
    },

    /// The host or requested platform could not be described.
    #[error("invalid platform: {reason}")]
    InvalidPlatform {
        /// Description of the problem.
        reason: String,
    },

    /// The release manifest could not be loaded or failed validation.
    #[error("invalid release manifest: {reason}")]
    InvalidRelease {
        /// Description of the problem.
        reason: String,
    },

    /// The archive could not be downloaded.
    #[error("could not fetch release archive: {reason}")]
    DownloadFailed {
        /// The URL that was requested.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The downloaded bytes do not match the published checksum.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The URL that was downloaded.
        url: String,
        /// The digest from the release manifest.
        expected: String,
        /// The digest of the downloaded bytes.
        actual: String,
    },

    /// The release publishes no checksum and unverified installs are off.
    #[error(
        "release publishes no checksum for {platform}; refusing to install unverified \
         download (pass --allow-unverified to override)"
    )]
    ChecksumUnset {
        /// The selected artifact's platform label.
        platform: String,
    },

    /// The archive could not be unpacked.
    #[error("archive could not be unpacked: {reason}")]
    ArchiveUnreadable {
        /// Description of the failure.
        reason: String,
    },

    /// Files named by the install manifest are absent from the archive.
    #[error("archive is missing declared entries: {}", .missing.join(", "))]
    EntryMissingInArchive {
        /// Manifest sources not found in the archive.
        missing: Vec<String>,
    },

    /// A destination directory cannot be written.
    #[error("permission denied writing {path}: {reason}{}", written_suffix(.written))]
    WritePermissionDenied {
        /// The destination that could not be written.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
        /// Files placed before the failure.
        written: Vec<Utf8PathBuf>,
    },

    /// Copying a file into place failed for a reason other than permissions.
    #[error("failed to place {path}: {reason}{}", written_suffix(.written))]
    PlacementFailed {
        /// The destination that could not be written.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
        /// Files placed before the failure.
        written: Vec<Utf8PathBuf>,
    },

    /// The installed executable did not pass its smoke test.
    #[error("smoke test failed: {reason}")]
    SmokeTestFailed {
        /// Description of the failure.
        reason: String,
    },

    /// Configuration could not be loaded or resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Install receipts could not be read.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// A file named on the command line could not be read.
    #[error("failed to read {path}")]
    ReadFailed {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

fn written_suffix(written: &[Utf8PathBuf]) -> String {
    if written.is_empty() {
        return " (no files were written)".to_owned();
    }
    let list = written
        .iter()
        .map(|path| path.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(" (already written: {list})")
}

impl InstallerError {
    /// Build a [`InstallerError::DownloadFailed`] for `url`.
    #[must_use]
    pub fn download_failed(url: &str, err: &DownloadError) -> Self {
        Self::DownloadFailed {
            url: url.to_owned(),
            reason: err.to_string(),
        }
    }

    /// Files that were placed before the error, if any.
    #[must_use]
    pub fn written_files(&self) -> &[Utf8PathBuf] {
        match self {
            Self::WritePermissionDenied { written, .. } | Self::PlacementFailed { written, .. } => {
                written
            }
            _ => &[],
        }
    }
}

impl From<ArtefactError> for InstallerError {
    fn from(err: ArtefactError) -> Self {
        match err {
            ArtefactError::UnsupportedPlatform {
                platform,
                available,
            } => Self::UnsupportedPlatform {
                platform,
                available,
            },
            ArtefactError::UnsupportedOs { .. }
            | ArtefactError::UnsupportedArch { .. }
            | ArtefactError::InvalidPlatform { .. } => Self::InvalidPlatform {
                reason: err.to_string(),
            },
            other => Self::InvalidRelease {
                reason: other.to_string(),
            },
        }
    }
}

impl From<ReleaseParseError> for InstallerError {
    fn from(err: ReleaseParseError) -> Self {
        Self::InvalidRelease {
            reason: err.to_string(),
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
