//! Archive retrieval and checksum verification.
//!
//! [`fetch_and_verify`] is the only way to obtain a [`VerifiedArchive`], so
//! the placement step can never run against bytes that failed verification.

use crate::artefact::download::ArtefactDownloader;
use crate::artefact::release::{Artifact, ReleaseVersion};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::artefact::verification::{ExpectedChecksum, VerificationPolicy};
use crate::error::{InstallerError, Result};
use std::path::Path;
use tempfile::TempDir;

const ARCHIVE_FILENAME: &str = "artifact.download";

/// A downloaded archive that passed the verification policy.
///
/// The archive lives in a scratch directory that is removed when this
/// value is dropped.
#[derive(Debug)]
pub struct VerifiedArchive {
    scratch: TempDir,
    url: String,
    digest: Sha256Digest,
    checksum_verified: bool,
}

impl VerifiedArchive {
    /// Path of the downloaded archive.
    #[must_use]
    pub fn path(&self) -> std::path::PathBuf {
        self.scratch.path().join(ARCHIVE_FILENAME)
    }

    /// The URL the archive was fetched from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// SHA-256 of the downloaded bytes.
    #[must_use]
    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// `true` when the digest was compared against a published checksum,
    /// `false` when the install proceeded without one.
    #[must_use]
    pub fn checksum_verified(&self) -> bool {
        self.checksum_verified
    }
}

/// Download `artifact` and check it against its published checksum.
///
/// # Errors
///
/// - [`InstallerError::ChecksumUnset`] when no checksum is published and
///   `policy` does not allow unverified installs; raised before any
///   network traffic.
/// - [`InstallerError::DownloadFailed`] when the transfer fails.
/// - [`InstallerError::ChecksumMismatch`] when the bytes do not match.
pub fn fetch_and_verify(
    downloader: &dyn ArtefactDownloader,
    artifact: &Artifact,
    version: &ReleaseVersion,
    policy: VerificationPolicy,
) -> Result<VerifiedArchive> {
    let url = artifact.resolved_url(version);
    if artifact.sha256().is_unset() && !policy.allows_unverified() {
        return Err(InstallerError::ChecksumUnset {
            platform: artifact.platform_label(),
        });
    }

    let scratch = tempfile::Builder::new()
        .prefix("k8ctl-installer-")
        .tempdir()?;
    let archive_path = scratch.path().join(ARCHIVE_FILENAME);
    downloader
        .download(&url, &archive_path)
        .map_err(|err| InstallerError::download_failed(&url, &err))?;

    let digest = digest_of(&archive_path)?;
    log::debug!("sha256 of {url}: {digest}");

    let checksum_verified = match artifact.sha256() {
        ExpectedChecksum::Sha256(expected) => {
            if expected != &digest {
                return Err(InstallerError::ChecksumMismatch {
                    url,
                    expected: expected.to_string(),
                    actual: digest.to_string(),
                });
            }
            true
        }
        ExpectedChecksum::Unset => {
            log::warn!("installing {url} without checksum verification (sha256 {digest})");
            false
        }
    };

    Ok(VerifiedArchive {
        scratch,
        url,
        digest,
        checksum_verified,
    })
}

fn digest_of(path: &Path) -> Result<Sha256Digest> {
    Ok(Sha256Digest::of_file(path)?)
}
