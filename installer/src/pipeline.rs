//! Install pipeline orchestration.
//!
//! A single linear pass: select the artifact for the platform, fetch and
//! verify it, place the declared files, then smoke-test the installed
//! executable. Each step either succeeds or aborts the run with an
//! [`InstallerError`]; there are no retries and no rollback. The network,
//! archive and process collaborators are injected through [`Collaborators`]
//! so the pipeline can run against stubs.

use crate::artefact::download::{ArtefactDownloader, HttpDownloader};
use crate::artefact::extraction::{ArtefactExtractor, TarExtractor};
use crate::artefact::platform::Platform;
use crate::artefact::release::Release;
use crate::artefact::sha256_digest::Sha256Digest;
use crate::config::InstallSettings;
use crate::error::{InstallerError, Result};
use crate::fetch::fetch_and_verify;
use crate::output::{DryRunInfo, command_line, unverified_warning, write_stderr_line};
use crate::receipt::InstallReceipt;
use crate::smoke::{ProcessRunner, SmokeTestOutcome, SystemProcessRunner, verify_install};
use crate::stager::{PlacedFile, check_destinations, install};
use camino::Utf8PathBuf;
use std::io::Write;

/// What to install and how.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    /// The parsed release manifest.
    pub release: &'a Release,
    /// The platform to install for.
    pub platform: Platform,
    /// Resolved destinations, policy and timeouts.
    pub settings: &'a InstallSettings,
    /// Skip the post-install smoke test.
    pub skip_smoke_test: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// External effects the pipeline depends on.
pub struct Collaborators<'a> {
    /// Fetches the release archive.
    pub downloader: &'a dyn ArtefactDownloader,
    /// Unpacks the release archive.
    pub extractor: &'a dyn ArtefactExtractor,
    /// Runs the installed executable.
    pub runner: &'a dyn ProcessRunner,
}

/// Summary of a completed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Tool name.
    pub tool: String,
    /// Installed version.
    pub version: String,
    /// Platform label of the selected artifact.
    pub artifact: String,
    /// URL the archive was fetched from.
    pub url: String,
    /// SHA-256 of the downloaded archive.
    pub digest: Sha256Digest,
    /// Whether the digest matched a published checksum.
    pub checksum_verified: bool,
    /// Files written, in manifest order.
    pub placed: Vec<PlacedFile>,
    /// Result of running the installed executable.
    pub smoke_test: SmokeTestOutcome,
}

impl InstallReport {
    /// Fail with [`InstallerError::SmokeTestFailed`] if the smoke test failed.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::SmokeTestFailed`] carrying the failure reason.
    pub fn ensure_smoke_test_passed(&self) -> Result<()> {
        match &self.smoke_test {
            SmokeTestOutcome::Failed { reason } => Err(InstallerError::SmokeTestFailed {
                reason: reason.clone(),
            }),
            SmokeTestOutcome::Passed | SmokeTestOutcome::Skipped => Ok(()),
        }
    }

    /// Build the receipt recorded for this install.
    #[must_use]
    pub fn receipt(&self, installed_at: u64) -> InstallReceipt {
        InstallReceipt {
            name: self.tool.clone(),
            version: self.version.clone(),
            platform: self.artifact.clone(),
            url: self.url.clone(),
            sha256: self.digest.to_string(),
            verified: self.checksum_verified,
            files: self
                .placed
                .iter()
                .map(|file| file.destination.clone())
                .collect(),
            installed_at,
        }
    }
}

/// Run the pipeline with the HTTP downloader, tar extractor and system
/// process runner.
///
/// # Errors
///
/// Returns the error of the first step that fails. A failed smoke test is
/// reported in [`InstallReport::smoke_test`], not as an error.
pub fn run_install(request: &InstallRequest<'_>, stderr: &mut dyn Write) -> Result<InstallReport> {
    let downloader = HttpDownloader::new(request.settings.download_timeout);
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &SystemProcessRunner,
    };
    run_install_with(request, &collaborators, stderr)
}

/// Run the pipeline against explicit collaborators.
///
/// # Errors
///
/// See [`run_install`].
pub fn run_install_with(
    request: &InstallRequest<'_>,
    collaborators: &Collaborators<'_>,
    stderr: &mut dyn Write,
) -> Result<InstallReport> {
    let release = request.release;
    let artifact = release.select_artifact(&request.platform)?;
    log::info!(
        "selected {} artifact of {} {} for {}",
        artifact.platform_label(),
        release.name(),
        release.version(),
        request.platform
    );
    check_destinations(release.install_manifest(), &request.settings.roots)?;

    let url = artifact.resolved_url(release.version());
    if !request.quiet {
        write_stderr_line(stderr, format!("Downloading {url}..."));
    }
    let archive = fetch_and_verify(
        collaborators.downloader,
        artifact,
        release.version(),
        request.settings.policy,
    )?;
    if archive.checksum_verified() {
        if !request.quiet {
            write_stderr_line(stderr, format!("Verified sha256 {}", archive.digest()));
        }
    } else {
        // Shown even in quiet mode.
        write_stderr_line(
            stderr,
            unverified_warning(archive.url(), archive.digest().as_str()),
        );
    }

    let manifest = release.install_manifest();
    let placed = install(
        collaborators.extractor,
        &archive,
        manifest,
        &request.settings.roots,
    )?;
    if !request.quiet {
        for file in &placed {
            write_stderr_line(stderr, format!("  {} -> {}", file.source, file.destination));
        }
    }

    let smoke_test = match smoke_test_binary(request) {
        Some(binary) => {
            let outcome = verify_install(
                collaborators.runner,
                &binary,
                release.smoke_test(),
                request.settings.smoke_test_timeout,
            );
            if !request.quiet {
                write_stderr_line(stderr, format!("Smoke test {outcome}"));
            }
            outcome
        }
        None => SmokeTestOutcome::Skipped,
    };

    Ok(InstallReport {
        tool: release.name().to_string(),
        version: release.version().to_string(),
        artifact: artifact.platform_label(),
        url: archive.url().to_owned(),
        digest: archive.digest().clone(),
        checksum_verified: archive.checksum_verified(),
        placed,
        smoke_test,
    })
}

/// Describe the install without touching the network or filesystem.
///
/// # Errors
///
/// Returns [`InstallerError::UnsupportedPlatform`] when no artifact matches,
/// [`InstallerError::ChecksumUnset`] when the install would be refused, and
/// [`InstallerError::PlacementFailed`] when two files share a destination.
pub fn plan_install(request: &InstallRequest<'_>) -> Result<DryRunInfo> {
    let release = request.release;
    let artifact = release.select_artifact(&request.platform)?;
    if artifact.sha256().is_unset() && !request.settings.policy.allows_unverified() {
        return Err(InstallerError::ChecksumUnset {
            platform: artifact.platform_label(),
        });
    }
    check_destinations(release.install_manifest(), &request.settings.roots)?;

    let placements = release
        .install_manifest()
        .entries()
        .iter()
        .map(|entry| {
            (
                entry.source().to_owned(),
                request.settings.roots.destination(entry),
            )
        })
        .collect();

    Ok(DryRunInfo {
        tool: release.name().to_string(),
        version: release.version().to_string(),
        description: release.description().map(str::to_owned),
        homepage: release.homepage().map(str::to_owned),
        platform: request.platform.to_string(),
        artifact: artifact.platform_label(),
        url: artifact.resolved_url(release.version()),
        checksum: artifact.sha256().to_string(),
        policy: request.settings.policy.to_string(),
        placements,
        smoke_test: smoke_test_binary(request)
            .map(|binary| command_line(&binary, &release.smoke_test().args)),
    })
}

/// The installed executable to smoke-test, unless the test is disabled or
/// the release installs no executable.
fn smoke_test_binary(request: &InstallRequest<'_>) -> Option<Utf8PathBuf> {
    if request.skip_smoke_test {
        return None;
    }
    request
        .release
        .install_manifest()
        .primary_executable()
        .map(|entry| request.settings.roots.destination(entry))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
