//! Unit tests for install pipeline orchestration.
//!
//! The downloader and process runner are mocked; archives are real
//! gzip tarballs unpacked by [`TarExtractor`] into temporary roots.

use super::*;
use crate::artefact::download::{DEFAULT_DOWNLOAD_TIMEOUT, DownloadError, MockArtefactDownloader};
use crate::artefact::platform::{Arch, Os};
use crate::artefact::release_parser::parse_release_toml;
use crate::artefact::verification::VerificationPolicy;
use crate::smoke::{DEFAULT_SMOKE_TEST_TIMEOUT, MockProcessRunner, ProcessOutcome};
use crate::test_utils::{k8ctl_release_toml, roots_under, sha256_hex, standard_archive_files, tar_gz};
use camino::Utf8Path;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const ARM64_URL: &str = "https://example.test/v{version}/k8ctl_darwin_arm64.tar.gz";
const DEFAULT_URL: &str = "https://example.test/v{version}/k8ctl_darwin_amd64.tar.gz";
const RESOLVED_ARM64_URL: &str = "https://example.test/v0.1.0/k8ctl_darwin_arm64.tar.gz";

fn darwin_arm64() -> Platform {
    Platform::new(Os::Darwin, Arch::Arm64)
}

/// Release bytes plus a manifest whose arm64 checksum is `arm64_sha256`.
struct Fixture {
    archive: Vec<u8>,
    release: Release,
    prefix: TempDir,
}

impl Fixture {
    fn with_arm64_checksum(arm64_sha256: impl FnOnce(&[u8]) -> String) -> Self {
        let archive = tar_gz(&standard_archive_files("k8ctl"));
        let toml = k8ctl_release_toml(
            DEFAULT_URL,
            &"0".repeat(64),
            ARM64_URL,
            &arm64_sha256(&archive),
        );
        Self {
            release: parse_release_toml(&toml).expect("valid release"),
            archive,
            prefix: tempfile::tempdir().expect("temp dir"),
        }
    }

    fn settings(&self, policy: VerificationPolicy) -> InstallSettings {
        InstallSettings {
            roots: roots_under(self.prefix.path()),
            policy,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            smoke_test_timeout: DEFAULT_SMOKE_TEST_TIMEOUT,
        }
    }

    fn downloader(&self) -> MockArtefactDownloader {
        let bytes = self.archive.clone();
        let mut downloader = MockArtefactDownloader::new();
        downloader
            .expect_download()
            .withf(|url, _| url == RESOLVED_ARM64_URL)
            .times(1)
            .return_once(move |_, dest| std::fs::write(dest, bytes).map_err(DownloadError::Io));
        downloader
    }
}

#[fixture]
fn verified() -> Fixture {
    Fixture::with_arm64_checksum(sha256_hex)
}

fn runner_exiting(code: i32) -> MockProcessRunner {
    let mut runner = MockProcessRunner::new();
    runner
        .expect_run()
        .withf(|program, args, _| {
            program.file_name() == Some("k8ctl") && args.len() == 1 && args[0] == "version"
        })
        .times(1)
        .return_once(move |_, _, _| {
            Ok(ProcessOutcome::Exited {
                code: Some(code),
                stderr: String::new(),
            })
        });
    runner
}

fn idle_runner() -> MockProcessRunner {
    let mut runner = MockProcessRunner::new();
    runner.expect_run().never();
    runner
}

fn request<'a>(release: &'a Release, settings: &'a InstallSettings) -> InstallRequest<'a> {
    InstallRequest {
        release,
        platform: darwin_arm64(),
        settings,
        skip_smoke_test: false,
        quiet: false,
    }
}

#[rstest]
fn installs_arm64_artifact_end_to_end(verified: Fixture) {
    let settings = verified.settings(VerificationPolicy::default());
    let downloader = verified.downloader();
    let runner = runner_exiting(0);
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };
    let mut stderr = Vec::new();

    let report = run_install_with(&request(&verified.release, &settings), &collaborators, &mut stderr)
        .expect("install");

    assert_eq!(report.artifact, "darwin/arm64");
    assert_eq!(report.url, RESOLVED_ARM64_URL);
    assert!(report.checksum_verified);
    assert_eq!(report.placed.len(), 4);
    assert_eq!(report.smoke_test, SmokeTestOutcome::Passed);
    assert!(report.ensure_smoke_test_passed().is_ok());
    assert!(settings.roots.zsh_completion_dir.join("_k8ctl").is_file());

    let output = String::from_utf8(stderr).expect("utf-8 stderr");
    assert!(output.contains("Downloading https://example.test/v0.1.0/k8ctl_darwin_arm64.tar.gz"));
    assert!(output.contains("Verified sha256"));
    assert!(output.contains("Smoke test passed"));
}

#[rstest]
fn unsupported_platform_fails_before_download(verified: Fixture) {
    let settings = verified.settings(VerificationPolicy::default());
    let mut downloader = MockArtefactDownloader::new();
    downloader.expect_download().never();
    let runner = idle_runner();
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };
    let linux = InstallRequest {
        platform: Platform::new(Os::Linux, Arch::Amd64),
        ..request(&verified.release, &settings)
    };

    let err = run_install_with(&linux, &collaborators, &mut Vec::new()).expect_err("unsupported");
    match err {
        InstallerError::UnsupportedPlatform {
            platform,
            available,
        } => {
            assert_eq!(platform, "linux/amd64");
            assert!(available.contains("darwin/arm64"));
        }
        other => panic!("expected UnsupportedPlatform, got {other:?}"),
    }
}

#[test]
fn checksum_mismatch_writes_nothing() {
    let fixture = Fixture::with_arm64_checksum(|_| "f".repeat(64));
    let settings = fixture.settings(VerificationPolicy::default());
    let downloader = fixture.downloader();
    let runner = idle_runner();
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };

    let err = run_install_with(
        &request(&fixture.release, &settings),
        &collaborators,
        &mut Vec::new(),
    )
    .expect_err("mismatch");

    assert!(matches!(err, InstallerError::ChecksumMismatch { .. }));
    assert!(!settings.roots.bin_dir.exists());
}

#[rstest]
#[case::verbose(false)]
#[case::quiet(true)]
fn unverified_install_always_warns(#[case] quiet: bool) {
    let fixture = Fixture::with_arm64_checksum(|_| String::new());
    let settings = fixture.settings(VerificationPolicy::allow_unverified());
    let downloader = fixture.downloader();
    let runner = runner_exiting(0);
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };
    let mut stderr = Vec::new();

    let report = run_install_with(
        &InstallRequest {
            quiet,
            ..request(&fixture.release, &settings)
        },
        &collaborators,
        &mut stderr,
    )
    .expect("unverified install");

    assert!(!report.checksum_verified);
    let output = String::from_utf8(stderr).expect("utf-8 stderr");
    assert!(output.contains("WARNING"));
    assert!(output.contains(report.digest.as_str()));
}

#[test]
fn unset_checksum_is_refused_by_default() {
    let fixture = Fixture::with_arm64_checksum(|_| String::new());
    let settings = fixture.settings(VerificationPolicy::default());
    let mut downloader = MockArtefactDownloader::new();
    downloader.expect_download().never();
    let runner = idle_runner();
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };

    let err = run_install_with(
        &request(&fixture.release, &settings),
        &collaborators,
        &mut Vec::new(),
    )
    .expect_err("fail closed");
    assert!(matches!(err, InstallerError::ChecksumUnset { .. }));
}

#[rstest]
fn failed_smoke_test_keeps_files_and_reports_failure(verified: Fixture) {
    let settings = verified.settings(VerificationPolicy::default());
    let downloader = verified.downloader();
    let runner = runner_exiting(1);
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };

    let report = run_install_with(
        &request(&verified.release, &settings),
        &collaborators,
        &mut Vec::new(),
    )
    .expect("files placed");

    assert!(report.smoke_test.is_failure());
    let err = report.ensure_smoke_test_passed().expect_err("smoke test failed");
    assert!(matches!(err, InstallerError::SmokeTestFailed { .. }));
    assert!(settings.roots.bin_dir.join("k8ctl").is_file());
}

#[rstest]
fn skipped_smoke_test_does_not_run_binary(verified: Fixture) {
    let settings = verified.settings(VerificationPolicy::default());
    let downloader = verified.downloader();
    let runner = idle_runner();
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };

    let report = run_install_with(
        &InstallRequest {
            skip_smoke_test: true,
            ..request(&verified.release, &settings)
        },
        &collaborators,
        &mut Vec::new(),
    )
    .expect("install");
    assert_eq!(report.smoke_test, SmokeTestOutcome::Skipped);
}

#[rstest]
fn quiet_install_prints_nothing(verified: Fixture) {
    let settings = verified.settings(VerificationPolicy::default());
    let downloader = verified.downloader();
    let runner = runner_exiting(0);
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };
    let mut stderr = Vec::new();

    run_install_with(
        &InstallRequest {
            quiet: true,
            ..request(&verified.release, &settings)
        },
        &collaborators,
        &mut stderr,
    )
    .expect("install");
    assert!(stderr.is_empty());
}

#[rstest]
fn receipt_records_placed_files(verified: Fixture) {
    let settings = verified.settings(VerificationPolicy::default());
    let downloader = verified.downloader();
    let runner = runner_exiting(0);
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };
    let report = run_install_with(
        &request(&verified.release, &settings),
        &collaborators,
        &mut Vec::new(),
    )
    .expect("install");

    let receipt = report.receipt(42);
    assert_eq!(receipt.name, "k8ctl");
    assert_eq!(receipt.version, "0.1.0");
    assert_eq!(receipt.platform, "darwin/arm64");
    assert!(receipt.verified);
    assert_eq!(receipt.installed_at, 42);
    assert_eq!(receipt.files.first(), Some(&settings.roots.bin_dir.join("k8ctl")));
}

#[rstest]
fn plan_install_describes_without_side_effects(verified: Fixture) {
    let settings = verified.settings(VerificationPolicy::default());
    let info = plan_install(&request(&verified.release, &settings)).expect("plan");

    assert_eq!(info.artifact, "darwin/arm64");
    assert_eq!(info.url, RESOLVED_ARM64_URL);
    assert_eq!(
        info.homepage.as_deref(),
        Some("https://github.com/robertusnegoro/k8ctl")
    );
    assert_eq!(info.placements.len(), 4);
    assert_eq!(
        info.placements[3].1,
        settings.roots.fish_completion_dir.join("k8ctl.fish")
    );
    let binary = settings.roots.bin_dir.join("k8ctl");
    assert_eq!(info.smoke_test, Some(format!("{binary} version")));
    assert!(!settings.roots.bin_dir.exists());
}

#[rstest]
fn shared_destination_fails_before_download(verified: Fixture) {
    let mut settings = verified.settings(VerificationPolicy::default());
    settings.roots.bash_completion_dir = settings.roots.bin_dir.clone();
    let mut downloader = MockArtefactDownloader::new();
    downloader.expect_download().never();
    let runner = idle_runner();
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarExtractor,
        runner: &runner,
    };
    let request = request(&verified.release, &settings);

    let err = run_install_with(&request, &collaborators, &mut Vec::<u8>::new())
        .expect_err("collision");
    assert!(matches!(err, InstallerError::PlacementFailed { .. }), "got {err:?}");

    let planned = plan_install(&request).expect_err("dry run reports the collision");
    assert!(matches!(planned, InstallerError::PlacementFailed { .. }));
    assert!(!settings.roots.bin_dir.exists());
}

#[test]
fn plan_install_refuses_unset_checksum_by_default() {
    let fixture = Fixture::with_arm64_checksum(|_| String::new());
    let settings = fixture.settings(VerificationPolicy::default());
    let err = plan_install(&request(&fixture.release, &settings)).expect_err("fail closed");
    assert!(matches!(err, InstallerError::ChecksumUnset { .. }));
}

#[test]
fn smoke_test_binary_is_primary_executable() {
    let fixture = Fixture::with_arm64_checksum(sha256_hex);
    let settings = fixture.settings(VerificationPolicy::default());
    let binary = smoke_test_binary(&request(&fixture.release, &settings)).expect("executable");
    assert_eq!(binary.file_name(), Some("k8ctl"));
    assert!(binary.starts_with(Utf8Path::new(settings.roots.bin_dir.as_str())));
}
