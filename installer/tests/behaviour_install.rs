//! End-to-end CLI behaviour tests for `k8ctl-installer`.
//!
//! These scenarios run the installer binary against a release manifest whose
//! archives are served from `file://` URLs. The per-user directories are
//! redirected into a temporary directory through `HOME` and the XDG
//! variables. The archived binary is a shell script, so the suite is
//! Unix-only.
#![cfg(unix)]

use k8ctl_installer::test_utils::{
    ArchiveFile, file_url, k8ctl_release_toml, sha256_hex, standard_archive_files, tar_gz,
    utf8_path,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliWorld {
    temp: TempDir,
    manifest: RefCell<Option<PathBuf>>,
    output: RefCell<Option<Output>>,
}

#[fixture]
fn cli_world() -> CliWorld {
    CliWorld {
        temp: tempfile::tempdir().expect("temp dir"),
        manifest: RefCell::new(None),
        output: RefCell::new(None),
    }
}

impl CliWorld {
    fn prefix(&self) -> PathBuf {
        self.temp.path().join("prefix")
    }

    /// Write `files` as the darwin archives of a k8ctl 0.1.0 release.
    fn publish(&self, files: &[ArchiveFile]) {
        let root = utf8_path(self.temp.path());
        let archive = tar_gz(files);
        let archive_path = root.join("k8ctl_0.1.0_darwin.tar.gz");
        std::fs::write(&archive_path, &archive).expect("write archive");

        let url = file_url(&archive_path);
        let sha = sha256_hex(&archive);
        let manifest = root.join("k8ctl.toml");
        std::fs::write(&manifest, k8ctl_release_toml(&url, &sha, &url, &sha))
            .expect("write release manifest");
        self.manifest.replace(Some(manifest.into_std_path_buf()));
    }

    /// Run the installer binary. `install` invocations get the release
    /// manifest and the scenario's prefix appended.
    fn run(&self, command_line: &str) -> Output {
        let mut args: Vec<String> = command_line
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        if args.first().map(String::as_str) == Some("install") {
            let manifest = self.manifest.borrow();
            let manifest = manifest.as_ref().expect("release not published");
            args.insert(1, manifest.display().to_string());
            args.push("--prefix".to_owned());
            args.push(self.prefix().display().to_string());
        }

        let root = self.temp.path();
        Command::new(env!("CARGO_BIN_EXE_k8ctl-installer"))
            .args(&args)
            .env("HOME", root.join("home"))
            .env("XDG_CONFIG_HOME", root.join("config"))
            .env("XDG_DATA_HOME", root.join("data"))
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run k8ctl-installer")
    }

    fn stderr(&self) -> String {
        let output = self.output.borrow();
        let output = output.as_ref().expect("installer not run");
        String::from_utf8_lossy(&output.stderr).into_owned()
    }
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "installer failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[given("a k8ctl 0.1.0 release served from local files")]
fn given_local_release(cli_world: &CliWorld) {
    cli_world.publish(&standard_archive_files("k8ctl"));
}

#[given("a k8ctl 0.1.0 release whose binary exits with an error")]
fn given_broken_release(cli_world: &CliWorld) {
    let mut files = standard_archive_files("k8ctl");
    files[0] = ArchiveFile::new(
        "k8ctl",
        "#!/bin/sh\necho 'dyld: library not loaded' >&2\nexit 1\n",
    );
    cli_world.publish(&files);
}

#[given("the installer has installed it for darwin/arm64")]
fn given_installed(cli_world: &CliWorld) {
    assert_success(&cli_world.run("install --platform darwin/arm64"));
}

#[when("the installer runs \"{command}\"")]
fn when_installer_runs(cli_world: &CliWorld, command: String) {
    let output = cli_world.run(&command);
    cli_world.output.replace(Some(output));
}

#[then("the installer exits successfully")]
fn then_exits_successfully(cli_world: &CliWorld) {
    let output = cli_world.output.borrow();
    assert_success(output.as_ref().expect("installer not run"));
}

#[then("the installer exits with status {code:i32}")]
fn then_exits_with(cli_world: &CliWorld, code: i32) {
    let output = cli_world.output.borrow();
    let output = output.as_ref().expect("installer not run");
    assert_eq!(output.status.code(), Some(code));
}

#[then("stderr mentions \"{text}\"")]
fn then_stderr_mentions(cli_world: &CliWorld, text: String) {
    let stderr = cli_world.stderr();
    assert!(stderr.contains(&text), "stderr did not mention {text:?}:\n{stderr}");
}

#[then("the installed k8ctl answers \"{arg}\" with \"{expected}\"")]
fn then_installed_binary_answers(cli_world: &CliWorld, arg: String, expected: String) {
    let binary = cli_world.prefix().join("bin").join("k8ctl");
    let output = Command::new(&binary)
        .arg(&arg)
        .output()
        .expect("run installed k8ctl");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), expected);
}

#[then("the listing records k8ctl 0.1.0 for \"{platform}\" with {count:usize} files")]
fn then_listing_records(cli_world: &CliWorld, platform: String, count: usize) {
    let output = cli_world.output.borrow();
    let output = output.as_ref().expect("installer not run");
    let listing: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list --json prints JSON");

    let installed = listing["installed"].as_array().expect("installed array");
    assert_eq!(installed.len(), 1);
    let receipt = &installed[0];
    assert_eq!(receipt["name"], "k8ctl");
    assert_eq!(receipt["version"], "0.1.0");
    assert_eq!(receipt["platform"], platform.as_str());
    assert_eq!(receipt["verified"], true);
    assert_eq!(
        receipt["files"].as_array().map(Vec::len),
        Some(count),
        "unexpected files in {receipt}"
    );
}

#[then("the prefix is untouched")]
fn then_prefix_untouched(cli_world: &CliWorld) {
    assert!(!cli_world.prefix().exists());
}

#[scenario(
    path = "tests/features/end_to_end.feature",
    name = "Installing k8ctl 0.1.0 on an Apple silicon Mac"
)]
fn scenario_install_on_apple_silicon(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(
    path = "tests/features/end_to_end.feature",
    name = "Listing tools after an install"
)]
fn scenario_list_after_install(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(
    path = "tests/features/end_to_end.feature",
    name = "A dry run describes the install without writing"
)]
fn scenario_dry_run(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(
    path = "tests/features/end_to_end.feature",
    name = "A broken binary fails the smoke test"
)]
fn scenario_broken_binary(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(
    path = "tests/features/end_to_end.feature",
    name = "A platform without an archive is refused"
)]
fn scenario_unsupported_platform(cli_world: CliWorld) {
    let _ = cli_world;
}
