//! Shared test utilities for the installer crate.
//!
//! Archive builders, digest helpers, and release-manifest fixtures used by
//! unit tests and, through the `test-support` feature, by the behaviour
//! tests.

use crate::artefact::release::ToolName;
use crate::destinations::DestinationRoots;
use crate::dirs::BaseDirs;
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file to place in a test archive.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    /// Path inside the archive.
    pub path: String,
    /// File contents.
    pub contents: Vec<u8>,
}

impl ArchiveFile {
    /// Create an archive file entry.
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Shell script standing in for the tool binary: exits 0 for `version`
/// and 1 for anything else.
pub const FAKE_TOOL_SCRIPT: &str =
    "#!/bin/sh\nif [ \"$1\" = version ]; then echo \"k8ctl 0.1.0\"; exit 0; fi\nexit 1\n";

/// The four files a standard release archive of `tool` contains.
pub fn standard_archive_files(tool: &str) -> Vec<ArchiveFile> {
    vec![
        ArchiveFile::new(tool, FAKE_TOOL_SCRIPT),
        ArchiveFile::new(
            format!("completions/bash/{tool}.bash"),
            format!("complete -F _{tool} {tool}\n"),
        ),
        ArchiveFile::new(
            format!("completions/zsh/_{tool}"),
            format!("#compdef {tool}\n"),
        ),
        ArchiveFile::new(
            format!("completions/fish/{tool}.fish"),
            format!("complete -c {tool}\n"),
        ),
    ]
}

fn append_files<W: Write>(builder: &mut tar::Builder<W>, files: &[ArchiveFile]) {
    for file in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(file.contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, &file.path, file.contents.as_slice())
            .expect("append archive entry");
    }
}

/// Build a gzip-compressed tarball in memory.
pub fn tar_gz(files: &[ArchiveFile]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_files(&mut builder, files);
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Build a zstd-compressed tarball in memory.
pub fn tar_zst(files: &[ArchiveFile]) -> Vec<u8> {
    let encoder = zstd::Encoder::new(Vec::new(), 0).expect("zstd encoder");
    let mut builder = tar::Builder::new(encoder);
    append_files(&mut builder, files);
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish zstd")
}

/// Hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    crate::artefact::sha256_digest::Sha256Digest::of_bytes(bytes).to_string()
}

/// Convert a temporary path to UTF-8.
pub fn utf8_path(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("temp path is UTF-8")
}

/// Destination roots laid out under `prefix`.
pub fn roots_under(prefix: &Path) -> DestinationRoots {
    DestinationRoots::from_prefix(&utf8_path(prefix))
}

/// The `file://` URL of `path`.
pub fn file_url(path: &Utf8Path) -> String {
    format!("file://{path}")
}

/// A `k8ctl` release manifest in TOML with a darwin default artifact and
/// a darwin/arm64 artifact.
///
/// `{version}` in the URLs is left for the installer to substitute.
pub fn k8ctl_release_toml(
    default_url: &str,
    default_sha256: &str,
    arm64_url: &str,
    arm64_sha256: &str,
) -> String {
    format!(
        concat!(
            "name = \"k8ctl\"\n",
            "version = \"0.1.0\"\n",
            "homepage = \"https://github.com/robertusnegoro/k8ctl\"\n\n",
            "[[artifacts]]\n",
            "os = \"darwin\"\n",
            "url = \"{default_url}\"\n",
            "sha256 = \"{default_sha256}\"\n\n",
            "[[artifacts]]\n",
            "os = \"darwin\"\n",
            "arch = \"arm64\"\n",
            "url = \"{arm64_url}\"\n",
            "sha256 = \"{arm64_sha256}\"\n\n",
            "[smoke_test]\n",
            "args = [\"version\"]\n",
        ),
        default_url = default_url,
        default_sha256 = default_sha256,
        arm64_url = arm64_url,
        arm64_sha256 = arm64_sha256,
    )
}

/// The `k8ctl` tool name.
pub fn k8ctl() -> ToolName {
    ToolName::try_from("k8ctl").expect("valid tool name")
}

/// Fixed [`BaseDirs`] for tests that cannot use the generated mock.
#[derive(Debug, Clone, Default)]
pub struct TestBaseDirs {
    /// Value returned by [`BaseDirs::home_dir`].
    pub home_dir: Option<PathBuf>,
    /// Value returned by [`BaseDirs::config_dir`].
    pub config_dir: Option<PathBuf>,
    /// Value returned by [`BaseDirs::data_dir`].
    pub data_dir: Option<PathBuf>,
}

impl TestBaseDirs {
    /// Point every directory somewhere under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            home_dir: Some(root.join("home")),
            config_dir: Some(root.join("config")),
            data_dir: Some(root.join("data")),
        }
    }
}

impl BaseDirs for TestBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir.clone()
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone()
    }
}

/// Whether the filesystem enforces directory write permissions for the
/// current user. Root and some container filesystems ignore them.
#[cfg(unix)]
pub fn permissions_enforced(dir: &Path) -> bool {
    let probe = dir.join(".permission-probe");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            false
        }
        Err(_) => true,
    }
}
