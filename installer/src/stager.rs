//! Placement of archive contents into destination roots.
//!
//! [`install`] unpacks a [`VerifiedArchive`], checks that every file the
//! install manifest names is present, probes each destination root for
//! writability, and then copies files in manifest order. The first two
//! checks happen before anything is written; a failure during copying
//! reports the files that were already placed.
//!
//! Destination roots may be overridden independently, so two entries can
//! resolve to the same path. [`check_destinations`] rejects that before any
//! write.

use crate::artefact::extraction::ArtefactExtractor;
use crate::artefact::manifest::{DestinationCategory, InstallEntry, InstallManifest};
use crate::destinations::DestinationRoots;
use crate::error::{InstallerError, Result};
use crate::fetch::VerifiedArchive;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

const PROBE_PREFIX: &str = ".k8ctl-installer-probe";

/// A file written by the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFile {
    /// Path inside the archive.
    pub source: String,
    /// Where the file was written.
    pub destination: Utf8PathBuf,
    /// The destination category.
    pub category: DestinationCategory,
}

/// Copies manifest entries into their destination roots.
pub struct Stager<'a> {
    roots: &'a DestinationRoots,
}

impl<'a> Stager<'a> {
    /// Create a stager writing under `roots`.
    #[must_use]
    pub fn new(roots: &'a DestinationRoots) -> Self {
        Self { roots }
    }

    /// Ensure no two entries share a destination and every root used by
    /// `manifest` exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::PlacementFailed`] when two entries resolve
    /// to the same destination, [`InstallerError::WritePermissionDenied`]
    /// when a root cannot be created or written, or
    /// [`InstallerError::PlacementFailed`] for other I/O failures. Nothing
    /// has been installed when this fails.
    pub fn prepare(&self, manifest: &InstallManifest) -> Result<()> {
        check_destinations(manifest, self.roots)?;

        let roots: BTreeSet<&Utf8Path> = manifest
            .entries()
            .iter()
            .map(|entry| self.roots.root_for(entry.category()))
            .collect();

        for root in roots {
            fs::create_dir_all(root).map_err(|e| placement_error(root, &e, Vec::new()))?;
            // Verify writability by creating a throwaway file.
            tempfile::Builder::new()
                .prefix(PROBE_PREFIX)
                .tempfile_in(root)
                .map_err(|e| placement_error(root, &e, Vec::new()))?;
            log::trace!("destination root {root} is writable");
        }
        Ok(())
    }

    /// Copy every entry of `manifest` from `unpacked_dir`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::WritePermissionDenied`] or
    /// [`InstallerError::PlacementFailed`] listing the files written before
    /// the failure.
    pub fn place_all(
        &self,
        unpacked_dir: &Path,
        manifest: &InstallManifest,
    ) -> Result<Vec<PlacedFile>> {
        let mut placed: Vec<PlacedFile> = Vec::with_capacity(manifest.entries().len());
        for entry in manifest.entries() {
            let destination = self.roots.destination(entry);
            if let Err(err) = self.place(unpacked_dir, entry, &destination) {
                let written = placed.into_iter().map(|file| file.destination).collect();
                return Err(placement_error(&destination, &err, written));
            }
            log::debug!("placed {} at {destination}", entry.source());
            placed.push(PlacedFile {
                source: entry.source().to_owned(),
                destination,
                category: entry.category(),
            });
        }
        Ok(placed)
    }

    /// Write one file atomically: copy into a temporary sibling, set its
    /// mode, then rename over the destination.
    fn place(
        &self,
        unpacked_dir: &Path,
        entry: &InstallEntry,
        destination: &Utf8Path,
    ) -> std::io::Result<()> {
        let root = self.roots.root_for(entry.category());
        let mut source = fs::File::open(unpacked_dir.join(entry.source()))?;
        let mut staged = tempfile::Builder::new()
            .prefix(PROBE_PREFIX)
            .tempfile_in(root)?;
        std::io::copy(&mut source, staged.as_file_mut())?;
        set_mode(staged.as_file(), entry.category().mode())?;
        staged.persist(destination).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_mode(file: &fs::File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

fn placement_error(
    path: &Utf8Path,
    err: &std::io::Error,
    written: Vec<Utf8PathBuf>,
) -> InstallerError {
    if err.kind() == ErrorKind::PermissionDenied {
        InstallerError::WritePermissionDenied {
            path: path.to_owned(),
            reason: err.to_string(),
            written,
        }
    } else {
        InstallerError::PlacementFailed {
            path: path.to_owned(),
            reason: err.to_string(),
            written,
        }
    }
}

/// Fail unless every entry of `manifest` resolves to its own destination
/// under `roots`.
///
/// # Errors
///
/// Returns [`InstallerError::PlacementFailed`] naming the shared path and
/// both archive sources.
pub fn check_destinations(manifest: &InstallManifest, roots: &DestinationRoots) -> Result<()> {
    let mut claimed: BTreeMap<Utf8PathBuf, &InstallEntry> = BTreeMap::new();
    for entry in manifest.entries() {
        let destination = roots.destination(entry);
        if let Some(first) = claimed.get(&destination) {
            return Err(InstallerError::PlacementFailed {
                reason: format!(
                    "both {} and {} would be installed here",
                    first.source(),
                    entry.source()
                ),
                path: destination,
                written: Vec::new(),
            });
        }
        claimed.insert(destination, entry);
    }
    Ok(())
}

/// Fail with [`InstallerError::EntryMissingInArchive`] unless every
/// manifest source appears in `extracted`.
///
/// # Errors
///
/// Lists every missing source, in manifest order.
pub fn check_sources(manifest: &InstallManifest, extracted: &[PathBuf]) -> Result<()> {
    let present: BTreeSet<PathBuf> = extracted.iter().map(|p| normalise(p)).collect();
    let missing: Vec<String> = manifest
        .entries()
        .iter()
        .filter(|entry| !present.contains(&normalise(Path::new(entry.source()))))
        .map(|entry| entry.source().to_owned())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(InstallerError::EntryMissingInArchive { missing })
    }
}

fn normalise(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Unpack `archive` and place the files `manifest` names under `roots`.
///
/// # Errors
///
/// Returns [`InstallerError::ArchiveUnreadable`],
/// [`InstallerError::EntryMissingInArchive`],
/// [`InstallerError::WritePermissionDenied`] or
/// [`InstallerError::PlacementFailed`].
pub fn install(
    extractor: &dyn ArtefactExtractor,
    archive: &VerifiedArchive,
    manifest: &InstallManifest,
    roots: &DestinationRoots,
) -> Result<Vec<PlacedFile>> {
    let unpacked = tempfile::Builder::new()
        .prefix("k8ctl-installer-unpacked-")
        .tempdir()?;
    let extracted = extractor
        .extract(&archive.path(), unpacked.path())
        .map_err(|err| InstallerError::ArchiveUnreadable {
            reason: err.to_string(),
        })?;
    log::debug!("archive holds {} files", extracted.len());

    check_sources(manifest, &extracted)?;

    let stager = Stager::new(roots);
    stager.prepare(manifest)?;
    stager.place_all(unpacked.path(), manifest)
}

#[cfg(test)]
#[path = "stager_tests.rs"]
mod tests;
