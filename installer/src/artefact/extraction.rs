//! Archive extraction for release artifacts.
//!
//! Extracts gzip- or zstd-compressed tarballs to a scratch directory with
//! path traversal protection to prevent zip-slip attacks. The compression
//! format is detected from the archive's leading magic bytes rather than
//! its URL, since release hosts do not always preserve file names.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Compression formats the installer can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.tar.gz`
    TarGz,
    /// `.tar.zst`
    TarZst,
}

impl ArchiveFormat {
    /// Identify the format from the first bytes of an archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use k8ctl_installer::artefact::extraction::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_magic(&[0x1f, 0x8b, 0x08]), Some(ArchiveFormat::TarGz));
    /// assert_eq!(ArchiveFormat::from_magic(b"PK\x03\x04"), None);
    /// ```
    #[must_use]
    pub fn from_magic(header: &[u8]) -> Option<Self> {
        if header.starts_with(&GZIP_MAGIC) {
            Some(Self::TarGz)
        } else if header.starts_with(&ZSTD_MAGIC) {
            Some(Self::TarZst)
        } else {
            None
        }
    }

    /// Sniff the format of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnknownFormat`] when the magic bytes
    /// match neither gzip nor zstd, or an I/O error if the file cannot be
    /// read.
    pub fn detect(path: &Path) -> Result<Self, ExtractionError> {
        let mut header = Vec::with_capacity(ZSTD_MAGIC.len());
        File::open(path)?
            .take(ZSTD_MAGIC.len() as u64)
            .read_to_end(&mut header)?;
        Self::from_magic(&header).ok_or(ExtractionError::UnknownFormat)
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TarGz => f.write_str("tar.gz"),
            Self::TarZst => f.write_str("tar.zst"),
        }
    }
}

/// Trait for extracting artefact archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::extraction::TarExtractor;
///
/// let extractor = TarExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the paths of the regular files that were extracted,
    /// relative to `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory.
    /// Returns [`ExtractionError::EmptyArchive`] if no files are found.
    /// Returns [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive holds a link or device entry.
    #[error("unsupported archive entry {path}: only files and directories are allowed")]
    UnsupportedEntry {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,

    /// The archive is neither gzip nor zstd compressed.
    #[error("archive is not a gzip or zstd compressed tarball")]
    UnknownFormat,
}

/// Default extractor using the `tar`, `flate2` and `zstd` crates.
///
/// Validates each entry path before extraction to guard against
/// path traversal attacks (zip-slip).
pub struct TarExtractor;

impl ArtefactExtractor for TarExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let format = ArchiveFormat::detect(archive_path)?;
        log::debug!("extracting {format} archive {}", archive_path.display());
        let file = BufReader::new(File::open(archive_path)?);
        match format {
            ArchiveFormat::TarGz => unpack(flate2::read::GzDecoder::new(file), dest_dir),
            ArchiveFormat::TarZst => unpack(zstd::Decoder::with_buffer(file)?, dest_dir),
        }
    }
}

fn unpack(reader: impl Read, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        let relative = validate_entry_path(&entry_path)?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            std::fs::create_dir_all(dest_dir.join(&relative))?;
            continue;
        }
        if !entry_type.is_file() {
            return Err(ExtractionError::UnsupportedEntry {
                path: entry_path.display().to_string(),
            });
        }
        if relative.as_os_str().is_empty() {
            continue;
        }

        let dest_path = dest_dir.join(&relative);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest_path)?;
        log::trace!("extracted {}", relative.display());
        extracted.push(relative);
    }

    if extracted.is_empty() {
        return Err(ExtractionError::EmptyArchive);
    }

    Ok(extracted)
}

/// Validate that a tar entry path does not escape the destination
/// directory and return it with `.` components removed.
fn validate_entry_path(path: &Path) -> Result<PathBuf, ExtractionError> {
    let traversal = || ExtractionError::PathTraversal {
        path: path.display().to_string(),
    };
    if path.is_absolute() || path.has_root() {
        return Err(traversal());
    }
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(traversal());
            }
        }
    }
    Ok(relative)
}
