//! Release manifest loading.
//!
//! Release manifests are TOML or JSON documents. All newtype validation
//! (platform names, digests, install entries, artifact uniqueness) runs
//! during deserialisation, so a successfully parsed [`Release`] is ready
//! for artifact selection.

use super::release::Release;
use std::path::{Path, PathBuf};

/// Errors arising from release manifest parsing.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseParseError {
    /// TOML deserialisation or field validation failed.
    #[error("release manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON deserialisation or field validation failed.
    #[error("release manifest parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest file could not be read.
    #[error("failed to read release manifest {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported release manifest format for {path}; expected .toml or .json")]
    UnsupportedFormat {
        /// Path with the unrecognised extension.
        path: PathBuf,
    },
}

/// Parse a TOML release manifest.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or any field fails validation.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::release_parser::parse_release_toml;
///
/// let release = parse_release_toml(r#"
/// name = "k8ctl"
/// version = "0.1.0"
///
/// [[artifacts]]
/// os = "linux"
/// url = "https://example.test/k8ctl.tar.gz"
/// sha256 = ""
/// "#).expect("valid manifest");
/// assert_eq!(release.name().as_str(), "k8ctl");
/// ```
pub fn parse_release_toml(text: &str) -> Result<Release, ReleaseParseError> {
    Ok(toml::from_str(text)?)
}

/// Parse a JSON release manifest.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or any field fails validation.
pub fn parse_release_json(text: &str) -> Result<Release, ReleaseParseError> {
    Ok(serde_json::from_str(text)?)
}

/// Read and parse the release manifest at `path`, choosing the format from
/// its extension.
///
/// # Errors
///
/// Returns [`ReleaseParseError::UnsupportedFormat`] for unknown
/// extensions, [`ReleaseParseError::Read`] when the file cannot be read,
/// and a parse error when its contents are invalid.
pub fn load_release(path: &Path) -> Result<Release, ReleaseParseError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    let parse: fn(&str) -> Result<Release, ReleaseParseError> = match extension.as_deref() {
        Some("toml") => parse_release_toml,
        Some("json") => parse_release_json,
        _ => {
            return Err(ReleaseParseError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    let text = std::fs::read_to_string(path).map_err(|source| ReleaseParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("parsing release manifest {}", path.display());
    parse(&text)
}
