//! Release archive download.
//!
//! Provides a trait-based abstraction for fetching an artifact URL into a
//! local file, enabling dependency injection for testing. The production
//! implementation speaks `http`/`https` through a `ureq` agent and copies
//! `file://` URLs from the local filesystem. `file://` URLs may name
//! `localhost` as their host and may percent-encode the path.

use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default network timeout for archive downloads.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for downloading release archives.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::download::{DEFAULT_DOWNLOAD_TIMEOUT, HttpDownloader};
///
/// let downloader = HttpDownloader::new(DEFAULT_DOWNLOAD_TIMEOUT);
/// // Use downloader.download(url, dest) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download `url` and write the body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the file write fails.
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from artefact download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed or timed out.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested artefact was not found (HTTP 404 or missing file).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that was not found.
        url: String,
    },

    /// The URL could not be parsed, or a `file://` URL names a remote host.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why the URL was rejected.
        reason: String,
    },

    /// The URL scheme is not `http`, `https` or `file`.
    #[error("unsupported URL scheme in {url}; expected http, https or file")]
    UnsupportedScheme {
        /// The rejected URL.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloader backed by a `ureq` agent with a global request timeout.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    /// Build a downloader whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn download_http(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file).map_err(|e| {
            DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOAD_TIMEOUT)
    }
}

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!("downloading {url} to {}", dest.display());
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => self.download_http(url, dest),
            "file" => {
                let local = parsed
                    .to_file_path()
                    .map_err(|()| DownloadError::InvalidUrl {
                        url: url.to_owned(),
                        reason: "not a local file path".to_owned(),
                    })?;
                copy_local(url, &local, dest)
            }
            _ => Err(DownloadError::UnsupportedScheme {
                url: url.to_owned(),
            }),
        }
    }
}

/// Copy a `file://` artifact into place.
fn copy_local(url: &str, source: &Path, dest: &Path) -> Result<(), DownloadError> {
    if !source.is_file() {
        return Err(DownloadError::NotFound {
            url: url.to_owned(),
        });
    }
    std::fs::copy(source, dest)?;
    Ok(())
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(status) => DownloadError::HttpError {
            url: url.to_owned(),
            reason: format!("server responded with HTTP {status}"),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
