//! Error types for release manifest values and artifact selection.
//!
//! Each variant provides a descriptive message identifying the invalid input
//! and the constraint that was violated.

use thiserror::Error;

/// Errors arising from invalid release-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// The operating system name is not one the installer knows.
    #[error("unsupported operating system \"{value}\"; expected one of: {expected}")]
    UnsupportedOs {
        /// The rejected OS string.
        value: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },

    /// The CPU architecture name is not one the installer knows.
    #[error("unsupported CPU architecture \"{value}\"; expected one of: {expected}")]
    UnsupportedArch {
        /// The rejected architecture string.
        value: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },

    /// A platform descriptor is not of the form `os/arch`.
    #[error("invalid platform \"{value}\"; expected OS/ARCH, for example darwin/arm64")]
    InvalidPlatform {
        /// The rejected platform string.
        value: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A release version string is empty or syntactically invalid.
    #[error("invalid release version: {reason}")]
    InvalidVersion {
        /// Description of the validation failure.
        reason: String,
    },

    /// A tool name is empty or cannot be used as a file name.
    #[error("invalid tool name \"{value}\": {reason}")]
    InvalidToolName {
        /// The rejected name.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The release declares no artifacts at all.
    #[error("release {name} declares no artifacts")]
    NoArtifacts {
        /// Name of the release.
        name: String,
    },

    /// Two artifacts claim the same platform key.
    #[error("release declares more than one artifact for {platform}")]
    DuplicateArtifact {
        /// The platform key that was declared twice.
        platform: String,
    },

    /// An install manifest entry is malformed.
    #[error("invalid install entry \"{path}\": {reason}")]
    InvalidInstallEntry {
        /// The offending source or destination path.
        path: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// No declared artifact matches the requested platform.
    #[error("no artifact for platform {platform}; release provides: {available}")]
    UnsupportedPlatform {
        /// The requested platform, rendered as `os/arch`.
        platform: String,
        /// Comma-separated list of declared platforms.
        available: String,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
