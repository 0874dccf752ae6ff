//! Checksum expectations and the policy for unpublished checksums.
//!
//! Release manifests are authored before the archives exist, so the
//! `sha256` field starts out blank and is filled in by release automation.
//! A blank field is modelled explicitly as [`ExpectedChecksum::Unset`] and
//! the installer refuses to use such an artifact unless the caller opts in
//! through [`VerificationPolicy::allow_unverified`].

use super::error::ArtefactError;
use super::sha256_digest::Sha256Digest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The checksum a release manifest declares for an artifact.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::verification::ExpectedChecksum;
///
/// let unset = ExpectedChecksum::try_from(String::new()).expect("blank is allowed");
/// assert!(unset.is_unset());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExpectedChecksum {
    /// A published SHA-256 digest.
    Sha256(Sha256Digest),
    /// No digest has been published yet.
    Unset,
}

impl ExpectedChecksum {
    /// Whether the manifest left the checksum blank.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Return the published digest, if any.
    #[must_use]
    pub fn digest(&self) -> Option<&Sha256Digest> {
        match self {
            Self::Sha256(digest) => Some(digest),
            Self::Unset => None,
        }
    }
}

impl TryFrom<String> for ExpectedChecksum {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unset);
        }
        Ok(Self::Sha256(Sha256Digest::try_from(trimmed)?))
    }
}

impl From<ExpectedChecksum> for String {
    fn from(checksum: ExpectedChecksum) -> Self {
        match checksum {
            ExpectedChecksum::Sha256(digest) => digest.as_str().to_owned(),
            ExpectedChecksum::Unset => String::new(),
        }
    }
}

impl fmt::Display for ExpectedChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256(digest) => write!(f, "sha256:{digest}"),
            Self::Unset => f.write_str("unset"),
        }
    }
}

/// Policy governing how a downloaded artifact is verified before use.
///
/// Checksums are always compared when the manifest publishes one; the
/// policy only decides what happens when it does not.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::verification::VerificationPolicy;
///
/// let policy = VerificationPolicy::default();
/// assert!(!policy.allows_unverified());
/// assert!(VerificationPolicy::allow_unverified().allows_unverified());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerificationPolicy {
    allow_unverified: bool,
}

impl VerificationPolicy {
    /// The fail-closed default: refuse artifacts without a checksum.
    #[must_use]
    pub const fn require_checksum() -> Self {
        Self {
            allow_unverified: false,
        }
    }

    /// Permit artifacts whose checksum is unset, with a warning.
    #[must_use]
    pub const fn allow_unverified() -> Self {
        Self {
            allow_unverified: true,
        }
    }

    /// Build a policy from a boolean opt-in flag.
    #[must_use]
    pub const fn from_opt_in(allow_unverified: bool) -> Self {
        Self { allow_unverified }
    }

    /// Whether artifacts with an unset checksum may be installed.
    #[must_use]
    pub const fn allows_unverified(self) -> bool {
        self.allow_unverified
    }
}

impl fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allow_unverified {
            write!(f, "checksum verified when published; unverified installs allowed")
        } else {
            write!(f, "checksum verification required")
        }
    }
}
