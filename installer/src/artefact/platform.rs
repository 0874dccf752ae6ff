//! Platform descriptors used to key release artifacts.
//!
//! Release archives are published per operating system and CPU architecture
//! using Go-style names (`darwin`, `amd64`, `arm64`). The host's Rust names
//! (`macos`, `x86_64`, `aarch64`) are accepted as aliases so that the
//! installer can describe its own platform without a translation table at
//! every call site.

use super::error::{ArtefactError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating systems that release artifacts may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Os {
    /// Apple macOS.
    Darwin,
    /// Linux.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// FreeBSD.
    FreeBsd,
}

const OS_NAMES: &[&str] = &["darwin", "linux", "windows", "freebsd"];

impl Os {
    /// Return the canonical release-manifest spelling.
    ///
    /// # Examples
    ///
    /// ```
    /// use k8ctl_installer::artefact::platform::Os;
    ///
    /// assert_eq!(Os::Darwin.as_str(), "darwin");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::FreeBsd => "freebsd",
        }
    }
}

impl FromStr for Os {
    type Err = ArtefactError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" | "osx" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            "windows" | "win" => Ok(Self::Windows),
            "freebsd" => Ok(Self::FreeBsd),
            _ => Err(ArtefactError::UnsupportedOs {
                value: value.to_owned(),
                expected: OS_NAMES.join(", "),
            }),
        }
    }
}

impl TryFrom<String> for Os {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Os> for String {
    fn from(os: Os) -> Self {
        os.as_str().to_owned()
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architectures that release artifacts may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
    /// 64-bit x86.
    Amd64,
    /// 64-bit ARM.
    Arm64,
    /// 32-bit x86.
    I386,
    /// 32-bit ARM.
    Arm,
}

const ARCH_NAMES: &[&str] = &["amd64", "arm64", "386", "arm"];

impl Arch {
    /// Return the canonical release-manifest spelling.
    ///
    /// # Examples
    ///
    /// ```
    /// use k8ctl_installer::artefact::platform::Arch;
    ///
    /// assert_eq!(Arch::Arm64.as_str(), "arm64");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::I386 => "386",
            Self::Arm => "arm",
        }
    }
}

impl FromStr for Arch {
    type Err = ArtefactError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "386" | "i386" | "i686" | "x86" => Ok(Self::I386),
            "arm" | "armv7" | "armv6" => Ok(Self::Arm),
            _ => Err(ArtefactError::UnsupportedArch {
                value: value.to_owned(),
                expected: ARCH_NAMES.join(", "),
            }),
        }
    }
}

impl TryFrom<String> for Arch {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.as_str().to_owned()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `(os, arch)` pair describing the machine an artifact runs on.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::platform::{Arch, Os, Platform};
///
/// let platform: Platform = "darwin/arm64".parse().expect("valid platform");
/// assert_eq!(platform, Platform::new(Os::Darwin, Arch::Arm64));
/// assert_eq!(platform.to_string(), "darwin/arm64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Create a platform descriptor.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Describe the machine this installer was compiled for.
    ///
    /// # Errors
    ///
    /// Returns an error when the compile-time OS or architecture has no
    /// release-manifest equivalent (for example `wasm32`).
    pub fn host() -> Result<Self> {
        Self::from_rust_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a platform from Rust's `std::env::consts` spellings.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedOs`] or
    /// [`ArtefactError::UnsupportedArch`] for unknown names.
    pub fn from_rust_names(os: &str, arch: &str) -> Result<Self> {
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

impl FromStr for Platform {
    type Err = ArtefactError;

    fn from_str(value: &str) -> Result<Self> {
        let Some((os, arch)) = value.split_once(|c: char| matches!(c, '/' | '-' | '_')) else {
            return Err(ArtefactError::InvalidPlatform {
                value: value.to_owned(),
            });
        };
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
