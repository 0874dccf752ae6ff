//! Release descriptions and per-platform artifact selection.
//!
//! A [`Release`] is the validated form of a release manifest file. It owns
//! the artifact table, keyed by `(os, arch)` where an absent architecture
//! marks the OS-wide default, together with the install manifest and the
//! smoke-test arguments.

use super::error::{ArtefactError, Result};
use super::manifest::{InstallEntry, InstallManifest};
use super::platform::{Arch, Os, Platform};
use super::verification::ExpectedChecksum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder substituted with the release version in artifact URLs.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// A tool name usable as a file name and receipt key.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::release::ToolName;
///
/// assert!(ToolName::try_from("k8ctl").is_ok());
/// assert!(ToolName::try_from("../k8ctl").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_tool_name(value: &str) -> Result<()> {
    let invalid = |reason: &str| ArtefactError::InvalidToolName {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };
    let Some(first) = value.chars().next() else {
        return Err(invalid("must not be empty"));
    };
    if !first.is_ascii_alphanumeric() {
        return Err(invalid("must start with a letter or digit"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(invalid(&format!("unexpected character '{bad}'")));
    }
    Ok(())
}

impl TryFrom<&str> for ToolName {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        validate_tool_name(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for ToolName {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        validate_tool_name(&value)?;
        Ok(Self(value))
    }
}

impl From<ToolName> for String {
    fn from(name: ToolName) -> Self {
        name.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A release version such as `0.1.0`.
///
/// Versions are opaque labels; the only constraint is that they are safe to
/// substitute into a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_version(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ArtefactError::InvalidVersion {
            reason: "version must not be empty".to_owned(),
        });
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_')))
    {
        return Err(ArtefactError::InvalidVersion {
            reason: format!("unexpected character '{bad}' in \"{value}\""),
        });
    }
    Ok(())
}

impl TryFrom<&str> for ReleaseVersion {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        validate_version(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        validate_version(&value)?;
        Ok(Self(value))
    }
}

impl From<ReleaseVersion> for String {
    fn from(version: ReleaseVersion) -> Self {
        version.0
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A downloadable archive for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    os: Os,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    arch: Option<Arch>,
    url: String,
    #[serde(default = "unset_checksum")]
    sha256: ExpectedChecksum,
}

fn unset_checksum() -> ExpectedChecksum {
    ExpectedChecksum::Unset
}

impl Artifact {
    /// Create an artifact entry. `arch: None` declares the OS-wide default.
    #[must_use]
    pub fn new(os: Os, arch: Option<Arch>, url: impl Into<String>, sha256: ExpectedChecksum) -> Self {
        Self {
            os,
            arch,
            url: url.into(),
            sha256,
        }
    }

    /// Target operating system.
    #[must_use]
    pub fn os(&self) -> Os {
        self.os
    }

    /// Target architecture, or `None` for the OS-wide default.
    #[must_use]
    pub fn arch(&self) -> Option<Arch> {
        self.arch
    }

    /// The published checksum.
    #[must_use]
    pub fn sha256(&self) -> &ExpectedChecksum {
        &self.sha256
    }

    /// The download URL with `{version}` substituted.
    ///
    /// # Examples
    ///
    /// ```
    /// use k8ctl_installer::artefact::platform::{Arch, Os};
    /// use k8ctl_installer::artefact::release::{Artifact, ReleaseVersion};
    /// use k8ctl_installer::artefact::verification::ExpectedChecksum;
    ///
    /// let artifact = Artifact::new(
    ///     Os::Linux,
    ///     Some(Arch::Amd64),
    ///     "https://example.test/v{version}/k8ctl.tar.gz",
    ///     ExpectedChecksum::Unset,
    /// );
    /// let version = ReleaseVersion::try_from("0.1.0").expect("valid version");
    /// assert_eq!(artifact.resolved_url(&version), "https://example.test/v0.1.0/k8ctl.tar.gz");
    /// ```
    #[must_use]
    pub fn resolved_url(&self, version: &ReleaseVersion) -> String {
        self.url.replace(VERSION_PLACEHOLDER, version.as_str())
    }

    /// A label for diagnostics: `darwin/arm64` or `darwin/*` for defaults.
    #[must_use]
    pub fn platform_label(&self) -> String {
        match self.arch {
            Some(arch) => format!("{}/{arch}", self.os),
            None => format!("{}/*", self.os),
        }
    }

    fn key(&self) -> (Os, Option<Arch>) {
        (self.os, self.arch)
    }
}

/// How to check that an installed tool runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmokeTest {
    /// Arguments passed to the installed executable.
    #[serde(default = "default_smoke_args")]
    pub args: Vec<String>,
}

fn default_smoke_args() -> Vec<String> {
    vec!["version".to_owned()]
}

impl Default for SmokeTest {
    fn default() -> Self {
        Self {
            args: default_smoke_args(),
        }
    }
}

/// The serialised shape of a release manifest.
///
/// Convert into a [`Release`] with `Release::try_from` to validate it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseDefinition {
    /// Tool name.
    pub name: ToolName,
    /// Release version.
    pub version: ReleaseVersion,
    /// One-line description.
    #[serde(default)]
    pub description: Option<String>,
    /// Project homepage.
    #[serde(default)]
    pub homepage: Option<String>,
    /// Declared artifacts.
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// Explicit install entries; the standard layout is used when absent.
    #[serde(default)]
    pub install: Option<Vec<InstallEntry>>,
    /// Smoke-test description.
    #[serde(default)]
    pub smoke_test: SmokeTest,
}

/// A validated release.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::platform::{Arch, Os, Platform};
/// use k8ctl_installer::artefact::release::{Artifact, Release, ReleaseDefinition};
/// use k8ctl_installer::artefact::verification::ExpectedChecksum;
///
/// let definition = ReleaseDefinition {
///     name: "k8ctl".try_into().expect("valid name"),
///     version: "0.1.0".try_into().expect("valid version"),
///     description: None,
///     homepage: None,
///     artifacts: vec![
///         Artifact::new(Os::Darwin, None, "https://example.test/amd64.tar.gz", ExpectedChecksum::Unset),
///         Artifact::new(Os::Darwin, Some(Arch::Arm64), "https://example.test/arm64.tar.gz", ExpectedChecksum::Unset),
///     ],
///     install: None,
///     smoke_test: Default::default(),
/// };
/// let release = Release::try_from(definition).expect("valid release");
/// let chosen = release
///     .select_artifact(&Platform::new(Os::Darwin, Arch::Arm64))
///     .expect("darwin is supported");
/// assert_eq!(chosen.arch(), Some(Arch::Arm64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ReleaseDefinition")]
pub struct Release {
    name: ToolName,
    version: ReleaseVersion,
    description: Option<String>,
    homepage: Option<String>,
    artifacts: BTreeMap<(Os, Option<Arch>), Artifact>,
    install: InstallManifest,
    smoke_test: SmokeTest,
}

impl TryFrom<ReleaseDefinition> for Release {
    type Error = ArtefactError;

    fn try_from(definition: ReleaseDefinition) -> Result<Self> {
        if definition.artifacts.is_empty() {
            return Err(ArtefactError::NoArtifacts {
                name: definition.name.to_string(),
            });
        }
        let mut artifacts = BTreeMap::new();
        for artifact in definition.artifacts {
            let label = artifact.platform_label();
            if artifacts.insert(artifact.key(), artifact).is_some() {
                return Err(ArtefactError::DuplicateArtifact { platform: label });
            }
        }
        let install = match definition.install {
            Some(entries) => InstallManifest::new(entries)?,
            None => InstallManifest::standard(&definition.name),
        };
        Ok(Self {
            name: definition.name,
            version: definition.version,
            description: definition.description,
            homepage: definition.homepage,
            artifacts,
            install,
            smoke_test: definition.smoke_test,
        })
    }
}

impl Release {
    /// Tool name.
    #[must_use]
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    /// Release version.
    #[must_use]
    pub fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Optional one-line description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Optional homepage URL.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Files to install.
    #[must_use]
    pub fn install_manifest(&self) -> &InstallManifest {
        &self.install
    }

    /// Smoke-test description.
    #[must_use]
    pub fn smoke_test(&self) -> &SmokeTest {
        &self.smoke_test
    }

    /// Choose the artifact for `platform`.
    ///
    /// An exact `(os, arch)` entry wins; otherwise the OS-wide default is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedPlatform`] when neither exists.
    pub fn select_artifact(&self, platform: &Platform) -> Result<&Artifact> {
        self.artifacts
            .get(&(platform.os, Some(platform.arch)))
            .or_else(|| self.artifacts.get(&(platform.os, None)))
            .ok_or_else(|| ArtefactError::UnsupportedPlatform {
                platform: platform.to_string(),
                available: self
                    .artifacts
                    .values()
                    .map(Artifact::platform_label)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn artifact(os: Os, arch: Option<Arch>) -> Artifact {
        let label = arch.map_or("default", Arch::as_str);
        Artifact::new(
            os,
            arch,
            format!("https://example.test/v{{version}}/{os}-{label}.tar.gz"),
            ExpectedChecksum::Unset,
        )
    }

    fn definition(artifacts: Vec<Artifact>) -> ReleaseDefinition {
        ReleaseDefinition {
            name: ToolName::try_from("k8ctl").expect("valid name"),
            version: ReleaseVersion::try_from("0.1.0").expect("valid version"),
            description: None,
            homepage: None,
            artifacts,
            install: None,
            smoke_test: SmokeTest::default(),
        }
    }

    #[fixture]
    fn darwin_release() -> Release {
        Release::try_from(definition(vec![
            artifact(Os::Darwin, None),
            artifact(Os::Darwin, Some(Arch::Arm64)),
        ]))
        .expect("valid release")
    }

    #[rstest]
    fn arm64_entry_wins_over_default(darwin_release: Release) {
        let chosen = darwin_release
            .select_artifact(&Platform::new(Os::Darwin, Arch::Arm64))
            .expect("supported");
        assert_eq!(chosen.arch(), Some(Arch::Arm64));
    }

    #[rstest]
    fn default_entry_covers_other_architectures(darwin_release: Release) {
        let chosen = darwin_release
            .select_artifact(&Platform::new(Os::Darwin, Arch::Amd64))
            .expect("supported");
        assert_eq!(chosen.arch(), None);
    }

    #[rstest]
    fn unmatched_os_is_unsupported(darwin_release: Release) {
        let err = darwin_release
            .select_artifact(&Platform::new(Os::Linux, Arch::Amd64))
            .expect_err("linux not declared");
        assert_eq!(
            err,
            ArtefactError::UnsupportedPlatform {
                platform: "linux/amd64".to_owned(),
                available: "darwin/*, darwin/arm64".to_owned(),
            }
        );
    }

    #[test]
    fn exact_only_release_rejects_other_arch() {
        let release = Release::try_from(definition(vec![artifact(Os::Linux, Some(Arch::Amd64))]))
            .expect("valid release");
        let err = release
            .select_artifact(&Platform::new(Os::Linux, Arch::Arm64))
            .expect_err("no default entry");
        assert!(matches!(err, ArtefactError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn duplicate_platform_is_rejected() {
        let err = Release::try_from(definition(vec![
            artifact(Os::Darwin, Some(Arch::Arm64)),
            artifact(Os::Darwin, Some(Arch::Arm64)),
        ]))
        .expect_err("duplicate");
        assert_eq!(
            err,
            ArtefactError::DuplicateArtifact {
                platform: "darwin/arm64".to_owned()
            }
        );
    }

    #[test]
    fn second_default_for_same_os_is_rejected() {
        let err = Release::try_from(definition(vec![
            artifact(Os::Darwin, None),
            artifact(Os::Darwin, None),
        ]))
        .expect_err("duplicate default");
        assert!(matches!(err, ArtefactError::DuplicateArtifact { .. }));
    }

    #[test]
    fn release_without_artifacts_is_rejected() {
        let err = Release::try_from(definition(Vec::new())).expect_err("empty");
        assert!(matches!(err, ArtefactError::NoArtifacts { .. }));
    }

    #[rstest]
    fn missing_install_table_uses_standard_layout(darwin_release: Release) {
        let expected = InstallManifest::standard(darwin_release.name());
        assert_eq!(darwin_release.install_manifest(), &expected);
    }

    #[test]
    fn resolved_url_substitutes_version() {
        let version = ReleaseVersion::try_from("0.1.0").expect("valid");
        let resolved = artifact(Os::Darwin, Some(Arch::Arm64)).resolved_url(&version);
        assert_eq!(resolved, "https://example.test/v0.1.0/darwin-arm64.tar.gz");
    }

    #[rstest]
    #[case::empty("")]
    #[case::slash("0.1/0")]
    #[case::space("0.1 0")]
    fn rejects_bad_versions(#[case] raw: &str) {
        assert!(ReleaseVersion::try_from(raw).is_err());
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_dot(".hidden")]
    #[case::slash("bin/k8ctl")]
    fn rejects_bad_tool_names(#[case] raw: &str) {
        assert!(ToolName::try_from(raw).is_err());
    }

    #[test]
    fn smoke_test_defaults_to_version() {
        assert_eq!(SmokeTest::default().args, vec!["version".to_owned()]);
    }
}
