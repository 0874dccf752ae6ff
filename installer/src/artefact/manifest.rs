//! Install manifest types describing where archive contents are placed.
//!
//! An install manifest is an ordered list of entries, each mapping a file
//! inside the release archive to a destination name under one of the
//! destination roots. The roots themselves are chosen by the host (see
//! [`crate::destinations::DestinationRoots`]); the manifest only ever names
//! a category and a plain file name.

use super::error::{ArtefactError, Result};
use super::release::ToolName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

/// Shells whose completion scripts may ship inside a release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shell {
    /// GNU Bash.
    Bash,
    /// Z shell.
    Zsh,
    /// Fish shell.
    Fish,
}

impl Shell {
    /// Every supported shell, in the order completions are installed.
    pub const ALL: [Self; 3] = [Self::Bash, Self::Zsh, Self::Fish];

    /// Return the lowercase shell name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }

    /// Path of the completion script inside a standard release archive.
    #[must_use]
    pub fn archive_path(self, tool: &ToolName) -> String {
        match self {
            Self::Bash => format!("completions/bash/{tool}.bash"),
            Self::Zsh => format!("completions/zsh/_{tool}"),
            Self::Fish => format!("completions/fish/{tool}.fish"),
        }
    }

    /// File name the shell expects for the tool's completion script.
    ///
    /// # Examples
    ///
    /// ```
    /// use k8ctl_installer::artefact::manifest::Shell;
    /// use k8ctl_installer::artefact::release::ToolName;
    ///
    /// let tool = ToolName::try_from("k8ctl").expect("valid name");
    /// assert_eq!(Shell::Bash.completion_filename(&tool), "k8ctl");
    /// assert_eq!(Shell::Zsh.completion_filename(&tool), "_k8ctl");
    /// assert_eq!(Shell::Fish.completion_filename(&tool), "k8ctl.fish");
    /// ```
    #[must_use]
    pub fn completion_filename(self, tool: &ToolName) -> String {
        match self {
            Self::Bash => tool.as_str().to_owned(),
            Self::Zsh => format!("_{tool}"),
            Self::Fish => format!("{tool}.fish"),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of destination an install entry is copied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DestinationCategory {
    /// The executable directory.
    Executable,
    /// A shell's completion directory.
    Completion(Shell),
}

impl DestinationCategory {
    /// Unix permission bits applied to files of this category.
    #[must_use]
    pub const fn mode(self) -> u32 {
        match self {
            Self::Executable => 0o755,
            Self::Completion(_) => 0o644,
        }
    }
}

impl FromStr for DestinationCategory {
    type Err = ArtefactError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "executable" | "bin" => Ok(Self::Executable),
            "completion:bash" => Ok(Self::Completion(Shell::Bash)),
            "completion:zsh" => Ok(Self::Completion(Shell::Zsh)),
            "completion:fish" => Ok(Self::Completion(Shell::Fish)),
            other => Err(ArtefactError::InvalidInstallEntry {
                path: other.to_owned(),
                reason: "unknown category; expected executable, completion:bash, \
                         completion:zsh or completion:fish"
                    .to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for DestinationCategory {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DestinationCategory> for String {
    fn from(category: DestinationCategory) -> Self {
        category.to_string()
    }
}

impl fmt::Display for DestinationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executable => f.write_str("executable"),
            Self::Completion(shell) => write!(f, "completion:{shell}"),
        }
    }
}

/// The serialised shape of an install entry, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInstallEntry {
    source: String,
    category: DestinationCategory,
    #[serde(default)]
    name: Option<String>,
}

/// One file to copy out of the archive.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::manifest::{DestinationCategory, InstallEntry};
///
/// let entry = InstallEntry::new("bin/k8ctl", DestinationCategory::Executable, "k8ctl")
///     .expect("valid entry");
/// assert_eq!(entry.source(), "bin/k8ctl");
/// assert!(InstallEntry::new("../k8ctl", DestinationCategory::Executable, "k8ctl").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInstallEntry")]
pub struct InstallEntry {
    source: String,
    category: DestinationCategory,
    name: String,
}

impl InstallEntry {
    /// Create a validated install entry.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::InvalidInstallEntry`] when `source` is not a
    /// relative path inside the archive or `name` is not a plain file name.
    pub fn new(
        source: impl Into<String>,
        category: DestinationCategory,
        name: impl Into<String>,
    ) -> Result<Self> {
        let source = source.into();
        let name = name.into();
        validate_source(&source)?;
        validate_destination_name(&name)?;
        Ok(Self {
            source,
            category,
            name,
        })
    }

    /// Path of the file inside the unpacked archive.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Destination category.
    #[must_use]
    pub fn category(&self) -> DestinationCategory {
        self.category
    }

    /// File name at the destination.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<RawInstallEntry> for InstallEntry {
    type Error = ArtefactError;

    fn try_from(raw: RawInstallEntry) -> Result<Self> {
        let name = match raw.name {
            Some(name) => name,
            None => default_name(&raw.source)?,
        };
        Self::new(raw.source, raw.category, name)
    }
}

/// Derive a destination name from the last component of `source`.
fn default_name(source: &str) -> Result<String> {
    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ArtefactError::InvalidInstallEntry {
            path: source.to_owned(),
            reason: "source has no file name to use as the destination".to_owned(),
        })
}

fn validate_source(source: &str) -> Result<()> {
    let invalid = |reason: &str| ArtefactError::InvalidInstallEntry {
        path: source.to_owned(),
        reason: reason.to_owned(),
    };
    if source.trim().is_empty() {
        return Err(invalid("source must not be empty"));
    }
    let path = Path::new(source);
    if path.has_root() || path.is_absolute() {
        return Err(invalid("source must be relative to the archive root"));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(invalid("source must not leave the archive"));
    }
    if !path.components().any(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid("source must name a file"));
    }
    Ok(())
}

fn validate_destination_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| ArtefactError::InvalidInstallEntry {
        path: name.to_owned(),
        reason: reason.to_owned(),
    };
    if name.is_empty() {
        return Err(invalid("destination name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("destination name must be a file name"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("destination name must not contain path separators"));
    }
    Ok(())
}

/// The ordered set of files a release installs.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::artefact::manifest::InstallManifest;
/// use k8ctl_installer::artefact::release::ToolName;
///
/// let tool = ToolName::try_from("k8ctl").expect("valid name");
/// let manifest = InstallManifest::standard(&tool);
/// assert_eq!(manifest.entries().len(), 4);
/// assert_eq!(manifest.primary_executable().map(|e| e.name()), Some("k8ctl"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InstallManifest {
    entries: Vec<InstallEntry>,
}

impl InstallManifest {
    /// Build a manifest from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::InvalidInstallEntry`] when the list is empty
    /// or two entries target the same destination.
    pub fn new(entries: Vec<InstallEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ArtefactError::InvalidInstallEntry {
                path: String::new(),
                reason: "install manifest must list at least one file".to_owned(),
            });
        }
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !seen.insert((entry.category, entry.name.as_str())) {
                return Err(ArtefactError::InvalidInstallEntry {
                    path: entry.name.clone(),
                    reason: format!("{} destination declared more than once", entry.category),
                });
            }
        }
        Ok(Self { entries })
    }

    /// The conventional layout: the binary at the archive root plus one
    /// completion script per shell under `completions/`.
    #[must_use]
    pub fn standard(tool: &ToolName) -> Self {
        let mut entries = vec![InstallEntry {
            source: tool.as_str().to_owned(),
            category: DestinationCategory::Executable,
            name: tool.as_str().to_owned(),
        }];
        entries.extend(Shell::ALL.into_iter().map(|shell| InstallEntry {
            source: shell.archive_path(tool),
            category: DestinationCategory::Completion(shell),
            name: shell.completion_filename(tool),
        }));
        Self { entries }
    }

    /// Entries in installation order.
    #[must_use]
    pub fn entries(&self) -> &[InstallEntry] {
        &self.entries
    }

    /// The first executable entry, used for the smoke test.
    #[must_use]
    pub fn primary_executable(&self) -> Option<&InstallEntry> {
        self.entries
            .iter()
            .find(|entry| entry.category == DestinationCategory::Executable)
    }
}
