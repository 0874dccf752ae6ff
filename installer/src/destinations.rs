//! Destination roots for installed files.
//!
//! The host decides where executables and completion scripts live. Roots
//! default to a conventional layout under an install prefix and may be
//! overridden one by one.

use crate::artefact::manifest::{DestinationCategory, InstallEntry, Shell};
use camino::{Utf8Path, Utf8PathBuf};

/// Directories that receive each category of installed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRoots {
    /// Directory for executables.
    pub bin_dir: Utf8PathBuf,
    /// Directory for bash completion scripts.
    pub bash_completion_dir: Utf8PathBuf,
    /// Directory for zsh completion functions.
    pub zsh_completion_dir: Utf8PathBuf,
    /// Directory for fish completion scripts.
    pub fish_completion_dir: Utf8PathBuf,
}

/// Per-root overrides; `None` keeps the prefix-derived default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationOverrides {
    /// Override for [`DestinationRoots::bin_dir`].
    pub bin_dir: Option<Utf8PathBuf>,
    /// Override for [`DestinationRoots::bash_completion_dir`].
    pub bash_completion_dir: Option<Utf8PathBuf>,
    /// Override for [`DestinationRoots::zsh_completion_dir`].
    pub zsh_completion_dir: Option<Utf8PathBuf>,
    /// Override for [`DestinationRoots::fish_completion_dir`].
    pub fish_completion_dir: Option<Utf8PathBuf>,
}

impl DestinationOverrides {
    /// Fill unset overrides from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            bin_dir: self.bin_dir.or(fallback.bin_dir),
            bash_completion_dir: self.bash_completion_dir.or(fallback.bash_completion_dir),
            zsh_completion_dir: self.zsh_completion_dir.or(fallback.zsh_completion_dir),
            fish_completion_dir: self.fish_completion_dir.or(fallback.fish_completion_dir),
        }
    }
}

impl DestinationRoots {
    /// Derive the conventional layout under `prefix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use k8ctl_installer::destinations::DestinationRoots;
    ///
    /// let roots = DestinationRoots::from_prefix(Utf8Path::new("/usr/local"));
    /// assert_eq!(roots.bin_dir, "/usr/local/bin");
    /// assert_eq!(roots.zsh_completion_dir, "/usr/local/share/zsh/site-functions");
    /// ```
    #[must_use]
    pub fn from_prefix(prefix: &Utf8Path) -> Self {
        let share = prefix.join("share");
        Self {
            bin_dir: prefix.join("bin"),
            bash_completion_dir: share.join("bash-completion").join("completions"),
            zsh_completion_dir: share.join("zsh").join("site-functions"),
            fish_completion_dir: share.join("fish").join("vendor_completions.d"),
        }
    }

    /// Replace any root that has an override.
    #[must_use]
    pub fn with_overrides(self, overrides: DestinationOverrides) -> Self {
        Self {
            bin_dir: overrides.bin_dir.unwrap_or(self.bin_dir),
            bash_completion_dir: overrides
                .bash_completion_dir
                .unwrap_or(self.bash_completion_dir),
            zsh_completion_dir: overrides
                .zsh_completion_dir
                .unwrap_or(self.zsh_completion_dir),
            fish_completion_dir: overrides
                .fish_completion_dir
                .unwrap_or(self.fish_completion_dir),
        }
    }

    /// The root directory for `category`.
    #[must_use]
    pub fn root_for(&self, category: DestinationCategory) -> &Utf8Path {
        match category {
            DestinationCategory::Executable => &self.bin_dir,
            DestinationCategory::Completion(Shell::Bash) => &self.bash_completion_dir,
            DestinationCategory::Completion(Shell::Zsh) => &self.zsh_completion_dir,
            DestinationCategory::Completion(Shell::Fish) => &self.fish_completion_dir,
        }
    }

    /// The full destination path of `entry`.
    #[must_use]
    pub fn destination(&self, entry: &InstallEntry) -> Utf8PathBuf {
        self.root_for(entry.category()).join(entry.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bin(DestinationCategory::Executable, "/opt/k8ctl/bin")]
    #[case::bash(
        DestinationCategory::Completion(Shell::Bash),
        "/opt/k8ctl/share/bash-completion/completions"
    )]
    #[case::fish(
        DestinationCategory::Completion(Shell::Fish),
        "/opt/k8ctl/share/fish/vendor_completions.d"
    )]
    fn prefix_layout(#[case] category: DestinationCategory, #[case] expected: &str) {
        let roots = DestinationRoots::from_prefix(Utf8Path::new("/opt/k8ctl"));
        assert_eq!(roots.root_for(category), Utf8Path::new(expected));
    }

    #[test]
    fn overrides_replace_only_named_roots() {
        let roots = DestinationRoots::from_prefix(Utf8Path::new("/usr/local")).with_overrides(
            DestinationOverrides {
                zsh_completion_dir: Some(Utf8PathBuf::from("/etc/zsh/completions")),
                ..DestinationOverrides::default()
            },
        );
        assert_eq!(roots.zsh_completion_dir, "/etc/zsh/completions");
        assert_eq!(roots.bin_dir, "/usr/local/bin");
    }

    #[test]
    fn earlier_overrides_take_precedence() {
        let cli = DestinationOverrides {
            bin_dir: Some(Utf8PathBuf::from("/cli/bin")),
            ..DestinationOverrides::default()
        };
        let file = DestinationOverrides {
            bin_dir: Some(Utf8PathBuf::from("/file/bin")),
            fish_completion_dir: Some(Utf8PathBuf::from("/file/fish")),
            ..DestinationOverrides::default()
        };
        let merged = cli.or(file);
        assert_eq!(merged.bin_dir, Some(Utf8PathBuf::from("/cli/bin")));
        assert_eq!(merged.fish_completion_dir, Some(Utf8PathBuf::from("/file/fish")));
    }

    #[test]
    fn destination_joins_root_and_name() {
        let roots = DestinationRoots::from_prefix(Utf8Path::new("/usr/local"));
        let entry = InstallEntry::new(
            "completions/zsh/_k8ctl",
            DestinationCategory::Completion(Shell::Zsh),
            "_k8ctl",
        )
        .expect("valid entry");
        assert_eq!(
            roots.destination(&entry),
            Utf8PathBuf::from("/usr/local/share/zsh/site-functions/_k8ctl")
        );
    }
}
