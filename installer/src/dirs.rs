//! Directory resolution abstraction for platform-specific paths.
//!
//! The installer needs three per-user locations: the home directory (for
//! the default `~/.local` install prefix), a configuration directory (for
//! `config.toml`) and a data directory (for install receipts). They are
//! reached through the [`BaseDirs`] trait so tests can substitute
//! temporary directories.

use std::path::PathBuf;

const QUALIFIER: &str = "io.github";
const ORGANISATION: &str = "robertusnegoro";
const APPLICATION: &str = "k8ctl-installer";

/// Per-user base directories used by the installer.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Directory holding the installer's `config.toml`.
    fn config_dir(&self) -> Option<PathBuf>;

    /// Directory holding install receipts.
    fn data_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::dirs::{BaseDirs, SystemBaseDirs};
///
/// let dirs = SystemBaseDirs::new();
/// // Use dirs.config_dir() to locate config.toml in production
/// # let _ = dirs.home_dir();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SystemBaseDirs {
    home: Option<PathBuf>,
    config: Option<PathBuf>,
    data: Option<PathBuf>,
}

impl SystemBaseDirs {
    /// Resolve the platform directories for the current user.
    ///
    /// Directories that cannot be determined (for example when `$HOME` is
    /// unset) are reported as `None` by the accessors.
    #[must_use]
    pub fn new() -> Self {
        let home = directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        let project = directories_next::ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION);
        Self {
            home,
            config: project.as_ref().map(|p| p.config_dir().to_path_buf()),
            data: project.as_ref().map(|p| p.data_dir().to_path_buf()),
        }
    }
}

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config.clone()
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.data.clone()
    }
}
