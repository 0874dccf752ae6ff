//! Installer configuration file and settings resolution.
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags, the optional `config.toml`, and built-in defaults. The default
//! file lives in the platform configuration directory; an explicit
//! `--config` path must exist.

use crate::artefact::download::DEFAULT_DOWNLOAD_TIMEOUT;
use crate::artefact::verification::VerificationPolicy;
use crate::cli::InstallArgs;
use crate::destinations::{DestinationOverrides, DestinationRoots};
use crate::dirs::BaseDirs;
use crate::smoke::DEFAULT_SMOKE_TEST_TIMEOUT;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Errors arising from configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {path} does not exist")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Reading the config file failed.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// No install prefix was given and the home directory is unknown.
    #[error("could not determine home directory; pass --prefix")]
    MissingHomeDirectory,

    /// The home directory is not valid UTF-8.
    #[error("home directory {path} is not valid UTF-8; pass --prefix")]
    NonUtf8Home {
        /// The offending path.
        path: PathBuf,
    },
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerConfig {
    /// Install prefix used to derive destination roots.
    pub prefix: Option<Utf8PathBuf>,
    /// Executable directory override.
    pub bin_dir: Option<Utf8PathBuf>,
    /// Bash completion directory override.
    pub bash_completion_dir: Option<Utf8PathBuf>,
    /// Zsh completion directory override.
    pub zsh_completion_dir: Option<Utf8PathBuf>,
    /// Fish completion directory override.
    pub fish_completion_dir: Option<Utf8PathBuf>,
    /// Permit artifacts whose checksum is not yet published.
    pub allow_unverified: Option<bool>,
    /// Network timeout in seconds.
    pub download_timeout_secs: Option<u64>,
    /// Smoke-test timeout in seconds.
    pub smoke_test_timeout_secs: Option<u64>,
}

impl InstallerConfig {
    fn overrides(&self) -> DestinationOverrides {
        DestinationOverrides {
            bin_dir: self.bin_dir.clone(),
            bash_completion_dir: self.bash_completion_dir.clone(),
            zsh_completion_dir: self.zsh_completion_dir.clone(),
            fish_completion_dir: self.fish_completion_dir.clone(),
        }
    }
}

/// Load configuration from `explicit`, or from the default location.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when `explicit` names a missing file,
/// and a read or parse error when a file exists but is unusable. A missing
/// default file yields the empty configuration.
pub fn load_config(
    explicit: Option<&Utf8Path>,
    dirs: &dyn BaseDirs,
) -> Result<InstallerConfig, ConfigError> {
    let path = match explicit {
        Some(path) => {
            let path = path.as_std_path().to_path_buf();
            if !path.is_file() {
                return Err(ConfigError::NotFound { path });
            }
            path
        }
        None => match dirs.config_dir() {
            Some(dir) => dir.join(CONFIG_FILENAME),
            None => {
                log::debug!("no config directory available; using defaults");
                return Ok(InstallerConfig::default());
            }
        },
    };

    if !path.exists() {
        log::debug!("config file {} not present; using defaults", path.display());
        return Ok(InstallerConfig::default());
    }

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source: Box::new(source),
    })?;
    log::debug!("loaded config file {}", path.display());
    Ok(config)
}

/// Effective settings for one install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    /// Where each category of file is placed.
    pub roots: DestinationRoots,
    /// What to do with artifacts lacking a checksum.
    pub policy: VerificationPolicy,
    /// Network timeout for the archive download.
    pub download_timeout: Duration,
    /// Timeout for the post-install smoke test.
    pub smoke_test_timeout: Duration,
}

/// Merge command-line arguments over `config` over built-in defaults.
///
/// # Errors
///
/// Returns [`ConfigError::MissingHomeDirectory`] or
/// [`ConfigError::NonUtf8Home`] when no prefix is given anywhere and the
/// default `~/.local` cannot be formed.
pub fn resolve_settings(
    args: &InstallArgs,
    config: &InstallerConfig,
    dirs: &dyn BaseDirs,
) -> Result<InstallSettings, ConfigError> {
    let prefix = match args.prefix.clone().or_else(|| config.prefix.clone()) {
        Some(prefix) => prefix,
        None => default_prefix(dirs)?,
    };
    let overrides = args.destination_overrides().or(config.overrides());
    let roots = DestinationRoots::from_prefix(&prefix).with_overrides(overrides);

    let allow_unverified = args.allow_unverified || config.allow_unverified.unwrap_or(false);
    let download_timeout = args
        .timeout
        .or(config.download_timeout_secs)
        .map_or(DEFAULT_DOWNLOAD_TIMEOUT, Duration::from_secs);
    let smoke_test_timeout = config
        .smoke_test_timeout_secs
        .map_or(DEFAULT_SMOKE_TEST_TIMEOUT, Duration::from_secs);

    Ok(InstallSettings {
        roots,
        policy: VerificationPolicy::from_opt_in(allow_unverified),
        download_timeout,
        smoke_test_timeout,
    })
}

/// The per-user prefix `~/.local`.
fn default_prefix(dirs: &dyn BaseDirs) -> Result<Utf8PathBuf, ConfigError> {
    let home = dirs.home_dir().ok_or(ConfigError::MissingHomeDirectory)?;
    let home =
        Utf8PathBuf::from_path_buf(home).map_err(|path| ConfigError::NonUtf8Home { path })?;
    Ok(home.join(".local"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirs::MockBaseDirs;
    use rstest::{fixture, rstest};

    #[fixture]
    fn home_dirs() -> MockBaseDirs {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));
        dirs
    }

    #[rstest]
    fn defaults_install_under_home_local(home_dirs: MockBaseDirs) {
        let settings = resolve_settings(
            &InstallArgs::default(),
            &InstallerConfig::default(),
            &home_dirs,
        )
        .expect("resolve");
        assert_eq!(settings.roots.bin_dir, "/home/user/.local/bin");
        assert!(!settings.policy.allows_unverified());
        assert_eq!(settings.download_timeout, DEFAULT_DOWNLOAD_TIMEOUT);
        assert_eq!(settings.smoke_test_timeout, DEFAULT_SMOKE_TEST_TIMEOUT);
    }

    #[rstest]
    fn cli_flags_override_config_file(home_dirs: MockBaseDirs) {
        let args = InstallArgs {
            prefix: Some(Utf8PathBuf::from("/cli")),
            timeout: Some(5),
            ..InstallArgs::default()
        };
        let config = InstallerConfig {
            prefix: Some(Utf8PathBuf::from("/file")),
            fish_completion_dir: Some(Utf8PathBuf::from("/file/fish")),
            allow_unverified: Some(true),
            download_timeout_secs: Some(90),
            smoke_test_timeout_secs: Some(3),
            ..InstallerConfig::default()
        };
        let settings = resolve_settings(&args, &config, &home_dirs).expect("resolve");
        assert_eq!(settings.roots.bin_dir, "/cli/bin");
        assert_eq!(settings.roots.fish_completion_dir, "/file/fish");
        assert!(settings.policy.allows_unverified());
        assert_eq!(settings.download_timeout, Duration::from_secs(5));
        assert_eq!(settings.smoke_test_timeout, Duration::from_secs(3));
    }

    #[test]
    fn missing_home_without_prefix_is_an_error() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().returning(|| None);
        let err = resolve_settings(&InstallArgs::default(), &InstallerConfig::default(), &dirs)
            .expect_err("no prefix available");
        assert!(matches!(err, ConfigError::MissingHomeDirectory));
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config_dir = temp.path().to_path_buf();
        let mut dirs = MockBaseDirs::new();
        dirs.expect_config_dir()
            .returning(move || Some(config_dir.clone()));
        let config = load_config(None, &dirs).expect("defaults");
        assert_eq!(config, InstallerConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dirs = MockBaseDirs::new();
        let err = load_config(Some(Utf8Path::new("/nonexistent/k8ctl.toml")), &dirs)
            .expect_err("explicit file missing");
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn parses_default_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            temp.path().join(CONFIG_FILENAME),
            "prefix = \"/opt/tools\"\nallow_unverified = true\n",
        )
        .expect("write config");
        let config_dir = temp.path().to_path_buf();
        let mut dirs = MockBaseDirs::new();
        dirs.expect_config_dir()
            .returning(move || Some(config_dir.clone()));

        let config = load_config(None, &dirs).expect("parse");
        assert_eq!(config.prefix, Some(Utf8PathBuf::from("/opt/tools")));
        assert_eq!(config.allow_unverified, Some(true));
    }

    #[test]
    fn rejects_unknown_keys() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "prefx = \"/typo\"\n").expect("write config");
        let utf8 = Utf8PathBuf::from_path_buf(path).expect("utf-8 temp path");

        let err = load_config(Some(&utf8), &MockBaseDirs::new()).expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
