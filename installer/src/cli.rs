//! CLI argument definitions for the k8ctl installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::artefact::platform::Platform;
use crate::destinations::DestinationOverrides;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Install prebuilt k8ctl releases and their shell completions.
#[derive(Parser, Debug)]
#[command(name = "k8ctl-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install prebuilt k8ctl releases and their shell completions.\n\n",
    "The installer reads a release manifest describing a version, one archive ",
    "per platform with its SHA-256 checksum, and the files each archive ",
    "provides. It selects the archive for the current platform, downloads ",
    "and verifies it, places the executable and completion scripts, and runs ",
    "the installed binary once to confirm it works.\n\n",
    "Artifacts without a published checksum are refused unless ",
    "--allow-unverified is given.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install into ~/.local:\n",
    "    $ k8ctl-installer install releases/k8ctl.toml\n\n",
    "  Install system-wide:\n",
    "    $ sudo k8ctl-installer install releases/k8ctl.toml --prefix /usr/local\n\n",
    "  Preview the install for Apple silicon:\n",
    "    $ k8ctl-installer install releases/k8ctl.toml --platform darwin/arm64 --dry-run\n\n",
    "  Compute checksums for a release manifest:\n",
    "    $ k8ctl-installer checksum dist/*.tar.gz\n\n",
    "  List installed tools:\n",
    "    $ k8ctl-installer list\n\n",
    "For more information, see: https://github.com/robertusnegoro/k8ctl",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Install a release from its manifest.
    Install(InstallArgs),

    /// List installed tools.
    List(ListArgs),

    /// Print SHA-256 checksums of files.
    Checksum(ChecksumArgs),
}

/// Arguments for the install command.
#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    /// Release manifest (`.toml` or `.json`).
    #[arg(value_name = "RELEASE")]
    pub release: Utf8PathBuf,

    /// Install for OS/ARCH instead of the current host (e.g. darwin/arm64).
    #[arg(long, value_name = "OS/ARCH")]
    pub platform: Option<Platform>,

    /// Install prefix [default: ~/.local].
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,

    /// Directory for executables [default: PREFIX/bin].
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<Utf8PathBuf>,

    /// Directory for bash completions [default: PREFIX/share/bash-completion/completions].
    #[arg(long, value_name = "DIR")]
    pub bash_completion_dir: Option<Utf8PathBuf>,

    /// Directory for zsh completions [default: PREFIX/share/zsh/site-functions].
    #[arg(long, value_name = "DIR")]
    pub zsh_completion_dir: Option<Utf8PathBuf>,

    /// Directory for fish completions [default: PREFIX/share/fish/vendor_completions.d].
    #[arg(long, value_name = "DIR")]
    pub fish_completion_dir: Option<Utf8PathBuf>,

    /// Install artifacts that publish no checksum.
    #[arg(long)]
    pub allow_unverified: bool,

    /// Do not run the installed executable afterwards.
    #[arg(long)]
    pub skip_smoke_test: bool,

    /// Download timeout in seconds [default: 60].
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Configuration file [default: platform config directory].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Show what would be installed and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Arguments for the list command.
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the checksum command.
#[derive(Parser, Debug, Clone)]
pub struct ChecksumArgs {
    /// Files to hash.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<Utf8PathBuf>,
}

impl InstallArgs {
    /// Destination directory overrides given on the command line.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use k8ctl_installer::cli::InstallArgs;
    ///
    /// let args = InstallArgs {
    ///     bin_dir: Some(Utf8PathBuf::from("/opt/bin")),
    ///     ..InstallArgs::default()
    /// };
    /// let overrides = args.destination_overrides();
    /// assert_eq!(overrides.bin_dir, Some(Utf8PathBuf::from("/opt/bin")));
    /// assert!(overrides.zsh_completion_dir.is_none());
    /// ```
    #[must_use]
    pub fn destination_overrides(&self) -> DestinationOverrides {
        DestinationOverrides {
            bin_dir: self.bin_dir.clone(),
            bash_completion_dir: self.bash_completion_dir.clone(),
            zsh_completion_dir: self.zsh_completion_dir.clone(),
            fish_completion_dir: self.fish_completion_dir.clone(),
        }
    }
}

impl Default for InstallArgs {
    /// Creates an `InstallArgs` instance with all flags disabled and the
    /// release manifest path set to `k8ctl.toml`.
    ///
    /// This is useful for testing or programmatic construction where only
    /// specific fields need to be set.
    ///
    /// # Examples
    ///
    /// ```
    /// use k8ctl_installer::cli::InstallArgs;
    ///
    /// let args = InstallArgs::default();
    /// assert!(!args.allow_unverified);
    /// assert!(args.prefix.is_none());
    /// ```
    fn default() -> Self {
        Self {
            release: Utf8PathBuf::from("k8ctl.toml"),
            platform: None,
            prefix: None,
            bin_dir: None,
            bash_completion_dir: None,
            zsh_completion_dir: None,
            fish_completion_dir: None,
            allow_unverified: false,
            skip_smoke_test: false,
            timeout: None,
            config: None,
            dry_run: false,
            verbosity: 0,
            quiet: false,
        }
    }
}

impl Cli {
    /// Log verbosity and quiet flag for the selected command.
    ///
    /// Only `install` accepts `-v`/`-q`; other commands log warnings only.
    #[must_use]
    pub fn log_settings(&self) -> (u8, bool) {
        match &self.command {
            Command::Install(args) => (args.verbosity, args.quiet),
            Command::List(_) | Command::Checksum(_) => (0, false),
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
