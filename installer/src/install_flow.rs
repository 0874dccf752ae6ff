//! Install-command helpers for the installer binary.
//!
//! This module resolves settings, runs the pipeline and records the install
//! receipt, keeping that flow separate from CLI dispatch in `main.rs`.

use k8ctl_installer::artefact::platform::Platform;
use k8ctl_installer::artefact::release_parser::load_release;
use k8ctl_installer::cli::InstallArgs;
use k8ctl_installer::config::{load_config, resolve_settings};
use k8ctl_installer::dirs::BaseDirs;
use k8ctl_installer::error::Result;
use k8ctl_installer::output::{success_message, write_stderr_line};
use k8ctl_installer::pipeline::{InstallReport, InstallRequest, plan_install, run_install};
use k8ctl_installer::receipt::{now_unix_secs, write_receipt};
use std::io::Write;

/// Run `install`: resolve, then either describe (`--dry-run`) or perform
/// the install.
pub(crate) fn run_install_command(
    args: &InstallArgs,
    dirs: &dyn BaseDirs,
    stderr: &mut dyn Write,
) -> Result<()> {
    let config = load_config(args.config.as_deref(), dirs)?;
    let settings = resolve_settings(args, &config, dirs)?;
    let release = load_release(args.release.as_std_path())?;
    let platform = match args.platform {
        Some(platform) => platform,
        None => Platform::host()?,
    };
    log::debug!("installing for {platform} into {:?}", settings.roots);

    let request = InstallRequest {
        release: &release,
        platform,
        settings: &settings,
        skip_smoke_test: args.skip_smoke_test,
        quiet: args.quiet,
    };

    if args.dry_run {
        let info = plan_install(&request)?;
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    let report = run_install(&request, stderr)?;
    write_install_receipt(args.quiet, dirs, &report, stderr);
    report.ensure_smoke_test_passed()?;

    if !args.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(
            stderr,
            success_message(&report.tool, &report.version, report.placed.len()),
        );
    }
    Ok(())
}

/// Best-effort receipt recording once files are in place.
pub(crate) fn write_install_receipt(
    quiet: bool,
    dirs: &dyn BaseDirs,
    report: &InstallReport,
    stderr: &mut dyn Write,
) {
    let receipt = report.receipt(now_unix_secs());
    if let Err(error) = write_receipt(dirs, &receipt) {
        log::warn!("install receipt not written: {error}");
        if !quiet {
            write_stderr_line(
                stderr,
                format!("Warning: could not record install receipt: {error}"),
            );
        }
    }
}
