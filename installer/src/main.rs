//! k8ctl installer CLI entrypoint.
//!
//! This binary installs prebuilt k8ctl releases and their shell completions
//! from a release manifest, lists recorded installs, and computes archive
//! checksums for manifest authors.

mod install_flow;

use clap::Parser;
use install_flow::run_install_command;
use k8ctl_installer::cli::{Cli, Command};
use k8ctl_installer::dirs::SystemBaseDirs;
use k8ctl_installer::error::Result;
use k8ctl_installer::list::{run_checksum, run_list};
use k8ctl_installer::output::write_stderr_line;
use log::LevelFilter;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let (verbosity, quiet) = cli.log_settings();
    init_logging(verbosity, quiet);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let dirs = SystemBaseDirs::new();
    match &cli.command {
        Command::Install(args) => run_install_command(args, &dirs, stderr),
        Command::List(args) => run_list(args, &dirs, stdout),
        Command::Checksum(args) => run_checksum(args, stdout),
    }
}

/// Map `-v`/`-q` to a log level; `RUST_LOG` takes precedence.
fn log_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbosity: u8, quiet: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log_level(verbosity, quiet))
        .format_timestamp(None)
        .parse_default_env();
    if builder.try_init().is_err() {
        // A logger is already installed.
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
