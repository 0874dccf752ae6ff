//! List and checksum command implementations.
//!
//! `run_list` prints the install receipts recorded in the data directory;
//! `run_checksum` prints SHA-256 digests in the `sha256sum` layout used when
//! filling in release manifests.

use std::io::Write;

use crate::artefact::sha256_digest::Sha256Digest;
use crate::cli::{ChecksumArgs, ListArgs};
use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::list_output::{format_human, format_json};
use crate::receipt::load_receipts;

/// Lists installed tools from their receipts.
///
/// Output is written to stdout (human-readable by default, JSON with `--json`).
///
/// # Errors
///
/// Returns an error if:
/// - The data directory cannot be resolved or listed
/// - Writing to stdout fails
pub fn run_list(args: &ListArgs, dirs: &dyn BaseDirs, stdout: &mut dyn Write) -> Result<()> {
    let receipts = load_receipts(dirs)?;

    let output = if args.json {
        format_json(&receipts)
    } else {
        format_human(&receipts)
    };

    writeln!(stdout, "{output}").map_err(|e| InstallerError::WriteFailed { source: e })?;

    Ok(())
}

/// Prints `<sha256>  <file>` for each file.
///
/// # Errors
///
/// Returns [`InstallerError::ReadFailed`] for the first file that cannot be
/// read, after printing the digests of the files before it.
pub fn run_checksum(args: &ChecksumArgs, stdout: &mut dyn Write) -> Result<()> {
    for file in &args.files {
        let digest =
            Sha256Digest::of_file(file.as_std_path()).map_err(|source| InstallerError::ReadFailed {
                path: file.clone(),
                source,
            })?;
        writeln!(stdout, "{digest}  {file}")
            .map_err(|e| InstallerError::WriteFailed { source: e })?;
    }
    Ok(())
}
