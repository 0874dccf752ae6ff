//! Output formatting for install listing.
//!
//! This module formats install receipts for human-readable or JSON output.

use serde::Serialize;

use crate::receipt::InstallReceipt;

/// Format receipts for human-readable output.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::list_output::format_human;
///
/// let output = format_human(&[]);
/// assert!(output.contains("Nothing installed"));
/// ```
#[must_use]
pub fn format_human(receipts: &[InstallReceipt]) -> String {
    if receipts.is_empty() {
        return String::from(
            "Nothing installed.\n\nRun `k8ctl-installer install <RELEASE>` to install a release.",
        );
    }

    let mut output = String::from("Installed tools:\n");

    for receipt in receipts {
        output.push('\n');
        let unverified = if receipt.verified {
            ""
        } else {
            " (unverified)"
        };
        output.push_str(&format!(
            "{} {} [{}]{unverified}\n",
            receipt.name, receipt.version, receipt.platform
        ));
        output.push_str(&format!("  From: {}\n", receipt.url));
        output.push_str(&format!("  sha256: {}\n", receipt.sha256));
        output.push_str("  Files:\n");
        for file in &receipt.files {
            output.push_str(&format!("    - {file}\n"));
        }
    }

    output
}

/// Format receipts as JSON.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::list_output::format_json;
///
/// let json = format_json(&[]);
/// assert!(json.contains("\"installed\""));
/// ```
#[must_use]
pub fn format_json(receipts: &[InstallReceipt]) -> String {
    let json_data = InstalledJson {
        installed: receipts,
    };

    serde_json::to_string_pretty(&json_data).unwrap_or_else(|_| "{}".to_owned())
}

/// JSON-serializable wrapper around the receipts.
#[derive(Debug, Serialize)]
pub struct InstalledJson<'a> {
    /// Every recorded install.
    pub installed: &'a [InstallReceipt],
}
