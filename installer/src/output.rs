//! Output formatting for the installer CLI.
//!
//! Progress, warnings and the dry-run summary are written to stderr as plain
//! lines; structured command output (listing, checksums) goes to stdout.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a success message after installation.
///
/// # Examples
///
/// ```
/// use k8ctl_installer::output::success_message;
///
/// assert_eq!(
///     success_message("k8ctl", "0.1.0", 4),
///     "Installed k8ctl 0.1.0 (4 files)"
/// );
/// ```
#[must_use]
pub fn success_message(tool: &str, version: &str, count: usize) -> String {
    let plural = if count == 1 { "file" } else { "files" };
    format!("Installed {tool} {version} ({count} {plural})")
}

/// The warning shown when an archive is installed without a checksum.
#[must_use]
pub fn unverified_warning(url: &str, digest: &str) -> String {
    format!(
        concat!(
            "WARNING: the release publishes no checksum for {url}; ",
            "installing without verification.\n",
            "         Downloaded archive sha256: {digest}"
        ),
        url = url,
        digest = digest,
    )
}

/// Everything an install would do, shown by `--dry-run`.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use k8ctl_installer::output::DryRunInfo;
///
/// let info = DryRunInfo {
///     tool: "k8ctl".to_owned(),
///     version: "0.1.0".to_owned(),
///     description: Some("Kubernetes context helper".to_owned()),
///     homepage: None,
///     platform: "darwin/arm64".to_owned(),
///     artifact: "darwin/arm64".to_owned(),
///     url: "https://example.test/k8ctl_darwin_arm64.tar.gz".to_owned(),
///     checksum: "unset".to_owned(),
///     policy: "unverified installs allowed".to_owned(),
///     placements: vec![("k8ctl".to_owned(), Utf8PathBuf::from("/usr/local/bin/k8ctl"))],
///     smoke_test: None,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("Kubernetes context helper"));
/// assert!(output.contains("/usr/local/bin/k8ctl"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunInfo {
    /// Tool name.
    pub tool: String,
    /// Release version.
    pub version: String,
    /// One-line description from the release manifest.
    pub description: Option<String>,
    /// Homepage from the release manifest.
    pub homepage: Option<String>,
    /// The platform being installed for.
    pub platform: String,
    /// Platform label of the selected artifact.
    pub artifact: String,
    /// Resolved download URL.
    pub url: String,
    /// Expected checksum, or `unset`.
    pub checksum: String,
    /// Verification policy in effect.
    pub policy: String,
    /// Archive source and destination of each file.
    pub placements: Vec<(String, Utf8PathBuf)>,
    /// Smoke-test command line, or `None` when skipped.
    pub smoke_test: Option<String>,
}

impl DryRunInfo {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be downloaded or written".to_owned(),
            String::new(),
            format!("Release: {} {}", self.tool, self.version),
        ];
        if let Some(description) = &self.description {
            lines.push(format!("Description: {description}"));
        }
        if let Some(homepage) = &self.homepage {
            lines.push(format!("Homepage: {homepage}"));
        }
        lines.extend([
            format!("Platform: {}", self.platform),
            format!("Artifact: {}", self.artifact),
            format!("URL: {}", self.url),
            format!("Checksum: {}", self.checksum),
            format!("Verification: {}", self.policy),
            String::new(),
            "Files to install:".to_owned(),
        ]);

        for (source, destination) in &self.placements {
            lines.push(format!("  {source} -> {destination}"));
        }

        lines.push(String::new());
        match &self.smoke_test {
            Some(command) => lines.push(format!("Smoke test: {command}")),
            None => lines.push("Smoke test: skipped".to_owned()),
        }

        lines.join("\n")
    }
}

/// Format the command line of a smoke test for display.
#[must_use]
pub fn command_line(binary: &Utf8Path, args: &[String]) -> String {
    if args.is_empty() {
        return binary.to_string();
    }
    format!("{binary} {}", args.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn info() -> DryRunInfo {
        DryRunInfo {
            tool: "k8ctl".to_owned(),
            version: "0.1.0".to_owned(),
            description: None,
            homepage: Some("https://github.com/robertusnegoro/k8ctl".to_owned()),
            platform: "darwin/arm64".to_owned(),
            artifact: "darwin/*".to_owned(),
            url: "https://example.test/k8ctl_darwin.tar.gz".to_owned(),
            checksum: "unset".to_owned(),
            policy: "checksum verification required".to_owned(),
            placements: vec![
                ("k8ctl".to_owned(), Utf8PathBuf::from("/opt/bin/k8ctl")),
                (
                    "completions/zsh/_k8ctl".to_owned(),
                    Utf8PathBuf::from("/opt/share/zsh/site-functions/_k8ctl"),
                ),
            ],
            smoke_test: Some("/opt/bin/k8ctl version".to_owned()),
        }
    }

    #[rstest]
    fn dry_run_lists_every_placement(info: DryRunInfo) {
        let text = info.display_text();
        assert!(text.contains("  k8ctl -> /opt/bin/k8ctl"));
        assert!(text.contains("  completions/zsh/_k8ctl -> /opt/share/zsh/site-functions/_k8ctl"));
        assert!(text.contains("Artifact: darwin/*"));
        assert!(text.contains("Homepage: https://github.com/robertusnegoro/k8ctl"));
        assert!(!text.contains("Description:"));
        assert!(text.contains("Smoke test: /opt/bin/k8ctl version"));
    }

    #[rstest]
    fn dry_run_reports_skipped_smoke_test(info: DryRunInfo) {
        let info = DryRunInfo {
            smoke_test: None,
            ..info
        };
        assert!(info.display_text().ends_with("Smoke test: skipped"));
    }

    #[rstest]
    #[case::singular(1, "(1 file)")]
    #[case::plural(4, "(4 files)")]
    fn success_message_pluralises_correctly(#[case] count: usize, #[case] expected: &str) {
        assert!(success_message("k8ctl", "0.1.0", count).ends_with(expected));
    }

    #[test]
    fn unverified_warning_names_url_and_digest() {
        let warning = unverified_warning("https://example.test/a.tar.gz", "abc123");
        assert!(warning.starts_with("WARNING"));
        assert!(warning.contains("https://example.test/a.tar.gz"));
        assert!(warning.contains("abc123"));
    }

    #[test]
    fn command_line_joins_arguments() {
        assert_eq!(
            command_line(Utf8Path::new("/bin/k8ctl"), &["version".to_owned()]),
            "/bin/k8ctl version"
        );
        assert_eq!(command_line(Utf8Path::new("/bin/k8ctl"), &[]), "/bin/k8ctl");
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "hello");
        assert_eq!(buffer, b"hello\n");
    }
}
