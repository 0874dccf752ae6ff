//! k8ctl installer library.
//!
//! This crate turns a declarative release manifest (version, per-platform
//! archive URLs and checksums, install layout, smoke test) into an installed
//! tool. It is used by the `k8ctl-installer` CLI binary and can be consumed
//! programmatically for testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Release manifest types, download, and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Configuration file loading and settings resolution
//! - [`destinations`] - Destination roots for installed files
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types with recovery hints
//! - [`fetch`] - Archive download and checksum verification
//! - [`list`] - `list` and `checksum` command handlers
//! - [`list_output`] - Output formatting for install listing
//! - [`output`] - Progress, warning and dry-run formatting
//! - [`pipeline`] - Install pipeline orchestration
//! - [`receipt`] - Install receipts
//! - [`smoke`] - Post-install smoke test
//! - [`stager`] - Placement of archive contents into destination roots

pub mod artefact;
pub mod cli;
pub mod config;
pub mod destinations;
pub mod dirs;
pub mod error;
pub mod fetch;
pub mod list;
pub mod list_output;
pub mod output;
pub mod pipeline;
pub mod receipt;
pub mod smoke;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
