//! Release manifest model, artifact retrieval, and verification policy.
//!
//! This module implements the type-safe domain model for installing a
//! prebuilt tool from a declarative release manifest.
//!
//! # Sub-modules
//!
//! - [`error`] — Semantic error types for validation failures.
//! - [`platform`] — Operating system and architecture keys (`Platform`).
//! - [`release`] — Release, artifact table, and selection (`Release`).
//! - [`release_parser`] — TOML and JSON release manifest loading.
//! - [`manifest`] — Install manifest entries and categories.
//! - [`sha256_digest`] — SHA-256 digest newtype (`Sha256Digest`).
//! - [`verification`] — Expected checksums and the unset-checksum policy.
//! - [`download`] — Artefact download trait and HTTP implementation.
//! - [`extraction`] — Archive extraction with path traversal protection.

pub mod download;
pub mod error;
pub mod extraction;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod release_parser;
pub mod sha256_digest;
pub mod verification;
