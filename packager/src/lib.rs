//! dh-updater packaging library.
//!
//! This crate packages a build directory into a zip archive and emits the
//! JSON and XML update manifests consumed by dh-updater self-update clients.
//! It backs the `dh-updater` CLI binary and can be driven programmatically
//! through [`pipeline::Pipeline`].
//!
//! # Modules
//!
//! - [`archive`] - Zip archive creation, in-process or via the `zip` tool
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External process invocation seam
//! - [`config`] - Pipeline configuration and repository identifiers
//! - [`digest`] - SHA-512 and MD5 digest newtypes and hashing
//! - [`error`] - Pipeline error types
//! - [`extractor`] - Printable-text extraction from binaries
//! - [`manifest`] - Update manifest schema and assembly
//! - [`manifest_parser`] - Manifest deserialization from JSON and XML
//! - [`naming`] - Manifest file naming
//! - [`pattern`] - Exclusion pattern parsing and matching
//! - [`pipeline`] - End-to-end packaging orchestration
//! - [`serialization`] - JSON and XML manifest rendering
//! - [`version`] - Four-part version extraction
//! - [`version_file`] - Standalone `<binary>.version.txt` stamping
//! - [`walker`] - Filtered, deterministic directory traversal

pub mod archive;
pub mod cli;
pub mod command;
pub mod config;
pub mod digest;
pub mod error;
pub mod extractor;
pub mod manifest;
pub mod manifest_parser;
pub mod naming;
pub mod pattern;
pub mod pipeline;
pub mod serialization;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod version;
pub mod version_file;
pub mod walker;
