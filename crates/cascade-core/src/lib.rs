//! Core logic and abstractions for the Cascade deployment orchestrator.
//!
//! This crate defines the command vocabulary and runner, the toolchain
//! registry, the session configuration, repository identifiers, and the
//! manifest and working-copy helpers used across the Cascade workspace.

pub mod command;
pub mod config;
pub mod constants;
pub mod manifest;
pub mod protocol;
pub mod repo;
pub mod runner;
pub mod toolchain;
pub mod workspace;

pub use command::{CommandLine, ToolStep};
pub use config::{CascadeConfig, RepositoryConfig, SetConfig};
pub use manifest::VersionManifest;
pub use protocol::Protocol;
pub use repo::RepositoryRef;
pub use runner::{CommandOutcome, CommandRunner, ProcessRunner};
pub use toolchain::{Toolchain, ToolchainRegistry};
pub use workspace::WorkingCopy;
