//! Core infrastructure for impactor.
//!
//! This crate provides the pieces shared by the analysis engine and the CLI:
//! - Analyzer configuration and defaults
//! - The unified error type and exit codes
//! - Resource and result value types for JSON output
//! - Ports for external collaborators (package lister, VCS diff, file system)
//! - Text and JSON renderers for analysis results

pub mod config;
pub mod error;
pub mod output;
pub mod ports;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::{ExitCode, ImpactError, ImpactResult};
pub use ports::{FileSystem, OsFs, PackageLister, PackageRecord, VcsDiff};
pub use types::{AffectedResource, AnalysisReport, Resource, ResourceKind};
