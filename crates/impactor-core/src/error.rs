//! Error types and exit code constants for impactor.
//!
//! This module provides a unified error type (`ImpactError`) that bridges
//! failures from the different subsystems (configuration, package listing,
//! source parsing, diff retrieval) into a common format suitable for CLI
//! output.
//!
//! ## Failure semantics
//!
//! Not every variant aborts an analysis run:
//! - `Config` and `Lister` are fatal before/at analysis time.
//! - `Parse` and `Diff` are per-file and normally suppressed by the caller
//!   (logged, then degraded to whole-file symbol sets).
//! - `NotAnalyzed` signals a query on an analyzer that never ran `analyze()`.
//! - `Invariant` indicates a bug and should abort with a clear message.

use std::fmt;
use std::io;

use thiserror::Error;

/// Result alias used across the impactor crates.
pub type ImpactResult<T> = Result<T, ImpactError>;

// ============================================================================
// Exit Codes
// ============================================================================

/// Stable process exit codes for CLI error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Missing or invalid configuration / arguments.
    InvalidConfig = 2,
    /// The package lister failed; no graph could be built.
    ListerFailed = 3,
    /// A query was issued before `analyze()` ran.
    NotAnalyzed = 4,
    /// A source file or diff could not be processed.
    SourceError = 5,
    /// Internal errors (bugs, violated invariants, unexpected I/O).
    InternalError = 10,
}

impl ExitCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the impactor library and CLI.
#[derive(Debug, Error)]
pub enum ImpactError {
    /// Missing required configuration or unresolvable project root.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// The package lister failed; analysis aborts.
    #[error("package listing failed: {message}")]
    Lister { message: String },

    /// A single source file failed to parse. Suppressed to a warning by the
    /// analysis loop; the file is skipped and analysis continues.
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Changed-line retrieval failed for a single file. The caller degrades
    /// to the whole-file symbol set.
    #[error("diff error for {file}: {message}")]
    Diff { file: String, message: String },

    /// A query method was called before `analyze()`.
    #[error("not analyzed: call analyze() before querying")]
    NotAnalyzed,

    /// An internal consistency check failed. This is a bug.
    #[error("invariant violation: {message}")]
    Invariant { message: String },

    /// Unexpected I/O failure outside the per-file degradation paths.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<&ImpactError> for ExitCode {
    fn from(err: &ImpactError) -> Self {
        match err {
            ImpactError::Config { .. } => ExitCode::InvalidConfig,
            ImpactError::Lister { .. } => ExitCode::ListerFailed,
            ImpactError::NotAnalyzed => ExitCode::NotAnalyzed,
            ImpactError::Parse { .. } => ExitCode::SourceError,
            ImpactError::Diff { .. } => ExitCode::SourceError,
            ImpactError::Invariant { .. } => ExitCode::InternalError,
            ImpactError::Io(_) => ExitCode::InternalError,
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ImpactError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ImpactError::Config {
            message: message.into(),
        }
    }

    /// Create a package lister error.
    pub fn lister(message: impl Into<String>) -> Self {
        ImpactError::Lister {
            message: message.into(),
        }
    }

    /// Create a per-file parse error.
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        ImpactError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a per-file diff error.
    pub fn diff(file: impl Into<String>, message: impl Into<String>) -> Self {
        ImpactError::Diff {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        ImpactError::Invariant {
            message: message.into(),
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
