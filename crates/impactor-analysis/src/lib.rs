//! The impactor analysis engine.
//!
//! Given a module path, a project root, and a set of changed files, this
//! crate decides which deployable units (API services, jobs, workers) are
//! actually affected, and through which chain of imports:
//!
//! - [`graph::DependencyGraph`] — the in-memory package import graph.
//! - [`extract::ResourceExtractor`] — discovers resources from command
//!   definition literals.
//! - [`symbols::SymbolAnalyzer`] — declaration ranges, changed-symbol
//!   mapping, and cross-package witness searches.
//! - [`di::DiAnalyzer`] — detects interface values received through
//!   dependency injection (struct fields, constructor parameters).
//! - [`analyzer::Analyzer`] — the orchestrator tying it all together.
//! - [`vcs::GitDiff`] and [`golist::GoList`] — the subprocess adapters for
//!   the VCS-diff and package-lister ports.

pub mod analyzer;
pub mod di;
pub mod diff;
pub mod extract;
pub mod golist;
pub mod graph;
pub mod symbols;
pub mod vcs;

pub use analyzer::Analyzer;
pub use di::DiAnalyzer;
pub use extract::ResourceExtractor;
pub use golist::GoList;
pub use graph::DependencyGraph;
pub use symbols::{ChangedSymbolInfo, InterfaceMethodRange, SymbolAnalyzer, SymbolRange};
pub use vcs::GitDiff;
