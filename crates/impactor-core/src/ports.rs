//! Ports for external collaborators.
//!
//! The analysis engine never shells out or touches the file system directly;
//! it goes through these traits so tests can substitute doubles. The real
//! subprocess implementations live in `impactor-analysis` (`GitDiff`,
//! `GoList`); the real file system is [`OsFs`] here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ImpactResult;

// ============================================================================
// Package Lister
// ============================================================================

/// One record from the package lister: a package and its direct imports.
///
/// Records outside the module and duplicate records are permitted; the graph
/// filters and de-duplicates (last write wins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub import_path: String,
    pub direct_imports: Vec<String>,
}

impl PackageRecord {
    pub fn new(
        import_path: impl Into<String>,
        direct_imports: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        PackageRecord {
            import_path: import_path.into(),
            direct_imports: direct_imports.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lists every package of the module with its direct imports.
pub trait PackageLister {
    /// Emit a record for every package under `root`. A failure here is fatal
    /// to the analysis run.
    fn list(&self, root: &Path) -> ImpactResult<Vec<PackageRecord>>;
}

// ============================================================================
// VCS Diff
// ============================================================================

/// Reports changed files and per-file changed lines against a base reference.
pub trait VcsDiff {
    /// Changed file paths, relative to the repository root.
    fn changed_files(&self, base_ref: &str) -> ImpactResult<Vec<String>>;

    /// Changed (added or modified) 1-indexed line numbers for one file.
    /// May fail or return empty; the caller degrades to whole-file symbols.
    fn changed_lines(&self, file_path: &str) -> ImpactResult<Vec<u32>>;
}

// ============================================================================
// File System
// ============================================================================

/// Minimal file system surface used by the analysis passes.
pub trait FileSystem {
    /// List the entries of a directory (files and subdirectories).
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read a file to a string.
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Whether the path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;
}

/// The real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        // Stable order keeps witness search deterministic across platforms.
        entries.sort();
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

// ============================================================================
// Tests
// ============================================================================
