//! Subprocess adapter for the VCS-diff port.
//!
//! Shells out to `git` for the changed-file list and for per-file changed
//! lines. Diff commands run from the repository root, with the file path
//! rebased from the project root so monorepo layouts (`go/` inside the
//! repository) resolve correctly without double prefixing.

use std::path::{Path, PathBuf};
use std::process::Command;

use impactor_core::{ImpactError, ImpactResult, VcsDiff};

use crate::diff::parse_unified_diff;

/// VCS diff backed by the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitDiff {
    project_dir: PathBuf,
    base_ref: String,
}

impl GitDiff {
    pub fn new(project_dir: impl Into<PathBuf>, base_ref: impl Into<String>) -> Self {
        GitDiff {
            project_dir: project_dir.into(),
            base_ref: base_ref.into(),
        }
    }

    /// The repository root, via `git rev-parse --show-toplevel`. Falls back
    /// to the project directory outside a repository.
    pub fn root_dir(&self) -> PathBuf {
        let out = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(&self.project_dir)
            .output();
        match out {
            Ok(out) if out.status.success() => {
                let root = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if root.is_empty() {
                    self.project_dir.clone()
                } else {
                    PathBuf::from(root)
                }
            }
            _ => self.project_dir.clone(),
        }
    }

    fn run_git(&self, dir: &Path, args: &[&str]) -> ImpactResult<Vec<u8>> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| ImpactError::diff("(repository)", format!("failed to run git: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ImpactError::diff(
                "(repository)",
                format!("git exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(output.stdout)
    }

    /// Rebase a project-relative file path onto the repository root.
    fn repo_relative(&self, git_root: &Path, file_path: &str) -> String {
        let rel = Path::new(file_path)
            .strip_prefix(&self.project_dir)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| PathBuf::from(file_path));
        let rel = rel.to_string_lossy().replace('\\', "/");

        let project_rel = match self.project_dir.strip_prefix(git_root) {
            Ok(p) if !p.as_os_str().is_empty() => p.to_string_lossy().replace('\\', "/"),
            _ => return rel,
        };
        // The caller may already hand us repository-rooted paths.
        if rel.starts_with(&format!("{project_rel}/")) {
            rel
        } else {
            format!("{project_rel}/{rel}")
        }
    }
}

impl VcsDiff for GitDiff {
    fn changed_files(&self, base_ref: &str) -> ImpactResult<Vec<String>> {
        let git_root = self.root_dir();
        let three_dot = format!("{base_ref}...HEAD");
        let out = self
            .run_git(&git_root, &["diff", "--name-only", &three_dot])
            .or_else(|_| self.run_git(&git_root, &["diff", "--name-only", base_ref]))?;

        Ok(String::from_utf8_lossy(&out)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn changed_lines(&self, file_path: &str) -> ImpactResult<Vec<u32>> {
        let git_root = self.root_dir();
        let rel = self.repo_relative(&git_root, file_path);
        let three_dot = format!("{}...HEAD", self.base_ref);
        match self.run_git(&git_root, &["diff", "-U0", &three_dot, "--", &rel]) {
            Ok(out) => Ok(parse_unified_diff(&String::from_utf8_lossy(&out))),
            // A failing diff usually means a new or renamed file; the caller
            // falls back to the whole-file symbol set.
            Err(_) => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_relative_prefixes_nested_project() {
        let git = GitDiff::new("/repo/go", "main");
        assert_eq!(
            git.repo_relative(Path::new("/repo"), "svc/a.go"),
            "go/svc/a.go"
        );
    }

    #[test]
    fn repo_relative_avoids_double_prefix() {
        let git = GitDiff::new("/repo/go", "main");
        assert_eq!(
            git.repo_relative(Path::new("/repo"), "go/svc/a.go"),
            "go/svc/a.go"
        );
    }

    #[test]
    fn repo_relative_identity_when_project_is_root() {
        let git = GitDiff::new("/repo", "main");
        assert_eq!(git.repo_relative(Path::new("/repo"), "svc/a.go"), "svc/a.go");
    }

    #[test]
    fn repo_relative_strips_absolute_project_paths() {
        let git = GitDiff::new("/repo/go", "main");
        assert_eq!(
            git.repo_relative(Path::new("/repo"), "/repo/go/svc/a.go"),
            "go/svc/a.go"
        );
    }

    #[test]
    fn root_dir_outside_repository_falls_back() {
        let git = GitDiff::new("/definitely/not/a/repo", "main");
        assert_eq!(git.root_dir(), PathBuf::from("/definitely/not/a/repo"));
    }
}
