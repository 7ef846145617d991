//! Analyzer configuration.
//!
//! `AnalyzerConfig` carries everything an analysis run needs to know about
//! the project layout and the conventions used by its command definitions.
//! Only `module_path` and `project_root` are required; everything else has
//! a default matching the common monorepo layout.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ImpactError, ImpactResult};
use crate::types::ResourceKind;

/// Default directory (relative to the project root) holding command files.
pub const DEFAULT_COMMAND_DIR: &str = "cli/cmd";

/// Default VCS base reference for diffs.
pub const DEFAULT_BASE_REF: &str = "origin/main";

/// Built-in infrastructure file suffixes: auto-generated shared schema files
/// that many packages import but few actually use per change.
pub const BUILTIN_INFRA_FILES: &[&str] = &["sqlc/db.go", "sqlc/models.go", "sqlc/querier.go"];

/// Configuration for an [`Analyzer`](https://docs.rs/impactor-analysis).
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// The module import prefix (e.g. `example.com/org/repo`). Required.
    pub module_path: String,
    /// Root directory of the project. Required.
    pub project_root: PathBuf,
    /// Directory containing command definitions, relative to the root.
    pub command_dir: String,
    /// Path component stripped from input file paths before package mapping
    /// (for monorepos where diff paths are repository-rooted, e.g. `go/`).
    pub path_prefix: String,
    /// Base reference handed to the VCS diff collaborator.
    pub base_ref: String,
    /// Command file name to resource kind, e.g. `api.go -> Api`.
    pub resource_file_map: BTreeMap<String, ResourceKind>,
    /// Package alias and type name of the command-struct literal.
    pub command_literal_type: (String, String),
    /// Selector method names identifying the dispatcher call inside the
    /// command's run expression.
    pub run_method_names: Vec<String>,
    /// Extra path suffixes always treated as infrastructure files.
    pub infrastructure_files: Vec<String>,
    /// Path substring identifying dependency-injection provider packages.
    pub provider_path_substring: String,
    /// Path segment identifying aggregator packages (packages whose last
    /// segment equals this, or where it is followed only by `internal`).
    pub aggregator_segment: String,
}

impl AnalyzerConfig {
    /// Create a configuration with the required fields and defaults for the
    /// rest.
    pub fn new(module_path: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        let mut resource_file_map = BTreeMap::new();
        resource_file_map.insert("api.go".to_string(), ResourceKind::Api);
        resource_file_map.insert("job.go".to_string(), ResourceKind::Job);
        resource_file_map.insert("worker.go".to_string(), ResourceKind::Worker);

        AnalyzerConfig {
            module_path: module_path.into(),
            project_root: project_root.into(),
            command_dir: DEFAULT_COMMAND_DIR.to_string(),
            path_prefix: String::new(),
            base_ref: DEFAULT_BASE_REF.to_string(),
            resource_file_map,
            command_literal_type: ("cobra".to_string(), "Command".to_string()),
            run_method_names: vec!["Run".to_string(), "RunWorkerPool".to_string()],
            infrastructure_files: Vec::new(),
            provider_path_substring: "/pkg/provider/".to_string(),
            aggregator_segment: "provider".to_string(),
        }
    }

    /// Set the command directory.
    pub fn with_command_dir(mut self, dir: impl Into<String>) -> Self {
        self.command_dir = dir.into();
        self
    }

    /// Set the path prefix stripped from input files.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Set the VCS base reference.
    pub fn with_base_ref(mut self, base_ref: impl Into<String>) -> Self {
        self.base_ref = base_ref.into();
        self
    }

    /// Replace the command file name to resource kind mapping.
    pub fn with_resource_file_map(mut self, map: BTreeMap<String, ResourceKind>) -> Self {
        self.resource_file_map = map;
        self
    }

    /// Set the command-struct literal type, e.g. `("cobra", "Command")`.
    pub fn with_command_literal_type(
        mut self,
        pkg: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.command_literal_type = (pkg.into(), type_name.into());
        self
    }

    /// Add an infrastructure file suffix.
    pub fn with_infrastructure_file(mut self, suffix: impl Into<String>) -> Self {
        self.infrastructure_files.push(suffix.into());
        self
    }

    /// Check the required fields, returning a `Config` error when missing.
    pub fn validate(&self) -> ImpactResult<()> {
        if self.module_path.is_empty() {
            return Err(ImpactError::config("module_path is required"));
        }
        if self.project_root.as_os_str().is_empty() {
            return Err(ImpactError::config("project_root is required"));
        }
        Ok(())
    }

    /// Decide whether a changed file is an infrastructure file.
    ///
    /// Matches the configured suffixes and the built-in generated-schema
    /// patterns, after stripping the path prefix.
    pub fn is_infrastructure_file(&self, file_path: &str) -> bool {
        let normalized = file_path.replace('\\', "/");
        let normalized = normalized
            .strip_prefix(&self.path_prefix)
            .unwrap_or(&normalized);

        let matches = |pattern: &str| {
            normalized == pattern || normalized.ends_with(&format!("/{pattern}"))
        };

        self.infrastructure_files
            .iter()
            .any(|p| matches(&p.replace('\\', "/")))
            || BUILTIN_INFRA_FILES.iter().any(|p| matches(p))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conventions() {
        let cfg = AnalyzerConfig::new("example.com/m", "/tmp/project");
        assert_eq!(cfg.command_dir, "cli/cmd");
        assert_eq!(cfg.base_ref, "origin/main");
        assert_eq!(cfg.resource_file_map.get("api.go"), Some(&ResourceKind::Api));
        assert_eq!(cfg.resource_file_map.get("job.go"), Some(&ResourceKind::Job));
        assert_eq!(
            cfg.resource_file_map.get("worker.go"),
            Some(&ResourceKind::Worker)
        );
        assert_eq!(cfg.command_literal_type.0, "cobra");
        assert_eq!(cfg.run_method_names, vec!["Run", "RunWorkerPool"]);
    }

    #[test]
    fn validate_rejects_empty_module_path() {
        let cfg = AnalyzerConfig::new("", "/tmp/project");
        assert!(matches!(
            cfg.validate(),
            Err(ImpactError::Config { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_root() {
        let cfg = AnalyzerConfig::new("example.com/m", "");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_accepts_complete_config() {
        let cfg = AnalyzerConfig::new("example.com/m", "/tmp/project");
        assert!(cfg.validate().is_ok());
    }

    mod infrastructure_files {
        use super::*;

        #[test]
        fn builtin_patterns_match_by_suffix() {
            let cfg = AnalyzerConfig::new("example.com/m", "/tmp/project");
            assert!(cfg.is_infrastructure_file("sqlc/models.go"));
            assert!(cfg.is_infrastructure_file("internal/db/sqlc/models.go"));
            assert!(!cfg.is_infrastructure_file("svc/models.go"));
        }

        #[test]
        fn configured_entries_match() {
            let cfg = AnalyzerConfig::new("example.com/m", "/tmp/project")
                .with_infrastructure_file("gen/wire.go");
            assert!(cfg.is_infrastructure_file("gen/wire.go"));
            assert!(cfg.is_infrastructure_file("svc/gen/wire.go"));
            assert!(!cfg.is_infrastructure_file("svc/wire.go"));
        }

        #[test]
        fn path_prefix_is_stripped_first() {
            let cfg = AnalyzerConfig::new("example.com/m", "/tmp/project")
                .with_path_prefix("go/")
                .with_infrastructure_file("gen/wire.go");
            assert!(cfg.is_infrastructure_file("go/gen/wire.go"));
        }
    }
}
