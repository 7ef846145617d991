//! Resource discovery from command definitions.
//!
//! Walks the command directory for the configured file names (`api.go`,
//! `job.go`, `worker.go` by default), scans each for address-taken command
//! literals, and extracts the resource name, description, and the
//! implementation package the command dispatches into.

use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use impactor_core::{AnalyzerConfig, Resource, ResourceKind};
use impactor_gosyn::{method_calls_in, GoFile};

/// Extracts resources from the command directory.
pub struct ResourceExtractor {
    resource_file_map: Vec<(String, ResourceKind)>,
    command_literal_type: (String, String),
    run_method_names: Vec<String>,
}

impl ResourceExtractor {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        ResourceExtractor {
            resource_file_map: config
                .resource_file_map
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            command_literal_type: config.command_literal_type.clone(),
            run_method_names: config.run_method_names.clone(),
        }
    }

    fn kind_for(&self, file_name: &str) -> Option<ResourceKind> {
        self.resource_file_map
            .iter()
            .find(|(name, _)| name == file_name)
            .map(|(_, kind)| *kind)
    }

    /// Extract every resource defined under `cmd_dir`. A missing directory
    /// yields an empty list; a file that fails to parse is skipped.
    pub fn extract_from_dir(&self, cmd_dir: &Path, project_root: &Path) -> Vec<Resource> {
        if !cmd_dir.is_dir() {
            return Vec::new();
        }

        let mut resources = Vec::new();
        for entry in WalkDir::new(cmd_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let Some(kind) = self.kind_for(file_name) else {
                continue;
            };

            let src = match std::fs::read_to_string(path) {
                Ok(src) => src,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping unreadable command file");
                    continue;
                }
            };
            let file = match GoFile::parse(&src) {
                Ok(file) => file,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping unparseable command file");
                    continue;
                }
            };

            let source_file = path
                .strip_prefix(project_root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            resources.extend(self.extract_from_file(&file, kind, &source_file));
        }
        resources
    }

    fn extract_from_file(&self, file: &GoFile, kind: ResourceKind, source_file: &str) -> Vec<Resource> {
        let (lit_pkg, lit_type) = &self.command_literal_type;
        let imports = file.import_map();
        let mut resources = Vec::new();

        for lit in file.composite_literals(lit_pkg, lit_type) {
            // A literal without a Use string defines no resource.
            let Some(use_value) = lit.string_field("Use") else {
                continue;
            };
            let name = use_value.split_whitespace().next().unwrap_or("");
            if name.is_empty() {
                continue;
            }
            let description = lit.string_field("Short").unwrap_or("").to_string();

            let package = lit.field_tokens("RunE").and_then(|range| {
                method_calls_in(file.tokens(), range)
                    .into_iter()
                    .find_map(|call| {
                        if !self.run_method_names.iter().any(|m| m == &call.name) {
                            return None;
                        }
                        let alias = call.base?;
                        imports.get(&alias).cloned()
                    })
            });

            resources.push(Resource {
                name: name.to_string(),
                kind,
                package,
                source_file: source_file.to_string(),
                description,
            });
        }
        resources
    }
}

// ============================================================================
// Tests
// ============================================================================
