//! Resource and result value types.
//!
//! These are the immutable carriers produced by an analysis run and consumed
//! by the renderers in [`crate::output`]. All of them serialize to the JSON
//! shapes the CLI emits with `--json`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Resource Kind
// ============================================================================

/// The kind of a deployable unit discovered from a command definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// An HTTP/gRPC API service.
    Api,
    /// A scheduled (one-shot) job.
    Job,
    /// A long-running background worker.
    Worker,
}

impl ResourceKind {
    /// Returns the string representation used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Api => "api",
            ResourceKind::Job => "job",
            ResourceKind::Worker => "worker",
        }
    }

    /// Plural section heading used by the text renderer.
    pub fn heading(&self) -> &'static str {
        match self {
            ResourceKind::Api => "API Services",
            ResourceKind::Job => "Jobs",
            ResourceKind::Worker => "Workers",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Resource
// ============================================================================

/// A top-level deployable unit discovered from a command-definition literal.
///
/// Resources are built once during `analyze()` and immutable afterwards. They
/// are uniquely keyed by `name`; on a collision the first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Command name: the first whitespace-delimited token of the `Use` field.
    pub name: String,
    /// Resource kind, derived from the defining file's name.
    pub kind: ResourceKind,
    /// Root implementation package the command dispatches into. Absent when
    /// no recognized dispatcher call was found in the run expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Source file the command literal was found in (project-relative).
    pub source_file: String,
    /// Command description, from the `Short` field.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

// ============================================================================
// Affected Resource
// ============================================================================

/// A resource that an analysis run decided is affected, with the evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedResource {
    /// The affected resource.
    #[serde(flatten)]
    pub resource: Resource,
    /// Human-readable reason, e.g. `depends on example.com/m/svc`.
    pub reason: String,
    /// The changed package that caused the impact.
    pub affected_package: String,
    /// Shortest import path from the resource's implementation package down
    /// to the changed package. Empty when no chain exists (e.g. the change
    /// is in the implementation package itself and equals the start node).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_chain: Vec<String>,
}

// ============================================================================
// Reports
// ============================================================================

/// The full result of one impact-analysis run, as emitted by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Packages the caller asked about directly (package mode only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_packages: Vec<String>,
    /// Changed files the run was given (file/diff/stdin modes).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_files: Vec<String>,
    /// Resources decided to be affected, each at most once.
    pub affected_resources: Vec<AffectedResource>,
    /// Total number of discovered resources, affected or not.
    pub total_resources: usize,
}

/// Resource listing for the `--list` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceListing {
    pub resources: Vec<Resource>,
    pub total: usize,
}

impl ResourceListing {
    pub fn new(resources: Vec<Resource>) -> Self {
        let total = resources.len();
        ResourceListing { resources, total }
    }
}

// ============================================================================
// Tests
// ============================================================================
