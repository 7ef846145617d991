//! Subprocess adapter for the package-lister port.
//!
//! Runs `go list -json ./...` and decodes the concatenated JSON object
//! stream it emits. Non-module packages pass through unfiltered; the graph
//! drops them.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::warn;

use impactor_core::{ImpactError, ImpactResult, PackageLister, PackageRecord};

/// Package lister backed by the `go` toolchain.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoList;

#[derive(Debug, Deserialize)]
struct GoListPackage {
    #[serde(rename = "ImportPath")]
    import_path: String,
    #[serde(rename = "Imports", default)]
    imports: Vec<String>,
}

impl PackageLister for GoList {
    fn list(&self, root: &Path) -> ImpactResult<Vec<PackageRecord>> {
        let output = Command::new("go")
            .args(["list", "-json", "./..."])
            .current_dir(root)
            .output()
            .map_err(|e| ImpactError::lister(format!("failed to run go list: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ImpactError::lister(format!(
                "go list exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let mut records = Vec::new();
        let stream =
            serde_json::Deserializer::from_slice(&output.stdout).into_iter::<GoListPackage>();
        for item in stream {
            match item {
                Ok(pkg) => records.push(PackageRecord {
                    import_path: pkg.import_path,
                    direct_imports: pkg.imports,
                }),
                Err(err) => {
                    // A malformed trailing object ends the stream; keep what
                    // decoded cleanly.
                    warn!(error = %err, "stopping go list decode on malformed object");
                    break;
                }
            }
        }
        Ok(records)
    }
}

// ============================================================================
// Tests
// ============================================================================
