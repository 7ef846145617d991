//! Dependency-injection usage analysis.
//!
//! A consumer can receive an interface value through injection without ever
//! naming the provider package's constructor: only a struct field or a
//! constructor parameter carries the type, and only the interface's methods
//! are invoked on it. This pass finds those field and parameter type
//! references and resolves them to fully qualified names.

use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use impactor_core::FileSystem;
use impactor_gosyn::{GoFile, TypeRef};

/// Type and import usage of one package directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiUsage {
    /// Fully qualified type references appearing as function parameter types
    /// or struct field types. Locally defined types stay bare.
    pub used_types: Vec<String>,
    /// Every import path appearing in any file of the package.
    pub direct_imports: Vec<String>,
}

/// Scans packages for injected-type usage.
pub struct DiAnalyzer {
    fs: Rc<dyn FileSystem>,
}

impl DiAnalyzer {
    pub fn new(fs: Rc<dyn FileSystem>) -> Self {
        DiAnalyzer { fs }
    }

    /// Collect the injected-type usage of a package directory.
    pub fn analyze_dir(&self, pkg_dir: &Path) -> DiUsage {
        let mut usage = DiUsage::default();
        let mut seen_types = HashSet::new();
        let mut seen_imports = HashSet::new();

        let entries = match self.fs.read_dir(pkg_dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %pkg_dir.display(), error = %err, "package directory unreadable");
                return usage;
            }
        };

        for path in entries {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.ends_with(".go") || name.ends_with("_test.go") {
                continue;
            }
            let Ok(src) = self.fs.read_file(&path) else {
                continue;
            };
            let Ok(file) = GoFile::parse(&src) else {
                continue;
            };

            for imp in &file.imports {
                if seen_imports.insert(imp.path.clone()) {
                    usage.direct_imports.push(imp.path.clone());
                }
            }

            let imports = file.import_map();
            let qualify = |r: &TypeRef| -> String {
                match &r.qualifier {
                    Some(q) => match imports.get(q) {
                        Some(path) => format!("{path}.{}", r.name),
                        None => format!("{q}.{}", r.name),
                    },
                    None => r.name.clone(),
                }
            };

            for sig in &file.signatures {
                for param in &sig.params {
                    let full = qualify(param);
                    if seen_types.insert(full.clone()) {
                        usage.used_types.push(full);
                    }
                }
            }
            for field in &file.struct_field_types {
                let full = qualify(field);
                if seen_types.insert(full.clone()) {
                    usage.used_types.push(full);
                }
            }
        }

        usage
    }

    /// Whether the package uses one of `type_names` from `target_pkg` as a
    /// parameter or field type.
    pub fn uses_type(&self, pkg_dir: &Path, target_pkg: &str, type_names: &[String]) -> bool {
        if type_names.is_empty() {
            return false;
        }
        let usage = self.analyze_dir(pkg_dir);
        for used in &usage.used_types {
            for t in type_names {
                if used == &format!("{target_pkg}.{t}") {
                    return true;
                }
                // Tolerate re-exported or vendored qualifications.
                if used.ends_with(&format!(".{t}")) && used.contains(target_pkg) {
                    return true;
                }
            }
        }
        false
    }

    /// Whether the package directly imports `target_pkg` in any file.
    pub fn imports_package(&self, pkg_dir: &Path, target_pkg: &str) -> bool {
        self.analyze_dir(pkg_dir)
            .direct_imports
            .iter()
            .any(|i| i == target_pkg)
    }
}

// ============================================================================
// Tests
// ============================================================================
