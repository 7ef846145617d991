//! In-memory package dependency graph.
//!
//! Built once per `analyze()` from the package lister's records, filtered to
//! packages inside the module. The reverse-import index is computed at build
//! time so `direct_importers` is a lookup rather than a per-query scan.

use std::collections::{HashMap, HashSet};

use impactor_core::PackageRecord;

/// Directed import graph of the module's packages.
#[derive(Debug)]
pub struct DependencyGraph {
    module_path: String,
    /// Package path -> direct in-module imports, in lister order.
    deps: HashMap<String, Vec<String>>,
    /// Package path -> packages that directly import it, sorted.
    importers: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph from lister records. Records outside the module are
    /// dropped; imports are filtered to the module; duplicate records are
    /// tolerated (last write wins).
    pub fn build(module_path: impl Into<String>, records: Vec<PackageRecord>) -> Self {
        let module_path = module_path.into();
        let mut deps: HashMap<String, Vec<String>> = HashMap::new();

        for record in records {
            if !record.import_path.starts_with(&module_path) {
                continue;
            }
            let mut seen = HashSet::new();
            let imports: Vec<String> = record
                .direct_imports
                .into_iter()
                .filter(|imp| imp.starts_with(&module_path) && seen.insert(imp.clone()))
                .collect();
            deps.insert(record.import_path, imports);
        }

        let mut importers: HashMap<String, Vec<String>> = HashMap::new();
        for (pkg, direct) in &deps {
            for dep in direct {
                importers.entry(dep.clone()).or_default().push(pkg.clone());
            }
        }
        for list in importers.values_mut() {
            list.sort();
        }

        DependencyGraph {
            module_path,
            deps,
            importers,
        }
    }

    /// Whether a package path belongs to the module.
    pub fn is_module_package(&self, pkg: &str) -> bool {
        pkg.starts_with(&self.module_path)
    }

    /// Direct dependencies of a package, in lister order.
    pub fn direct_deps(&self, pkg: &str) -> &[String] {
        self.deps.get(pkg).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All transitive dependencies of a package. Cycles are tolerated via
    /// the visited set; the package itself is excluded and every element
    /// appears once.
    pub fn all_deps(&self, pkg: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(pkg);
        let mut result = Vec::new();
        let mut stack: Vec<&str> = self.direct_deps(pkg).iter().rev().map(String::as_str).collect();
        while let Some(dep) = stack.pop() {
            if !visited.insert(dep) {
                continue;
            }
            result.push(dep.to_string());
            for next in self.direct_deps(dep).iter().rev() {
                stack.push(next);
            }
        }
        result
    }

    /// Packages that directly import `pkg`, sorted.
    pub fn direct_importers(&self, pkg: &str) -> &[String] {
        self.importers.get(pkg).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All package paths in the graph.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.deps.keys().map(String::as_str)
    }

    pub fn has_package(&self, pkg: &str) -> bool {
        self.deps.contains_key(pkg)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const M: &str = "example.com/m";

    fn rec(path: &str, imports: &[&str]) -> PackageRecord {
        PackageRecord::new(path, imports.iter().copied())
    }

    fn graph(records: Vec<PackageRecord>) -> DependencyGraph {
        DependencyGraph::build(M, records)
    }

    #[test]
    fn filters_out_foreign_packages_and_imports() {
        let g = graph(vec![
            rec("example.com/m/a", &["example.com/m/b", "github.com/spf13/cobra"]),
            rec("example.com/m/b", &[]),
            rec("github.com/other/pkg", &["example.com/m/a"]),
        ]);
        assert!(g.has_package("example.com/m/a"));
        assert!(!g.has_package("github.com/other/pkg"));
        assert_eq!(g.direct_deps("example.com/m/a"), ["example.com/m/b"]);
    }

    #[test]
    fn duplicate_records_last_write_wins() {
        let g = graph(vec![
            rec("example.com/m/a", &["example.com/m/b"]),
            rec("example.com/m/a", &["example.com/m/c"]),
            rec("example.com/m/b", &[]),
            rec("example.com/m/c", &[]),
        ]);
        assert_eq!(g.direct_deps("example.com/m/a"), ["example.com/m/c"]);
    }

    #[test]
    fn all_deps_is_transitive_and_unique() {
        // a -> b, a -> c, b -> d, c -> d: d must appear exactly once.
        let g = graph(vec![
            rec("example.com/m/a", &["example.com/m/b", "example.com/m/c"]),
            rec("example.com/m/b", &["example.com/m/d"]),
            rec("example.com/m/c", &["example.com/m/d"]),
            rec("example.com/m/d", &[]),
        ]);
        let deps = g.all_deps("example.com/m/a");
        assert_eq!(deps.len(), 3);
        for p in ["example.com/m/b", "example.com/m/c", "example.com/m/d"] {
            assert_eq!(deps.iter().filter(|d| d.as_str() == p).count(), 1);
        }
    }

    #[test]
    fn all_deps_excludes_self_even_in_cycles() {
        let g = graph(vec![
            rec("example.com/m/a", &["example.com/m/b"]),
            rec("example.com/m/b", &["example.com/m/a"]),
        ]);
        let deps = g.all_deps("example.com/m/a");
        assert_eq!(deps, ["example.com/m/b"]);
    }

    #[test]
    fn all_deps_of_unknown_package_is_empty() {
        let g = graph(vec![rec("example.com/m/a", &[])]);
        assert!(g.all_deps("example.com/m/ghost").is_empty());
    }

    #[test]
    fn direct_importers_are_indexed() {
        let g = graph(vec![
            rec("example.com/m/gw", &["example.com/m/svc"]),
            rec("example.com/m/util", &["example.com/m/svc"]),
            rec("example.com/m/svc", &[]),
        ]);
        assert_eq!(
            g.direct_importers("example.com/m/svc"),
            ["example.com/m/gw", "example.com/m/util"]
        );
        assert!(g.direct_importers("example.com/m/gw").is_empty());
    }

    #[test]
    fn module_prefix_check() {
        let g = graph(vec![]);
        assert!(g.is_module_package("example.com/m/anything"));
        assert!(!g.is_module_package("example.org/m"));
    }
}
