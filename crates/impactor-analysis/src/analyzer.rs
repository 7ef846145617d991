//! The impact resolver.
//!
//! `Analyzer` owns the graph, the discovered resources, and the reverse-deps
//! index, and answers "which resources does this change affect?". The
//! resolution pipeline per changed package:
//!
//! 1. The same-package shortcut: a change inside a resource's own package
//!    tree always affects it, unless the change is infrastructure-only.
//! 2. Provider packages resolve through the interface types their factories
//!    return, checked against consumers' injected types.
//! 3. Aggregator packages resolve through the providers referenced by their
//!    changed option-set variables.
//! 4. Everything else takes the general branch: find the packages that
//!    directly import the changed package within the resource's dependency
//!    cone, then demand a continuous chain of exported symbol use from the
//!    resource down to the edit (the bridging check).
//!
//! Bridging is what keeps large dependency fans quiet: an intermediate
//! package that imports a changed package on behalf of consumers only
//! propagates impact through the exported declarations of its own that
//! actually touch the changed symbols.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, warn};

use impactor_core::{
    AffectedResource, AnalyzerConfig, FileSystem, ImpactError, ImpactResult, OsFs, PackageLister,
    Resource, VcsDiff,
};

use crate::di::DiAnalyzer;
use crate::extract::ResourceExtractor;
use crate::golist::GoList;
use crate::graph::DependencyGraph;
use crate::symbols::{ChangedSymbolInfo, SymbolAnalyzer};
use crate::vcs::GitDiff;

// ============================================================================
// Analyzer
// ============================================================================

/// Everything `analyze()` builds, swapped in atomically.
struct AnalysisState {
    graph: DependencyGraph,
    resources: Vec<Resource>,
    /// Package path -> names of resources depending on it.
    reverse_deps: HashMap<String, Vec<String>>,
}

/// Analyzes a project and resolves change impact. Two states: until
/// `analyze()` succeeds the impact queries fail with `NotAnalyzed`;
/// afterwards they never fail and re-running `analyze()` replaces the graph
/// and resources atomically.
pub struct Analyzer {
    config: AnalyzerConfig,
    lister: Box<dyn PackageLister>,
    vcs: Box<dyn VcsDiff>,
    extractor: ResourceExtractor,
    symbols: SymbolAnalyzer,
    di: DiAnalyzer,
    state: Option<AnalysisState>,
}

impl Analyzer {
    /// Create an analyzer backed by the `go` toolchain, `git`, and the real
    /// file system.
    pub fn new(config: AnalyzerConfig) -> ImpactResult<Self> {
        let vcs = GitDiff::new(config.project_root.clone(), config.base_ref.clone());
        Self::with_ports(config, Box::new(GoList), Box::new(vcs), Rc::new(OsFs))
    }

    /// Create an analyzer with explicit collaborator implementations.
    pub fn with_ports(
        config: AnalyzerConfig,
        lister: Box<dyn PackageLister>,
        vcs: Box<dyn VcsDiff>,
        fs: Rc<dyn FileSystem>,
    ) -> ImpactResult<Self> {
        config.validate()?;
        let extractor = ResourceExtractor::from_config(&config);
        let symbols = SymbolAnalyzer::new(
            config.module_path.clone(),
            config.project_root.clone(),
            Rc::clone(&fs),
        );
        let di = DiAnalyzer::new(fs);
        Ok(Analyzer {
            config,
            lister,
            vcs,
            extractor,
            symbols,
            di,
            state: None,
        })
    }

    /// Discover resources, build the dependency graph, and index reverse
    /// dependencies. Idempotent: repeated calls rebuild from scratch.
    pub fn analyze(&mut self) -> ImpactResult<()> {
        let cmd_dir = self.config.project_root.join(&self.config.command_dir);
        let resources = self
            .extractor
            .extract_from_dir(&cmd_dir, &self.config.project_root);
        debug!(count = resources.len(), "extracted resources");

        let records = self.lister.list(&self.config.project_root)?;
        let graph = DependencyGraph::build(&self.config.module_path, records);

        let reverse_deps = build_reverse_deps(&graph, &resources);
        self.state = Some(AnalysisState {
            graph,
            resources,
            reverse_deps,
        });
        Ok(())
    }

    /// The discovered resources; empty before `analyze()`.
    pub fn resources(&self) -> &[Resource] {
        self.state
            .as_ref()
            .map(|s| s.resources.as_slice())
            .unwrap_or(&[])
    }

    /// Names of resources depending on a package; empty before `analyze()`
    /// or for unknown packages.
    pub fn reverse_deps(&self, pkg: &str) -> &[String] {
        self.state
            .as_ref()
            .and_then(|s| s.reverse_deps.get(pkg))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Coarse mode: every resource whose reverse deps include `pkg`, with no
    /// symbol refinement.
    pub fn affected_by_package(&self, pkg: &str) -> ImpactResult<Vec<AffectedResource>> {
        let state = self.state.as_ref().ok_or(ImpactError::NotAnalyzed)?;
        let mut result = Vec::new();
        for name in state.reverse_deps.get(pkg).into_iter().flatten() {
            let Some(resource) = resource_by_name(&state.resources, name) else {
                return Err(ImpactError::invariant(format!(
                    "reverse deps reference unknown resource {name}"
                )));
            };
            result.push(AffectedResource {
                resource: resource.clone(),
                reason: format!("depends on {pkg}"),
                affected_package: pkg.to_string(),
                dependency_chain: dependency_chain(
                    &state.graph,
                    resource.package.as_deref(),
                    pkg,
                ),
            });
        }
        Ok(result)
    }

    /// Resolve the resources affected by a set of changed files, with
    /// symbol-level refinement. Results are sorted by resource name; each
    /// resource appears at most once.
    pub fn affected_by_files(&self, changed_files: &[String]) -> ImpactResult<Vec<AffectedResource>> {
        let state = self.state.as_ref().ok_or(ImpactError::NotAnalyzed)?;

        // Group the files by package, keeping infrastructure classification.
        struct FileMeta {
            abs: PathBuf,
            orig: String,
            infra: bool,
        }
        let mut by_package: BTreeMap<String, Vec<FileMeta>> = BTreeMap::new();
        for file in changed_files {
            let Some(pkg) = self.file_to_package(file) else {
                continue;
            };
            let abs = if std::path::Path::new(file).is_absolute() {
                PathBuf::from(file)
            } else {
                let stripped = file
                    .strip_prefix(&self.config.path_prefix)
                    .unwrap_or(file.as_str());
                self.config.project_root.join(stripped)
            };
            by_package.entry(pkg).or_default().push(FileMeta {
                abs,
                orig: file.clone(),
                infra: self.config.is_infrastructure_file(file),
            });
        }

        let mut affected: BTreeMap<String, AffectedResource> = BTreeMap::new();

        for (pkg, files) in &by_package {
            let all_infra = files.iter().all(|f| f.infra);
            let info = self.summarize_package_change(files.iter().map(|f| (&f.abs, &f.orig, f.infra)), all_infra);
            if info.is_empty() {
                debug!(package = %pkg, "change maps to no exported surface");
                continue;
            }

            for name in state.reverse_deps.get(pkg.as_str()).into_iter().flatten() {
                if affected.contains_key(name) {
                    continue;
                }
                let Some(resource) = resource_by_name(&state.resources, name) else {
                    return Err(ImpactError::invariant(format!(
                        "reverse deps reference unknown resource {name}"
                    )));
                };
                if self.is_affected(state, resource, pkg, &info, all_infra) {
                    affected.insert(
                        name.clone(),
                        AffectedResource {
                            resource: resource.clone(),
                            reason: format!("depends on {pkg}"),
                            affected_package: pkg.clone(),
                            dependency_chain: dependency_chain(
                                &state.graph,
                                resource.package.as_deref(),
                                pkg,
                            ),
                        },
                    );
                }
            }
        }

        Ok(affected.into_values().collect())
    }

    // ------------------------------------------------------------------
    // Change summarization
    // ------------------------------------------------------------------

    /// Merge per-file change info into one per-package summary. Files whose
    /// diff lines are unavailable degrade to their whole exported symbol
    /// set. Infrastructure file symbols only count when every file of the
    /// package is infrastructure, and then feed the strict branch.
    fn summarize_package_change<'a>(
        &self,
        files: impl Iterator<Item = (&'a PathBuf, &'a String, bool)>,
        all_infra: bool,
    ) -> ChangedSymbolInfo {
        let mut symbols = Vec::new();
        let mut infra_symbols = Vec::new();
        let mut interface_methods = Vec::new();
        let mut has_unexported_changes = false;

        for (abs, orig, infra) in files {
            let lines = match self.vcs.changed_lines(orig) {
                Ok(lines) => lines,
                Err(err) => {
                    debug!(file = %orig, error = %err, "diff unavailable, using whole-file symbols");
                    Vec::new()
                }
            };

            if lines.is_empty() {
                // New file, rename, or diff failure: every exported symbol
                // of the file is potentially changed.
                match self.symbols.exported_symbols(abs) {
                    Ok(all) => {
                        if infra {
                            infra_symbols.extend(all);
                        } else {
                            symbols.extend(all);
                        }
                    }
                    Err(err) => warn!(file = %orig, error = %err, "skipping unparseable changed file"),
                }
                continue;
            }

            match self.symbols.changed_symbols_detailed(abs, &lines) {
                Ok(info) => {
                    if infra {
                        infra_symbols.extend(info.symbols);
                    } else {
                        symbols.extend(info.symbols);
                        interface_methods.extend(info.interface_methods);
                        has_unexported_changes |= info.has_unexported_changes;
                    }
                }
                Err(err) => {
                    warn!(file = %orig, error = %err, "falling back to whole-file symbols");
                    if let Ok(all) = self.symbols.exported_symbols(abs) {
                        if infra {
                            infra_symbols.extend(all);
                        } else {
                            symbols.extend(all);
                        }
                    }
                }
            }
        }

        if all_infra {
            symbols = infra_symbols;
        }

        dedupe(&mut symbols);
        let mut seen = HashSet::new();
        interface_methods
            .retain(|m| seen.insert(format!("{}.{}", m.interface_name, m.method_name)));

        // Merged across files, an interface identified method-by-method is
        // still not itself a changed symbol.
        if !interface_methods.is_empty() {
            let iface_names: HashSet<&str> = interface_methods
                .iter()
                .map(|m| m.interface_name.as_str())
                .collect();
            symbols.retain(|s| !iface_names.contains(s.as_str()));
        }

        ChangedSymbolInfo {
            symbols,
            interface_methods,
            has_unexported_changes,
        }
    }

    // ------------------------------------------------------------------
    // Impact decision
    // ------------------------------------------------------------------

    fn is_affected(
        &self,
        state: &AnalysisState,
        resource: &Resource,
        changed_pkg: &str,
        info: &ChangedSymbolInfo,
        infra_only: bool,
    ) -> bool {
        if info.is_empty() {
            return false;
        }
        let Some(impl_pkg) = resource.package.as_deref() else {
            return false;
        };

        // Same-package shortcut: changes inside the resource's own package
        // tree. Infrastructure-only changes never take the shortcut; they
        // must show a symbol-use witness like everyone else.
        if !infra_only
            && (changed_pkg == impl_pkg || changed_pkg.starts_with(&format!("{impl_pkg}/")))
        {
            return true;
        }

        if changed_pkg.contains(&self.config.provider_path_substring) {
            return self.affected_by_provider_change(state, impl_pkg, changed_pkg, info);
        }

        if self.is_aggregator_package(changed_pkg) {
            return self.affected_by_aggregator_change(state, impl_pkg, changed_pkg, info);
        }

        self.affected_by_general_change(state, impl_pkg, changed_pkg, info)
    }

    /// The resource's implementation package plus every dependency that is
    /// one of its subpackages.
    fn packages_to_check(&self, state: &AnalysisState, impl_pkg: &str) -> Vec<String> {
        let mut result = vec![impl_pkg.to_string()];
        let prefix = format!("{impl_pkg}/");
        for dep in state.graph.all_deps(impl_pkg) {
            if dep.starts_with(&prefix) {
                result.push(dep);
            }
        }
        result
    }

    /// Provider packages expose factories returning interface types defined
    /// in a domain package; a consumer is affected when it injects or names
    /// one of those interfaces.
    fn affected_by_provider_change(
        &self,
        state: &AnalysisState,
        impl_pkg: &str,
        changed_pkg: &str,
        info: &ChangedSymbolInfo,
    ) -> bool {
        let provider_dir = self.symbols.package_dir(changed_pkg);

        let mut provided: Vec<String> = Vec::new();
        for sym in &info.symbols {
            provided.extend(
                self.symbols
                    .factory_return_types(&provider_dir, std::slice::from_ref(sym)),
            );
        }
        if provided.is_empty() {
            provided = self
                .symbols
                .factory_return_types(&provider_dir, &["New".to_string()]);
        }
        if provided.is_empty() {
            return false;
        }
        dedupe(&mut provided);

        let interface_packages = self
            .symbols
            .interface_definition_packages(&provider_dir, &provided);

        for pkg in self.packages_to_check(state, impl_pkg) {
            let pkg_dir = self.symbols.package_dir(&pkg);
            for (iface_pkg, iface_names) in &interface_packages {
                if self.di.uses_type(&pkg_dir, iface_pkg, iface_names) {
                    return true;
                }
                if self.symbols.uses_symbol_of(&pkg_dir, iface_pkg, iface_names) {
                    return true;
                }
            }
        }
        false
    }

    /// A package is an aggregator when its last segment is the aggregator
    /// segment, or when that segment is followed only by `internal`, and it
    /// does not live under the provider path.
    fn is_aggregator_package(&self, pkg: &str) -> bool {
        if pkg.contains(&self.config.provider_path_substring) {
            return false;
        }
        let parts: Vec<&str> = pkg.split('/').collect();
        for (i, part) in parts.iter().enumerate() {
            if *part == self.config.aggregator_segment {
                if i == parts.len() - 1 {
                    return true;
                }
                if parts.get(i + 1) == Some(&"internal") {
                    return true;
                }
            }
        }
        false
    }

    /// Aggregators list provider constructors inside option-set variables.
    /// Resolve each referenced provider as a provider change against the
    /// resource.
    fn affected_by_aggregator_change(
        &self,
        state: &AnalysisState,
        impl_pkg: &str,
        changed_pkg: &str,
        info: &ChangedSymbolInfo,
    ) -> bool {
        let aggregator_dir = self.symbols.package_dir(changed_pkg);
        let providers = self.referenced_providers(&aggregator_dir, &info.symbols);
        if providers.is_empty() {
            return false;
        }

        let packages_to_check = self.packages_to_check(state, impl_pkg);
        for provider_pkg in providers {
            let provider_dir = self.symbols.package_dir(&provider_pkg);
            let returns = self
                .symbols
                .factory_return_types(&provider_dir, &["New".to_string()]);
            if returns.is_empty() {
                continue;
            }
            let interface_packages = self
                .symbols
                .interface_definition_packages(&provider_dir, &returns);

            for pkg in &packages_to_check {
                let pkg_dir = self.symbols.package_dir(pkg);
                for (iface_pkg, iface_names) in &interface_packages {
                    if self.di.uses_type(&pkg_dir, iface_pkg, iface_names) {
                        return true;
                    }
                    if self.symbols.uses_symbol_of(&pkg_dir, iface_pkg, iface_names) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Provider packages referenced by the changed option-set variables of
    /// an aggregator package: selector bases resolving to a provider-ish
    /// import, or selections of a `Provider` value.
    fn referenced_providers(
        &self,
        aggregator_dir: &std::path::Path,
        changed_symbols: &[String],
    ) -> Vec<String> {
        let mut providers = Vec::new();
        for file in self.symbols.parse_dir_files(aggregator_dir) {
            let imports = file.import_map();
            for decl in file
                .decls
                .iter()
                .filter(|d| d.kind == impactor_gosyn::DeclKind::Value)
            {
                let is_changed =
                    changed_symbols.is_empty() || changed_symbols.contains(&decl.name);
                if !is_changed {
                    continue;
                }
                for pair in
                    impactor_gosyn::selector_pairs_in(file.tokens(), decl.tokens.clone())
                {
                    if let Some(path) = imports.get(&pair.base) {
                        if path.contains(&self.config.aggregator_segment)
                            || pair.selected == "Provider"
                        {
                            providers.push(path.clone());
                        }
                    }
                }
            }
        }
        dedupe(&mut providers);
        providers
    }

    /// The general branch: within the resource's dependency cone, find the
    /// direct importers of the changed package and require a witness; for
    /// intermediate importers, additionally require the bridge.
    fn affected_by_general_change(
        &self,
        state: &AnalysisState,
        impl_pkg: &str,
        changed_pkg: &str,
        info: &ChangedSymbolInfo,
    ) -> bool {
        let impl_dir = self.symbols.package_dir(impl_pkg);
        let method_names: Vec<String> = {
            let mut names: Vec<String> = info
                .interface_methods
                .iter()
                .map(|m| m.method_name.clone())
                .collect();
            dedupe(&mut names);
            names
        };

        for pkg in self.packages_to_check(state, impl_pkg) {
            let pkg_deps = state.graph.all_deps(&pkg);
            if !pkg_deps.iter().any(|d| d == changed_pkg) {
                continue;
            }

            // The packages inside this cone that actually perform the
            // import of the changed package.
            let scope: HashSet<&str> = std::iter::once(pkg.as_str())
                .chain(pkg_deps.iter().map(String::as_str))
                .collect();
            let importers: Vec<&String> = state
                .graph
                .direct_importers(changed_pkg)
                .iter()
                .filter(|imp| scope.contains(imp.as_str()))
                .collect();

            let pkg_dir = self.symbols.package_dir(&pkg);
            for importer in importers {
                let importer_dir = self.symbols.package_dir(importer);

                if !info.symbols.is_empty()
                    && self
                        .symbols
                        .uses_symbol_of(&importer_dir, changed_pkg, &info.symbols)
                {
                    if importer == &pkg {
                        return true;
                    }
                    let bridge = self.bridge_symbols_by_use(&importer_dir, changed_pkg, &info.symbols);
                    if !bridge.is_empty()
                        && (self.symbols.uses_symbol_of(&pkg_dir, importer, &bridge)
                            || self.symbols.uses_symbol_of(&impl_dir, importer, &bridge))
                    {
                        return true;
                    }
                    debug!(
                        importer = %importer,
                        changed = %changed_pkg,
                        "symbol use not bridged to the resource"
                    );
                }

                if !method_names.is_empty()
                    && self
                        .symbols
                        .calls_method_of(&importer_dir, changed_pkg, &method_names)
                {
                    if importer == &pkg {
                        return true;
                    }
                    let bridge = self.bridge_symbols_by_methods(&importer_dir, &method_names);
                    if !bridge.is_empty()
                        && (self.symbols.uses_symbol_of(&pkg_dir, importer, &bridge)
                            || self.symbols.uses_symbol_of(&impl_dir, importer, &bridge))
                    {
                        return true;
                    }
                    debug!(
                        importer = %importer,
                        changed = %changed_pkg,
                        "method call not bridged to the resource"
                    );
                }
            }
        }
        false
    }

    /// Exported declarations of an intermediate package whose bodies
    /// reference the changed symbols, extended with the interfaces their
    /// factories return: a constructor returning an interface propagates
    /// its impact to the interface.
    fn bridge_symbols_by_use(
        &self,
        importer_dir: &std::path::Path,
        changed_pkg: &str,
        changed_symbols: &[String],
    ) -> Vec<String> {
        let all_exported = self.symbols.all_exported_symbols_in_dir(importer_dir);
        let mut bridge: Vec<String> = all_exported
            .iter()
            .filter(|sym| {
                self.symbols
                    .exported_symbol_uses_of(importer_dir, changed_pkg, changed_symbols, sym)
            })
            .cloned()
            .collect();
        self.extend_with_factory_returns(importer_dir, &all_exported, &mut bridge);
        bridge
    }

    /// As [`Self::bridge_symbols_by_use`], but the evidence is a call of one
    /// of the changed interface methods.
    fn bridge_symbols_by_methods(
        &self,
        importer_dir: &std::path::Path,
        method_names: &[String],
    ) -> Vec<String> {
        let all_exported = self.symbols.all_exported_symbols_in_dir(importer_dir);
        let mut bridge: Vec<String> = all_exported
            .iter()
            .filter(|sym| {
                self.symbols
                    .symbol_calls_methods(importer_dir, method_names, sym)
            })
            .cloned()
            .collect();
        self.extend_with_factory_returns(importer_dir, &all_exported, &mut bridge);
        bridge
    }

    fn extend_with_factory_returns(
        &self,
        importer_dir: &std::path::Path,
        all_exported: &[String],
        bridge: &mut Vec<String>,
    ) {
        if bridge.is_empty() {
            return;
        }
        for rt in self.symbols.factory_return_types(importer_dir, bridge) {
            if all_exported.contains(&rt) && !bridge.contains(&rt) {
                bridge.push(rt);
            }
        }
    }

    // ------------------------------------------------------------------
    // Path mapping
    // ------------------------------------------------------------------

    /// Map a changed file path to its module-qualified package, or `None`
    /// for non-source files and files outside the module tree.
    pub fn file_to_package(&self, file_path: &str) -> Option<String> {
        let normalized = file_path.replace('\\', "/");
        let rel = if std::path::Path::new(&normalized).is_absolute() {
            let root = self.config.project_root.to_string_lossy().replace('\\', "/");
            normalized
                .strip_prefix(&format!("{}/", root.trim_end_matches('/')))?
                .to_string()
        } else {
            normalized
        };
        let rel = rel
            .strip_prefix(&self.config.path_prefix)
            .unwrap_or(&rel)
            .to_string();

        if !rel.ends_with(".go") {
            return None;
        }

        match rel.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => {
                Some(format!("{}/{dir}", self.config.module_path))
            }
            _ => Some(self.config.module_path.clone()),
        }
    }
}

// ============================================================================
// Free helpers
// ============================================================================

fn resource_by_name<'a>(resources: &'a [Resource], name: &str) -> Option<&'a Resource> {
    resources.iter().find(|r| r.name == name)
}

fn dedupe(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}

/// Resource names indexed by every package they transitively depend on.
fn build_reverse_deps(
    graph: &DependencyGraph,
    resources: &[Resource],
) -> HashMap<String, Vec<String>> {
    let mut reverse: HashMap<String, Vec<String>> = HashMap::new();
    for resource in resources {
        let Some(impl_pkg) = resource.package.as_deref() else {
            continue;
        };
        reverse
            .entry(impl_pkg.to_string())
            .or_default()
            .push(resource.name.clone());
        for dep in graph.all_deps(impl_pkg) {
            reverse.entry(dep).or_default().push(resource.name.clone());
        }
    }
    for names in reverse.values_mut() {
        let mut seen = HashSet::new();
        names.retain(|n| seen.insert(n.clone()));
    }
    reverse
}

/// Shortest import path from `from` to `to` via breadth-first search over
/// direct dependencies. Ties break by discovery order, which follows the
/// lister's input order, so chains are deterministic.
fn dependency_chain(graph: &DependencyGraph, from: Option<&str>, to: &str) -> Vec<String> {
    let Some(from) = from else {
        return Vec::new();
    };
    if from == to {
        return vec![from.to_string()];
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: std::collections::VecDeque<(&str, Vec<String>)> =
        std::collections::VecDeque::new();
    queue.push_back((from, vec![from.to_string()]));

    while let Some((current, path)) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        for dep in graph.direct_deps(current) {
            let mut next_path = path.clone();
            next_path.push(dep.clone());
            if dep == to {
                return next_path;
            }
            queue.push_back((dep.as_str(), next_path));
        }
    }
    Vec::new()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use impactor_core::{PackageRecord, ResourceKind};
    use std::path::Path;

    struct StaticLister(Vec<PackageRecord>);
    impl PackageLister for StaticLister {
        fn list(&self, _root: &Path) -> ImpactResult<Vec<PackageRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingLister;
    impl PackageLister for FailingLister {
        fn list(&self, _root: &Path) -> ImpactResult<Vec<PackageRecord>> {
            Err(ImpactError::lister("boom"))
        }
    }

    struct NoDiff;
    impl VcsDiff for NoDiff {
        fn changed_files(&self, _base_ref: &str) -> ImpactResult<Vec<String>> {
            Ok(Vec::new())
        }
        fn changed_lines(&self, _file_path: &str) -> ImpactResult<Vec<u32>> {
            Ok(Vec::new())
        }
    }

    fn analyzer_at(root: &Path, records: Vec<PackageRecord>) -> Analyzer {
        let config = AnalyzerConfig::new("example.com/m", root);
        Analyzer::with_ports(
            config,
            Box::new(StaticLister(records)),
            Box::new(NoDiff),
            Rc::new(OsFs),
        )
        .unwrap()
    }

    mod state_machine {
        use super::*;

        #[test]
        fn queries_fail_before_analyze() {
            let dir = tempfile::TempDir::new().unwrap();
            let a = analyzer_at(dir.path(), vec![]);
            assert!(matches!(
                a.affected_by_files(&["svc/a.go".to_string()]),
                Err(ImpactError::NotAnalyzed)
            ));
            assert!(matches!(
                a.affected_by_package("example.com/m/svc"),
                Err(ImpactError::NotAnalyzed)
            ));
            assert!(a.resources().is_empty());
            assert!(a.reverse_deps("example.com/m/svc").is_empty());
        }

        #[test]
        fn analyze_transitions_to_ready() {
            let dir = tempfile::TempDir::new().unwrap();
            let mut a = analyzer_at(dir.path(), vec![]);
            a.analyze().unwrap();
            assert!(a.affected_by_files(&[]).unwrap().is_empty());
        }

        #[test]
        fn lister_failure_is_fatal() {
            let dir = tempfile::TempDir::new().unwrap();
            let config = AnalyzerConfig::new("example.com/m", dir.path());
            let mut a = Analyzer::with_ports(
                config,
                Box::new(FailingLister),
                Box::new(NoDiff),
                Rc::new(OsFs),
            )
            .unwrap();
            assert!(matches!(a.analyze(), Err(ImpactError::Lister { .. })));
            // Still uninitialized afterwards.
            assert!(matches!(
                a.affected_by_package("x"),
                Err(ImpactError::NotAnalyzed)
            ));
        }

        #[test]
        fn invalid_config_is_rejected_at_construction() {
            let result = Analyzer::with_ports(
                AnalyzerConfig::new("", "/tmp"),
                Box::new(StaticLister(vec![])),
                Box::new(NoDiff),
                Rc::new(OsFs),
            );
            assert!(matches!(result, Err(ImpactError::Config { .. })));
        }
    }

    mod path_mapping {
        use super::*;

        #[test]
        fn file_maps_to_module_qualified_package() {
            let dir = tempfile::TempDir::new().unwrap();
            let a = analyzer_at(dir.path(), vec![]);
            assert_eq!(
                a.file_to_package("svc/user/a.go").as_deref(),
                Some("example.com/m/svc/user")
            );
            assert_eq!(
                a.file_to_package("main.go").as_deref(),
                Some("example.com/m")
            );
        }

        #[test]
        fn non_go_files_map_to_nothing() {
            let dir = tempfile::TempDir::new().unwrap();
            let a = analyzer_at(dir.path(), vec![]);
            assert_eq!(a.file_to_package("README.md"), None);
            assert_eq!(a.file_to_package("svc/queries.sql"), None);
        }

        #[test]
        fn path_prefix_is_stripped() {
            let dir = tempfile::TempDir::new().unwrap();
            let config =
                AnalyzerConfig::new("example.com/m", dir.path()).with_path_prefix("go/");
            let a = Analyzer::with_ports(
                config,
                Box::new(StaticLister(vec![])),
                Box::new(NoDiff),
                Rc::new(OsFs),
            )
            .unwrap();
            assert_eq!(
                a.file_to_package("go/svc/a.go").as_deref(),
                Some("example.com/m/svc")
            );
        }
    }

    mod aggregator_detection {
        use super::*;

        #[test]
        fn trailing_provider_segment() {
            let dir = tempfile::TempDir::new().unwrap();
            let a = analyzer_at(dir.path(), vec![]);
            assert!(a.is_aggregator_package("example.com/m/job/provider"));
            assert!(a.is_aggregator_package("example.com/m/provider/internal"));
            assert!(!a.is_aggregator_package("example.com/m/job"));
        }

        #[test]
        fn provider_path_is_not_an_aggregator() {
            let dir = tempfile::TempDir::new().unwrap();
            let a = analyzer_at(dir.path(), vec![]);
            assert!(!a.is_aggregator_package("example.com/m/pkg/provider/mcm"));
        }
    }

    mod reverse_deps {
        use super::*;

        fn resource(name: &str, pkg: Option<&str>) -> Resource {
            Resource {
                name: name.to_string(),
                kind: ResourceKind::Api,
                package: pkg.map(String::from),
                source_file: "cli/cmd/api.go".to_string(),
                description: String::new(),
            }
        }

        #[test]
        fn index_covers_impl_package_and_transitive_deps() {
            let graph = DependencyGraph::build(
                "example.com/m",
                vec![
                    PackageRecord::new("example.com/m/gw", ["example.com/m/svc"]),
                    PackageRecord::new("example.com/m/svc", ["example.com/m/db"]),
                    PackageRecord::new("example.com/m/db", Vec::<String>::new()),
                ],
            );
            let resources = vec![resource("gw", Some("example.com/m/gw"))];
            let reverse = build_reverse_deps(&graph, &resources);
            assert_eq!(reverse["example.com/m/gw"], vec!["gw"]);
            assert_eq!(reverse["example.com/m/svc"], vec!["gw"]);
            assert_eq!(reverse["example.com/m/db"], vec!["gw"]);
        }

        #[test]
        fn resource_without_package_is_not_indexed() {
            let graph = DependencyGraph::build("example.com/m", vec![]);
            let reverse = build_reverse_deps(&graph, &[resource("orphan", None)]);
            assert!(reverse.is_empty());
        }
    }

    mod chains {
        use super::*;

        fn diamond() -> DependencyGraph {
            DependencyGraph::build(
                "example.com/m",
                vec![
                    PackageRecord::new("example.com/m/a", ["example.com/m/b", "example.com/m/c"]),
                    PackageRecord::new("example.com/m/b", ["example.com/m/d"]),
                    PackageRecord::new(
                        "example.com/m/c",
                        ["example.com/m/e"],
                    ),
                    PackageRecord::new("example.com/m/e", ["example.com/m/d"]),
                    PackageRecord::new("example.com/m/d", Vec::<String>::new()),
                ],
            )
        }

        #[test]
        fn shortest_path_wins() {
            let chain = dependency_chain(&diamond(), Some("example.com/m/a"), "example.com/m/d");
            assert_eq!(
                chain,
                vec!["example.com/m/a", "example.com/m/b", "example.com/m/d"]
            );
        }

        #[test]
        fn identity_chain() {
            let chain = dependency_chain(&diamond(), Some("example.com/m/a"), "example.com/m/a");
            assert_eq!(chain, vec!["example.com/m/a"]);
        }

        #[test]
        fn unreachable_target_gives_empty_chain() {
            let chain = dependency_chain(&diamond(), Some("example.com/m/d"), "example.com/m/a");
            assert!(chain.is_empty());
        }

        #[test]
        fn no_start_gives_empty_chain() {
            let chain = dependency_chain(&diamond(), None, "example.com/m/a");
            assert!(chain.is_empty());
        }
    }
}
