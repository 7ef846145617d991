//! Symbol-level analysis over Go packages.
//!
//! Two layers live here. The per-file layer maps declarations to line
//! ranges and changed lines to changed symbols. The cross-file layer runs
//! witness searches over a package directory: does any non-test file import
//! the changed package and actually mention the changed symbols, or call the
//! changed interface methods?
//!
//! The method-call witness is deliberately conservative: inside a file that
//! imports the target package, any call of a matching method name counts,
//! even on a receiver variable. Interface values arrive through dependency
//! injection typed against the provider package, so tracing method identity
//! through types is not possible syntactically; recall wins over precision.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use impactor_core::{FileSystem, ImpactError, ImpactResult};
use impactor_gosyn::{method_calls_in, selector_pairs_in, DeclKind, GoFile};

// ============================================================================
// Value types
// ============================================================================

/// A declaration's 1-based inclusive line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRange {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// One interface method with its enclosing interface and line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMethodRange {
    pub interface_name: String,
    pub method_name: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// The merged outcome of mapping changed lines onto one file's declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedSymbolInfo {
    /// Exported changed symbols (interface names whose methods were
    /// individually identified are excluded).
    pub symbols: Vec<String>,
    /// Changed interface methods.
    pub interface_methods: Vec<InterfaceMethodRange>,
    /// Whether any changed line sits inside an unexported function.
    pub has_unexported_changes: bool,
}

impl ChangedSymbolInfo {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.interface_methods.is_empty()
    }
}

// ============================================================================
// Symbol analyzer
// ============================================================================

/// Per-file and cross-file symbol analysis with a parse cache.
///
/// The cache is keyed by file path and safe for the lifetime of one
/// analyzer because the file system is read-only during a run.
pub struct SymbolAnalyzer {
    module_path: String,
    project_root: PathBuf,
    fs: Rc<dyn FileSystem>,
    cache: RefCell<HashMap<PathBuf, Rc<GoFile>>>,
}

impl SymbolAnalyzer {
    pub fn new(
        module_path: impl Into<String>,
        project_root: impl Into<PathBuf>,
        fs: Rc<dyn FileSystem>,
    ) -> Self {
        SymbolAnalyzer {
            module_path: module_path.into(),
            project_root: project_root.into(),
            fs,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The directory a module-qualified package path maps to.
    pub fn package_dir(&self, pkg_path: &str) -> PathBuf {
        let rel = pkg_path
            .strip_prefix(&self.module_path)
            .unwrap_or(pkg_path)
            .trim_start_matches('/');
        if rel.is_empty() {
            self.project_root.clone()
        } else {
            self.project_root.join(rel)
        }
    }

    /// Parse a file, memoized per analyzer instance.
    pub fn parse_file(&self, path: &Path) -> ImpactResult<Rc<GoFile>> {
        if let Some(file) = self.cache.borrow().get(path) {
            return Ok(Rc::clone(file));
        }
        let src = self
            .fs
            .read_file(path)
            .map_err(|e| ImpactError::parse(path.display().to_string(), e.to_string()))?;
        let file = GoFile::parse(&src)
            .map_err(|e| ImpactError::parse(path.display().to_string(), e.to_string()))?;
        let file = Rc::new(file);
        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&file));
        Ok(file)
    }

    /// Non-test Go files directly inside a package directory. Errors degrade
    /// to an empty listing, which makes every witness search answer "no".
    fn go_files_in(&self, pkg_dir: &Path) -> Vec<PathBuf> {
        let entries = match self.fs.read_dir(pkg_dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %pkg_dir.display(), error = %err, "package directory unreadable");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .filter(|p| {
                let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.ends_with(".go") && !name.ends_with("_test.go") && !self.fs.is_dir(p)
            })
            .collect()
    }

    /// Parse every non-test Go file of a package directory, skipping files
    /// that fail to parse.
    pub fn parse_dir_files(&self, pkg_dir: &Path) -> Vec<Rc<GoFile>> {
        self.go_files_in(pkg_dir)
            .into_iter()
            .filter_map(|path| self.parse_file(&path).ok())
            .collect()
    }

    // ------------------------------------------------------------------
    // Per-file queries
    // ------------------------------------------------------------------

    /// Names of all exported top-level declarations in a file.
    pub fn exported_symbols(&self, path: &Path) -> ImpactResult<Vec<String>> {
        let file = self.parse_file(path)?;
        Ok(file
            .exported_decl_names()
            .into_iter()
            .map(String::from)
            .collect())
    }

    fn ranges_of_kind(&self, path: &Path, kind: DeclKind) -> ImpactResult<Vec<SymbolRange>> {
        let file = self.parse_file(path)?;
        Ok(file
            .decls
            .iter()
            .filter(|d| d.kind == kind && d.exported)
            .map(|d| SymbolRange {
                name: d.name.clone(),
                start_line: d.start_line,
                end_line: d.end_line,
            })
            .collect())
    }

    /// Exported function and method ranges.
    pub fn function_ranges(&self, path: &Path) -> ImpactResult<Vec<SymbolRange>> {
        self.ranges_of_kind(path, DeclKind::Func)
    }

    /// Exported type declaration ranges.
    pub fn type_ranges(&self, path: &Path) -> ImpactResult<Vec<SymbolRange>> {
        self.ranges_of_kind(path, DeclKind::Type)
    }

    /// Exported var/const declaration ranges.
    pub fn value_ranges(&self, path: &Path) -> ImpactResult<Vec<SymbolRange>> {
        self.ranges_of_kind(path, DeclKind::Value)
    }

    /// Method ranges of exported interfaces.
    pub fn interface_method_ranges(&self, path: &Path) -> ImpactResult<Vec<InterfaceMethodRange>> {
        let file = self.parse_file(path)?;
        Ok(file
            .interface_methods
            .iter()
            .map(|m| InterfaceMethodRange {
                interface_name: m.interface_name.clone(),
                method_name: m.method_name.clone(),
                start_line: m.start_line,
                end_line: m.end_line,
            })
            .collect())
    }

    /// Exported symbols whose declaration range overlaps any changed line.
    pub fn changed_symbols(&self, path: &Path, lines: &[u32]) -> ImpactResult<Vec<String>> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let file = self.parse_file(path)?;
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for decl in file.decls.iter().filter(|d| d.exported) {
            let hit = lines
                .iter()
                .any(|l| *l >= decl.start_line && *l <= decl.end_line);
            if hit && seen.insert(decl.name.clone()) {
                result.push(decl.name.clone());
            }
        }
        Ok(result)
    }

    /// Whether any changed line sits inside an unexported function.
    pub fn has_unexported_change(&self, path: &Path, lines: &[u32]) -> ImpactResult<bool> {
        if lines.is_empty() {
            return Ok(false);
        }
        let file = self.parse_file(path)?;
        Ok(file
            .decls
            .iter()
            .filter(|d| d.kind == DeclKind::Func && !d.exported)
            .any(|d| lines.iter().any(|l| *l >= d.start_line && *l <= d.end_line)))
    }

    /// Map changed lines to the full change summary for one file.
    ///
    /// Interface names whose methods were individually identified are not
    /// reported as changed symbols: the interface type's identity did not
    /// change, only specific methods did. An edit inside an unexported
    /// function unions in every exported symbol of the file, since any
    /// exported sibling may call the changed code.
    pub fn changed_symbols_detailed(
        &self,
        path: &Path,
        lines: &[u32],
    ) -> ImpactResult<ChangedSymbolInfo> {
        if lines.is_empty() {
            return Ok(ChangedSymbolInfo::default());
        }

        let mut symbols = self.changed_symbols(path, lines)?;

        let mut interface_methods = Vec::new();
        let mut seen = HashSet::new();
        for m in self.interface_method_ranges(path)? {
            let hit = lines
                .iter()
                .any(|l| *l >= m.start_line && *l <= m.end_line);
            let key = format!("{}.{}", m.interface_name, m.method_name);
            if hit && seen.insert(key) {
                interface_methods.push(m);
            }
        }

        if !interface_methods.is_empty() {
            let iface_names: HashSet<&str> = interface_methods
                .iter()
                .map(|m| m.interface_name.as_str())
                .collect();
            symbols.retain(|s| !iface_names.contains(s.as_str()));
        }

        let has_unexported_changes = self.has_unexported_change(path, lines)?;
        if has_unexported_changes {
            let present: HashSet<String> = symbols.iter().cloned().collect();
            for sym in self.exported_symbols(path)? {
                if !present.contains(&sym) {
                    symbols.push(sym);
                }
            }
        }

        Ok(ChangedSymbolInfo {
            symbols,
            interface_methods,
            has_unexported_changes,
        })
    }

    // ------------------------------------------------------------------
    // Cross-file witness queries
    // ------------------------------------------------------------------

    /// Whether any file in `pkg_dir` imports `target_pkg` and references one
    /// of `symbols` through the import's alias.
    pub fn uses_symbol_of(&self, pkg_dir: &Path, target_pkg: &str, symbols: &[String]) -> bool {
        if symbols.is_empty() {
            return false;
        }
        for path in self.go_files_in(pkg_dir) {
            let file = match self.parse_file(&path) {
                Ok(f) => f,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping unparseable file");
                    continue;
                }
            };
            let Some(alias) = file.alias_for(target_pkg) else {
                continue;
            };
            if file.has_selector_use(&alias, symbols) {
                return true;
            }
        }
        false
    }

    /// Whether any file in `pkg_dir` imports `target_pkg` and calls one of
    /// `method_names`. A qualified `alias.M(...)` counts; so does any
    /// `receiver.M(...)` in a file that imports the target package.
    pub fn calls_method_of(
        &self,
        pkg_dir: &Path,
        target_pkg: &str,
        method_names: &[String],
    ) -> bool {
        if method_names.is_empty() {
            return false;
        }
        for path in self.go_files_in(pkg_dir) {
            let file = match self.parse_file(&path) {
                Ok(f) => f,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping unparseable file");
                    continue;
                }
            };
            if file.alias_for(target_pkg).is_none() {
                continue;
            }
            let calls = method_calls_in(file.tokens(), 0..file.tokens().len());
            if calls
                .iter()
                .any(|c| method_names.iter().any(|m| m == &c.name))
            {
                return true;
            }
        }
        false
    }

    /// Whether the single top-level declaration `symbol_name` in `pkg_dir`
    /// references one of `target_symbols` from `target_pkg`.
    pub fn exported_symbol_uses_of(
        &self,
        pkg_dir: &Path,
        target_pkg: &str,
        target_symbols: &[String],
        symbol_name: &str,
    ) -> bool {
        if target_symbols.is_empty() {
            return false;
        }
        for path in self.go_files_in(pkg_dir) {
            let Ok(file) = self.parse_file(&path) else {
                continue;
            };
            let Some(alias) = file.alias_for(target_pkg) else {
                continue;
            };
            let Some(decl) = file.decl_named(symbol_name) else {
                continue;
            };
            let pairs = selector_pairs_in(file.tokens(), decl.tokens.clone());
            if pairs.iter().any(|p| {
                p.base == alias && target_symbols.iter().any(|s| s == &p.selected)
            }) {
                return true;
            }
        }
        false
    }

    /// Whether the function `symbol_name` in `pkg_dir` calls one of
    /// `method_names`. No import filter: the caller already established the
    /// package relationship.
    pub fn symbol_calls_methods(
        &self,
        pkg_dir: &Path,
        method_names: &[String],
        symbol_name: &str,
    ) -> bool {
        if method_names.is_empty() {
            return false;
        }
        for path in self.go_files_in(pkg_dir) {
            let Ok(file) = self.parse_file(&path) else {
                continue;
            };
            let Some(decl) = file.decl_named(symbol_name) else {
                continue;
            };
            if decl.kind != DeclKind::Func {
                continue;
            }
            let calls = method_calls_in(file.tokens(), decl.tokens.clone());
            if calls
                .iter()
                .any(|c| method_names.iter().any(|m| m == &c.name))
            {
                return true;
            }
        }
        false
    }

    /// Every exported symbol declared in any non-test file of a package,
    /// de-duplicated in discovery order.
    pub fn all_exported_symbols_in_dir(&self, pkg_dir: &Path) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for path in self.go_files_in(pkg_dir) {
            let Ok(file) = self.parse_file(&path) else {
                continue;
            };
            for name in file.exported_decl_names() {
                if seen.insert(name.to_string()) {
                    result.push(name.to_string());
                }
            }
        }
        result
    }

    /// Exported single-identifier result type names of the named functions.
    pub fn factory_return_types(&self, pkg_dir: &Path, function_names: &[String]) -> Vec<String> {
        let mut result = Vec::new();
        for path in self.go_files_in(pkg_dir) {
            let Ok(file) = self.parse_file(&path) else {
                continue;
            };
            for sig in &file.signatures {
                if !function_names.iter().any(|f| f == &sig.name) {
                    continue;
                }
                for res in &sig.results {
                    if impactor_gosyn::is_exported(&res.name) && !result.contains(&res.name) {
                        result.push(res.name.clone());
                    }
                }
            }
        }
        result
    }

    /// Map each of `type_names` to the package that defines it, discovered
    /// from qualified result types in the provider package's functions.
    pub fn interface_definition_packages(
        &self,
        provider_dir: &Path,
        type_names: &[String],
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for path in self.go_files_in(provider_dir) {
            let Ok(file) = self.parse_file(&path) else {
                continue;
            };
            let imports = file.import_map();
            for sig in &file.signatures {
                for res in &sig.results {
                    let Some(qualifier) = &res.qualifier else {
                        continue;
                    };
                    if !type_names.iter().any(|t| t == &res.name) {
                        continue;
                    }
                    if let Some(pkg_path) = imports.get(qualifier) {
                        let entry = result.entry(pkg_path.clone()).or_default();
                        if !entry.contains(&res.name) {
                            entry.push(res.name.clone());
                        }
                    }
                }
            }
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
