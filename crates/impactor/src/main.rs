//! Binary entry point for the impactor CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Which resources does the current branch's diff affect?
//! impactor --vcs-diff --base origin/main
//!
//! # Analyze an explicit file list
//! impactor --files svc/user.go,svc/order.go
//!
//! # Coarse package mode (no symbol refinement)
//! impactor --packages example.com/m/svc --json
//!
//! # Read changed files from stdin
//! git diff --name-only main | impactor
//!
//! # List every discovered resource
//! impactor --list
//! ```
//!
//! Diagnostics go to stderr; stdout carries only the text or JSON report.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use impactor_analysis::{Analyzer, GitDiff};
use impactor_core::output::{JsonWriter, TextWriter};
use impactor_core::{AnalysisReport, AnalyzerConfig, ImpactError, ImpactResult, VcsDiff};

// ============================================================================
// CLI Structure
// ============================================================================

/// Change-impact analysis for Go monorepos.
///
/// Resolves a set of changed files (typically a pull-request diff) to the
/// deployable units actually affected, with the dependency chain for each.
#[derive(Parser, Debug)]
#[command(name = "impactor", version, about = "Change-impact analysis for Go monorepos")]
struct Cli {
    /// List all discovered resources instead of analyzing changes.
    #[arg(long)]
    list: bool,

    /// Emit JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Take the changed file list from the version control system.
    #[arg(long = "vcs-diff", conflicts_with_all = ["files", "packages"])]
    vcs_diff: bool,

    /// Base reference for VCS comparison.
    #[arg(long, default_value = "main")]
    base: String,

    /// Comma-separated list of changed files.
    #[arg(long, conflicts_with = "packages")]
    files: Option<String>,

    /// Comma-separated list of changed packages (coarse mode).
    #[arg(long)]
    packages: Option<String>,

    /// Project root directory (default: walk up to go.mod).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Module path (default: the module directive of go.mod).
    #[arg(long)]
    module: Option<String>,

    /// Directory containing command definitions, relative to the root.
    #[arg(long = "cmd-dir", default_value = "cli/cmd")]
    cmd_dir: String,

    /// Path prefix to strip from changed file paths (e.g. `go/` in a
    /// monorepo whose diffs are repository-rooted).
    #[arg(long = "path-prefix", default_value = "")]
    path_prefix: String,

    /// Extra infrastructure file suffix; may be repeated.
    #[arg(long = "infra-file")]
    infra_files: Vec<String>,

    /// Log level for diagnostics on stderr.
    #[arg(long = "log-level", value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code().code())
        }
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> ImpactResult<()> {
    let project_root = match &cli.root {
        Some(root) => root.clone(),
        None => detect_project_root()?,
    };
    let module_path = match &cli.module {
        Some(module) => module.clone(),
        None => detect_module_path(&project_root)?,
    };

    let mut config = AnalyzerConfig::new(module_path, project_root.clone())
        .with_command_dir(cli.cmd_dir.clone())
        .with_path_prefix(cli.path_prefix.clone())
        .with_base_ref(cli.base.clone());
    for suffix in &cli.infra_files {
        config = config.with_infrastructure_file(suffix.clone());
    }

    let mut analyzer = Analyzer::new(config)?;
    tracing::info!(root = %project_root.display(), "analyzing project");
    analyzer.analyze()?;
    tracing::info!(resources = analyzer.resources().len(), "analysis complete");

    let stdout = io::stdout();

    if cli.list {
        let resources = analyzer.resources();
        if cli.json {
            JsonWriter::new(stdout.lock()).write_resource_list(resources)?;
        } else {
            TextWriter::new(stdout.lock()).write_resource_list(resources)?;
        }
        return Ok(());
    }

    if let Some(packages) = &cli.packages {
        let report = analyze_packages(&analyzer, packages)?;
        return write_report(&report, cli.json);
    }

    let changed_files = collect_changed_files(&cli, &project_root)?;
    if changed_files.is_empty() {
        print_usage_hint();
        return Ok(());
    }

    let affected = analyzer.affected_by_files(&changed_files)?;
    let report = AnalysisReport {
        changed_files,
        affected_resources: affected,
        total_resources: analyzer.resources().len(),
        ..Default::default()
    };
    write_report(&report, cli.json)
}

// ============================================================================
// Change Sources
// ============================================================================

fn collect_changed_files(cli: &Cli, project_root: &Path) -> ImpactResult<Vec<String>> {
    if cli.vcs_diff {
        let git = GitDiff::new(project_root, cli.base.clone());
        let all = git.changed_files(&cli.base)?;
        return Ok(all
            .into_iter()
            .filter(|f| f.ends_with(".go"))
            .filter(|f| cli.path_prefix.is_empty() || f.starts_with(&cli.path_prefix))
            .collect());
    }
    if let Some(files) = &cli.files {
        return Ok(split_list(files));
    }
    // Fall back to stdin, one path per line.
    let stdin = io::stdin();
    let mut files = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            files.push(trimmed.to_string());
        }
    }
    Ok(files)
}

fn analyze_packages(analyzer: &Analyzer, packages: &str) -> ImpactResult<AnalysisReport> {
    let package_list = split_list(packages);
    let mut affected = Vec::new();
    let mut seen = HashSet::new();
    for pkg in &package_list {
        for resource in analyzer.affected_by_package(pkg)? {
            if seen.insert(resource.resource.name.clone()) {
                affected.push(resource);
            }
        }
    }
    Ok(AnalysisReport {
        changed_packages: package_list,
        affected_resources: affected,
        total_resources: analyzer.resources().len(),
        ..Default::default()
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn write_report(report: &AnalysisReport, json: bool) -> ImpactResult<()> {
    let stdout = io::stdout();
    if json {
        JsonWriter::new(stdout.lock()).write_report(report)?;
    } else {
        TextWriter::new(stdout.lock()).write_report(report)?;
    }
    Ok(())
}

fn print_usage_hint() {
    let mut stderr = io::stderr();
    let _ = writeln!(stderr, "No changed files specified");
    let _ = writeln!(stderr, "Usage:");
    let _ = writeln!(stderr, "  impactor --vcs-diff               # Analyze VCS changes");
    let _ = writeln!(stderr, "  impactor --files=a.go,b.go");
    let _ = writeln!(stderr, "  impactor --packages=pkg1,pkg2");
    let _ = writeln!(stderr, "  echo 'file.go' | impactor");
    let _ = writeln!(stderr, "  impactor --list                   # List all resources");
}

// ============================================================================
// Project Detection
// ============================================================================

/// Walk upward from the current directory to the nearest go.mod.
fn detect_project_root() -> ImpactResult<PathBuf> {
    let mut dir = std::env::current_dir()?;
    loop {
        if dir.join("go.mod").is_file() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(ImpactError::config(
                "go.mod not found; pass --root to set the project root",
            ));
        }
    }
}

/// Read the module directive from `<root>/go.mod`.
fn detect_module_path(project_root: &Path) -> ImpactResult<String> {
    let gomod = project_root.join("go.mod");
    let content = std::fs::read_to_string(&gomod).map_err(|e| {
        ImpactError::config(format!(
            "failed to read {}: {e}; pass --module to set the module path",
            gomod.display()
        ))
    })?;
    for line in content.lines() {
        let line = line.trim();
        if let Some(module) = line.strip_prefix("module ") {
            return Ok(module.trim().to_string());
        }
    }
    Err(ImpactError::config(format!(
        "module directive not found in {}",
        gomod.display()
    )))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    mod cli_parsing {
        use super::*;

        #[test]
        fn defaults() {
            let cli = Cli::try_parse_from(["impactor"]).unwrap();
            assert!(!cli.list);
            assert!(!cli.json);
            assert!(!cli.vcs_diff);
            assert_eq!(cli.base, "main");
            assert_eq!(cli.cmd_dir, "cli/cmd");
            assert_eq!(cli.path_prefix, "");
        }

        #[test]
        fn vcs_diff_conflicts_with_files() {
            let result = Cli::try_parse_from(["impactor", "--vcs-diff", "--files", "a.go"]);
            assert!(result.is_err());
        }

        #[test]
        fn files_conflicts_with_packages() {
            let result =
                Cli::try_parse_from(["impactor", "--files", "a.go", "--packages", "p"]);
            assert!(result.is_err());
        }

        #[test]
        fn repeatable_infra_files() {
            let cli = Cli::try_parse_from([
                "impactor",
                "--infra-file",
                "sqlc/models.go",
                "--infra-file",
                "gen/wire.go",
            ])
            .unwrap();
            assert_eq!(cli.infra_files, vec!["sqlc/models.go", "gen/wire.go"]);
        }

        #[test]
        fn list_mode_with_json() {
            let cli = Cli::try_parse_from(["impactor", "--list", "--json"]).unwrap();
            assert!(cli.list);
            assert!(cli.json);
        }
    }

    mod helpers {
        use super::*;

        #[test]
        fn split_list_trims_and_drops_empties() {
            assert_eq!(
                split_list(" a.go , b.go ,,c.go"),
                vec!["a.go", "b.go", "c.go"]
            );
            assert!(split_list("").is_empty());
        }

        #[test]
        fn detect_module_path_reads_directive() {
            let dir = tempfile::TempDir::new().unwrap();
            fs::write(
                dir.path().join("go.mod"),
                "module example.com/org/repo\n\ngo 1.22\n",
            )
            .unwrap();
            assert_eq!(
                detect_module_path(dir.path()).unwrap(),
                "example.com/org/repo"
            );
        }

        #[test]
        fn detect_module_path_missing_directive() {
            let dir = tempfile::TempDir::new().unwrap();
            fs::write(dir.path().join("go.mod"), "go 1.22\n").unwrap();
            assert!(detect_module_path(dir.path()).is_err());
        }
    }
}
