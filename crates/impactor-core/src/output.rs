//! Text and JSON renderers for analysis results.
//!
//! Both writers render into any `io::Write`, so the CLI can point them at
//! stdout and tests at a buffer.

use std::io::{self, Write};

use crate::types::{AnalysisReport, Resource, ResourceKind, ResourceListing};

// ============================================================================
// Text Output
// ============================================================================

/// Renders analysis results as human-readable text.
pub struct TextWriter<W: Write> {
    writer: W,
}

impl<W: Write> TextWriter<W> {
    pub fn new(writer: W) -> Self {
        TextWriter { writer }
    }

    /// Render one impact-analysis run.
    pub fn write_report(&mut self, report: &AnalysisReport) -> io::Result<()> {
        writeln!(self.writer, "=== Impact Analysis Result ===")?;
        writeln!(self.writer)?;

        if !report.changed_files.is_empty() {
            writeln!(self.writer, "Changed Files:")?;
            for f in &report.changed_files {
                writeln!(self.writer, "  - {f}")?;
            }
            writeln!(self.writer)?;
        }

        if !report.changed_packages.is_empty() {
            writeln!(self.writer, "Changed Packages:")?;
            for p in &report.changed_packages {
                writeln!(self.writer, "  - {p}")?;
            }
            writeln!(self.writer)?;
        }

        writeln!(
            self.writer,
            "Affected Resources ({}):",
            report.affected_resources.len()
        )?;
        if report.affected_resources.is_empty() {
            writeln!(self.writer, "  (none)")?;
        } else {
            for r in &report.affected_resources {
                writeln!(self.writer, "  [{}] {}", r.resource.kind, r.resource.name)?;
                writeln!(self.writer, "    Reason: {}", r.reason)?;
                if !r.dependency_chain.is_empty() {
                    writeln!(
                        self.writer,
                        "    Chain: {}",
                        r.dependency_chain.join(" -> ")
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Render the resource listing, grouped by kind.
    pub fn write_resource_list(&mut self, resources: &[Resource]) -> io::Result<()> {
        writeln!(self.writer, "=== Resources ===")?;
        writeln!(self.writer)?;

        for kind in [ResourceKind::Api, ResourceKind::Job, ResourceKind::Worker] {
            let of_kind: Vec<&Resource> = resources.iter().filter(|r| r.kind == kind).collect();
            if of_kind.is_empty() {
                continue;
            }
            writeln!(self.writer, "{} ({}):", kind.heading(), of_kind.len())?;
            for r in of_kind {
                writeln!(self.writer, "  - {}: {}", r.name, r.description)?;
                if let Some(pkg) = &r.package {
                    writeln!(self.writer, "    Package: {pkg}")?;
                }
            }
            writeln!(self.writer)?;
        }

        writeln!(self.writer, "Total: {} resources", resources.len())
    }
}

// ============================================================================
// JSON Output
// ============================================================================

/// Renders analysis results as pretty-printed JSON.
pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        JsonWriter { writer }
    }

    pub fn write_report(&mut self, report: &AnalysisReport) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)
    }

    pub fn write_resource_list(&mut self, resources: &[Resource]) -> io::Result<()> {
        let listing = ResourceListing::new(resources.to_vec());
        serde_json::to_writer_pretty(&mut self.writer, &listing)?;
        writeln!(self.writer)
    }
}

// ============================================================================
// Tests
// ============================================================================
