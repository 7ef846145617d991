//! Unified diff parsing.
//!
//! Extracts the new-file line numbers of added and modified lines from
//! `git diff -U0` output. Shared by the git adapter and usable directly by
//! tests.

use std::sync::OnceLock;

use regex::Regex;

fn hunk_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").expect("hunk regex"))
}

/// Parse unified diff output into the 1-indexed line numbers that were added
/// or modified on the new side.
pub fn parse_unified_diff(diff_output: &str) -> Vec<u32> {
    let mut changed = Vec::new();
    let mut current_new_line: u32 = 0;
    let mut in_hunk = false;

    for line in diff_output.lines() {
        if let Some(caps) = hunk_header().captures(line) {
            current_new_line = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            in_hunk = true;
            continue;
        }
        if !in_hunk {
            continue;
        }
        if line.starts_with("diff ")
            || line.starts_with("index ")
            || line.starts_with("--- ")
            || line.starts_with("+++ ")
        {
            continue;
        }
        if line.starts_with('+') {
            changed.push(current_new_line);
            current_new_line += 1;
        } else if line.starts_with('-') {
            // Removed line: the new-side counter does not advance.
        } else if line.starts_with(' ') {
            current_new_line += 1;
        }
    }

    changed
}

// ============================================================================
// Tests
// ============================================================================
