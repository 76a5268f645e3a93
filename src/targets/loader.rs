// src/targets/loader.rs
// =============================================================================
// Reads the input file format:
//
//   AK (Alaska): www.commerce.alaska.gov
//     Full URL: https://www.commerce.alaska.gov/cbp/main/Search/Professional
//   AL (Alabama): www.albme.org
//     Full URL: https://www.albme.org/Licensing/Verification.aspx
//
// Rules (applied to each trimmed line):
// - A line with ':' that does NOT start with "full url" sets the group label
// - A line starting with "full url:" (any case) is a target
// - Everything else is ignored
// =============================================================================

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

use super::normalize::normalize_url;
use super::TargetEntry;

/// Group label used for targets that appear before any group line.
pub const DEFAULT_GROUP: &str = "Ungrouped";

// Reads and parses a target file from disk
pub fn load_targets(path: &Path) -> Result<Vec<TargetEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    Ok(parse_targets(&text))
}

// Parses target entries out of the input text
//
// Lines without a hostname are skipped with a warning, they never abort the
// load. Anything that names a host is kept, even if it won't parse.
pub fn parse_targets(text: &str) -> Vec<TargetEntry> {
    let mut entries = Vec::new();
    let mut current_group = DEFAULT_GROUP.to_string();

    for line in text.lines() {
        let stripped = line.trim();
        let lower = stripped.to_lowercase();

        if stripped.contains(':') && !lower.starts_with("full url") {
            current_group = stripped.to_string();
            continue;
        }

        if !lower.starts_with("full url:") {
            continue;
        }

        // "full url:" is pure ASCII, so the first ':' is the one we matched on
        let raw = stripped
            .split_once(':')
            .map(|(_, rest)| rest.trim())
            .unwrap_or_default();

        match normalize_url(raw) {
            Some(url) => entries.push(TargetEntry {
                group: current_group.clone(),
                original_text: stripped.to_string(),
                raw_text: raw.to_string(),
                url,
            }),
            None => warn!(line = stripped, "skipping line without a hostname"),
        }
    }

    entries
}
