// src/targets/mod.rs
// =============================================================================
// This module turns the operator's input file into a list of targets.
//
// Submodules:
// - normalize: Cleans up a raw URL fragment into a scheme-qualified URL
// - loader: Reads the line-oriented input file and tracks group labels
//
// A TargetEntry is the only thing the checker needs to know about the input.
// Everything after loading treats entries as read-only.
// =============================================================================

mod loader;
mod normalize;

pub use loader::load_targets;
pub use normalize::default_port;

/// One URL to check, plus where it came from in the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    /// Group label that was active when this entry was read
    pub group: String,
    /// The full input line, kept for reports
    pub original_text: String,
    /// The URL text exactly as it appeared after "Full URL:"
    pub raw_text: String,
    /// Normalized, scheme-qualified URL
    pub url: String,
}

#[cfg(test)]
impl TargetEntry {
    // Entry for an already-normalized URL, without an input line behind it
    pub fn new(group: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            group: group.into(),
            original_text: url.clone(),
            raw_text: url.clone(),
            url,
        }
    }
}
