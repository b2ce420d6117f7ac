//! The [`Edit`] value type: one contributor's proposed line-range
//! replacement for a text artifact.
//!
//! Edits are immutable once constructed. Line numbers are 1-indexed,
//! inclusive, and always refer to the *original* artifact; the applier is
//! responsible for keeping coordinates valid while splicing.

use serde::{Deserialize, Serialize};

/// A single proposed change from one contributor (an AI model, a linter, or
/// a human reviewer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    /// Who proposed this change.
    pub contributor_id: String,
    /// The artifact (file) this edit targets.
    pub artifact_path: String,
    /// First line of the replaced range (1-indexed, inclusive).
    pub start_line: usize,
    /// Last line of the replaced range (1-indexed, inclusive).
    pub end_line: usize,
    /// Expected original content of the range, for sanity-checking.
    pub original_text: String,
    /// Text to substitute. Empty means the range is deleted.
    pub replacement_text: String,
    /// Contributor confidence in [0, 1].
    pub confidence: f64,
    /// Free-form tag such as "fix" or "refactor".
    pub kind: String,
    /// Human-readable description of the change.
    pub note: String,
}

impl Edit {
    /// Create an edit with default confidence (1.0) and kind ("unknown").
    pub fn new(
        contributor_id: impl Into<String>,
        artifact_path: impl Into<String>,
        start_line: usize,
        end_line: usize,
        replacement_text: impl Into<String>,
    ) -> Self {
        Self {
            contributor_id: contributor_id.into(),
            artifact_path: artifact_path.into(),
            start_line,
            end_line,
            original_text: String::new(),
            replacement_text: replacement_text.into(),
            confidence: 1.0,
            kind: "unknown".to_string(),
            note: String::new(),
        }
    }

    /// Whether the line range satisfies the model invariant
    /// (`1 <= start_line <= end_line`).
    pub fn has_valid_range(&self) -> bool {
        self.start_line >= 1 && self.start_line <= self.end_line
    }

    /// Whether two edits target overlapping line ranges of the same artifact.
    pub fn overlaps(&self, other: &Edit) -> bool {
        self.artifact_path == other.artifact_path
            && self.start_line <= other.end_line
            && other.start_line <= self.end_line
    }

    /// The replacement as a line sequence.
    ///
    /// An empty replacement yields no lines at all (a deletion), not a
    /// single blank line.
    pub fn replacement_lines(&self) -> Vec<String> {
        if self.replacement_text.is_empty() {
            return Vec::new();
        }
        self.replacement_text.split('\n').map(str::to_string).collect()
    }
}
