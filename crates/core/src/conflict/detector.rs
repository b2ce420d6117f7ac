//! Conflict detection logic.
//!
//! Given every edit proposed for a set of artifacts, the detector identifies
//! incompatible pairs: positionally overlapping ranges, and declaration
//! collisions (imports, functions) that would duplicate or shadow a name
//! even when the ranges are disjoint.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::declaration;
use super::resolver::Resolution;
use crate::edit::Edit;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which kind of declaration two edits collide on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// Same module imported with differing statements.
    Import,
    /// Same function name declared with differing bodies.
    Function,
}

/// Categorisation of a conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Two edits target overlapping line ranges.
    OverlappingRanges,
    /// Two edits declare the same import or function differently.
    ConflictingDeclaration(DeclarationKind),
    /// A pairing flagged as structurally risky by an ingestion layer.
    /// No detector rule emits this kind.
    SyntaxRisk,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OverlappingRanges => write!(f, "overlapping_ranges"),
            Self::ConflictingDeclaration(DeclarationKind::Import) => {
                write!(f, "conflicting_import")
            }
            Self::ConflictingDeclaration(DeclarationKind::Function) => {
                write!(f, "conflicting_function")
            }
            Self::SyntaxRisk => write!(f, "syntax_risk"),
        }
    }
}

/// A detected incompatibility between two or more edits targeting the same
/// artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    /// Unique conflict ID, for display and cross-referencing.
    pub id: String,
    /// The kind of incompatibility.
    pub kind: ConflictKind,
    /// Participating edits, lower original input index first.
    pub edits: Vec<Edit>,
    /// The artifact all participants target.
    pub artifact_path: String,
    /// Human-readable description.
    pub description: String,
    /// Attached by the resolver; `None` until the resolve phase runs.
    pub resolution: Option<Resolution>,
}

impl Conflict {
    /// Create a new conflict with a fresh UUID and no resolution.
    pub fn new(
        artifact_path: impl Into<String>,
        kind: ConflictKind,
        edits: Vec<Edit>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            edits,
            artifact_path: artifact_path.into(),
            description: description.into(),
            resolution: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Stateless conflict detector over a set of proposed edits.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Detect every conflict among `edits`.
    ///
    /// Edits are partitioned by `artifact_path` first; detection never
    /// crosses artifacts. Overlap conflicts are reported pairwise, not
    /// merged transitively: three mutually overlapping edits yield three
    /// conflicts. The semantic checks ignore line ranges entirely.
    pub fn detect(edits: &[Edit]) -> Vec<Conflict> {
        info!(edit_count = edits.len(), "detecting conflicts");

        // Group by artifact, preserving first-seen order of both the
        // artifacts and the edits within each group.
        let mut groups: Vec<(&str, Vec<&Edit>)> = Vec::new();
        for edit in edits {
            match groups
                .iter_mut()
                .find(|(path, _)| *path == edit.artifact_path)
            {
                Some((_, group)) => group.push(edit),
                None => groups.push((edit.artifact_path.as_str(), vec![edit])),
            }
        }

        let mut conflicts = Vec::new();
        for (path, group) in &groups {
            conflicts.extend(detect_overlaps(path, group));
            conflicts.extend(detect_import_collisions(path, group));
            conflicts.extend(detect_function_collisions(path, group));
        }

        info!(count = conflicts.len(), "conflict detection complete");
        conflicts
    }
}

/// Pairwise positional overlap within one artifact group.
fn detect_overlaps(path: &str, group: &[&Edit]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, first) in group.iter().enumerate() {
        for second in &group[i + 1..] {
            if first.overlaps(second) {
                debug!(
                    path,
                    first = %first.contributor_id,
                    second = %second.contributor_id,
                    "overlapping ranges"
                );
                conflicts.push(Conflict::new(
                    path,
                    ConflictKind::OverlappingRanges,
                    vec![(*first).clone(), (*second).clone()],
                    format!(
                        "overlapping edits from '{}' (lines {}-{}) and '{}' (lines {}-{})",
                        first.contributor_id,
                        first.start_line,
                        first.end_line,
                        second.contributor_id,
                        second.start_line,
                        second.end_line
                    ),
                ));
            }
        }
    }
    conflicts
}

/// Import collisions: same module named by differing statements.
fn detect_import_collisions(path: &str, group: &[&Edit]) -> Vec<Conflict> {
    let candidates: Vec<(&Edit, Vec<declaration::ImportStatement>)> = group
        .iter()
        .map(|e| (*e, declaration::imports_in(&e.replacement_text)))
        .filter(|(_, imports)| !imports.is_empty())
        .collect();

    let mut conflicts = Vec::new();
    for (i, (first, first_imports)) in candidates.iter().enumerate() {
        for (second, second_imports) in &candidates[i + 1..] {
            let collision = first_imports.iter().any(|a| {
                second_imports
                    .iter()
                    .any(|b| a.module == b.module && a.raw != b.raw)
            });
            if collision {
                debug!(
                    path,
                    first = %first.contributor_id,
                    second = %second.contributor_id,
                    "conflicting imports"
                );
                conflicts.push(Conflict::new(
                    path,
                    ConflictKind::ConflictingDeclaration(DeclarationKind::Import),
                    vec![(*first).clone(), (*second).clone()],
                    format!(
                        "conflicting imports from '{}' and '{}'",
                        first.contributor_id, second.contributor_id
                    ),
                ));
            }
        }
    }
    conflicts
}

/// Function collisions: same declared name with differing bodies.
fn detect_function_collisions(path: &str, group: &[&Edit]) -> Vec<Conflict> {
    let candidates: Vec<(&Edit, Vec<String>)> = group
        .iter()
        .map(|e| (*e, declaration::function_names_in(&e.replacement_text)))
        .filter(|(_, names)| !names.is_empty())
        .collect();

    let mut conflicts = Vec::new();
    for (i, (first, first_names)) in candidates.iter().enumerate() {
        for (second, second_names) in &candidates[i + 1..] {
            let shared = first_names.iter().find(|n| second_names.contains(*n));
            if let Some(name) = shared {
                if first.replacement_text == second.replacement_text {
                    continue;
                }
                debug!(
                    path,
                    function = %name,
                    first = %first.contributor_id,
                    second = %second.contributor_id,
                    "conflicting function definitions"
                );
                conflicts.push(Conflict::new(
                    path,
                    ConflictKind::ConflictingDeclaration(DeclarationKind::Function),
                    vec![(*first).clone(), (*second).clone()],
                    format!(
                        "conflicting definitions of '{}' from '{}' and '{}'",
                        name, first.contributor_id, second.contributor_id
                    ),
                ));
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(contributor: &str, path: &str, start: usize, end: usize, text: &str) -> Edit {
        Edit::new(contributor, path, start, end, text)
    }

    #[test]
    fn test_disjoint_edits_no_conflict() {
        let edits = vec![
            edit("a", "f.py", 1, 2, "x = 1"),
            edit("b", "f.py", 5, 6, "y = 2"),
        ];
        assert!(ConflictDetector::detect(&edits).is_empty());
    }

    #[test]
    fn test_overlap_detected_pairwise() {
        let edits = vec![
            edit("a", "f.py", 1, 5, "x"),
            edit("b", "f.py", 4, 8, "y"),
        ];
        let conflicts = ConflictDetector::detect(&edits);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::OverlappingRanges);
        // Lower input index first.
        assert_eq!(conflicts[0].edits[0].contributor_id, "a");
        assert_eq!(conflicts[0].edits[1].contributor_id, "b");
    }

    #[test]
    fn test_three_way_overlap_yields_three_pairs() {
        let edits = vec![
            edit("a", "f.py", 1, 10, "x"),
            edit("b", "f.py", 2, 9, "y"),
            edit("c", "f.py", 3, 8, "z"),
        ];
        let conflicts = ConflictDetector::detect(&edits);
        assert_eq!(conflicts.len(), 3);
        assert!(conflicts
            .iter()
            .all(|c| c.kind == ConflictKind::OverlappingRanges && c.edits.len() == 2));
    }

    #[test]
    fn test_no_detection_across_artifacts() {
        let edits = vec![
            edit("a", "f.py", 1, 5, "x"),
            edit("b", "g.py", 1, 5, "y"),
        ];
        assert!(ConflictDetector::detect(&edits).is_empty());
    }

    #[test]
    fn test_import_collision_without_overlap() {
        let edits = vec![
            edit("a", "f.py", 1, 1, "from os import path"),
            edit("b", "f.py", 20, 20, "import os"),
        ];
        let conflicts = ConflictDetector::detect(&edits);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].kind,
            ConflictKind::ConflictingDeclaration(DeclarationKind::Import)
        );
    }

    #[test]
    fn test_identical_import_statements_do_not_conflict() {
        let edits = vec![
            edit("a", "f.py", 1, 1, "import os"),
            edit("b", "f.py", 20, 20, "import os"),
        ];
        assert!(ConflictDetector::detect(&edits).is_empty());
    }

    #[test]
    fn test_distinct_modules_do_not_conflict() {
        let edits = vec![
            edit("a", "f.py", 1, 1, "import os"),
            edit("b", "f.py", 20, 20, "import sys"),
        ];
        assert!(ConflictDetector::detect(&edits).is_empty());
    }

    #[test]
    fn test_function_collision() {
        let edits = vec![
            edit("a", "f.py", 1, 3, "def handler(x):\n    return x"),
            edit("b", "f.py", 10, 12, "def handler(x):\n    return x * 2"),
        ];
        let conflicts = ConflictDetector::detect(&edits);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].kind,
            ConflictKind::ConflictingDeclaration(DeclarationKind::Function)
        );
        assert!(conflicts[0].description.contains("handler"));
    }

    #[test]
    fn test_identical_function_bodies_do_not_conflict() {
        let body = "def handler(x):\n    return x";
        let edits = vec![
            edit("a", "f.py", 1, 2, body),
            edit("b", "f.py", 10, 11, body),
        ];
        assert!(ConflictDetector::detect(&edits).is_empty());
    }

    #[test]
    fn test_detection_order_independent_of_input_order() {
        let forward = vec![
            edit("a", "f.py", 1, 5, "x"),
            edit("b", "f.py", 4, 8, "y"),
        ];
        let reversed: Vec<Edit> = forward.iter().rev().cloned().collect();

        let from_forward = ConflictDetector::detect(&forward);
        let from_reversed = ConflictDetector::detect(&reversed);
        assert_eq!(from_forward.len(), from_reversed.len());

        let pair = |c: &Conflict| {
            let mut ids: Vec<String> =
                c.edits.iter().map(|e| e.contributor_id.clone()).collect();
            ids.sort();
            ids
        };
        assert_eq!(pair(&from_forward[0]), pair(&from_reversed[0]));
    }
}
