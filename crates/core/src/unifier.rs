//! The unification pipeline.
//!
//! The [`Unifier`] wires the stages together for one artifact: flatten the
//! edit sets, keep the target artifact's group, then run
//! Detector -> Resolver -> Applier. Each stage is a pure transformation over
//! immutable inputs; the engine holds no state between calls, so one
//! `Unifier` may serve unrelated artifacts from parallel workers.

use tracing::{debug, info};

use crate::applier::{EditApplier, UnificationResult};
use crate::conflict::{ConflictDetector, ConflictResolver, Strategy};
use crate::edit::Edit;
use crate::validate::{ArtifactValidator, NoValidation};

/// Orchestrator for the detect/resolve/apply pipeline.
pub struct Unifier {
    strategy: Strategy,
    validator: Box<dyn ArtifactValidator>,
}

impl std::fmt::Debug for Unifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unifier")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl Unifier {
    /// Create a unifier with the given strategy and no validation.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            validator: Box::new(NoValidation),
        }
    }

    /// Replace the validation hook.
    #[must_use]
    pub fn with_validator(mut self, validator: Box<dyn ArtifactValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// The configured strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Unify `edit_sets` against `original_text` for `artifact_path`.
    pub fn unify(
        &self,
        original_text: &str,
        artifact_path: &str,
        edit_sets: &[Vec<Edit>],
    ) -> UnificationResult {
        self.unify_with_warnings(original_text, artifact_path, edit_sets, Vec::new())
    }

    /// Like [`Unifier::unify`], with warnings carried in from upstream
    /// sources (e.g. proposal files that could not be read). Upstream
    /// warnings count against `success` like any other warning.
    pub fn unify_with_warnings(
        &self,
        original_text: &str,
        artifact_path: &str,
        edit_sets: &[Vec<Edit>],
        upstream_warnings: Vec<String>,
    ) -> UnificationResult {
        let all_edits: Vec<Edit> = edit_sets.iter().flatten().cloned().collect();
        info!(
            artifact = artifact_path,
            sources = edit_sets.len(),
            edits = all_edits.len(),
            strategy = %self.strategy,
            "unifying edit proposals"
        );

        if all_edits.is_empty() {
            return no_op_result(
                original_text,
                upstream_warnings,
                "no edits supplied; returning original text unchanged".to_string(),
            );
        }

        let target_edits: Vec<Edit> = all_edits
            .iter()
            .filter(|e| e.artifact_path == artifact_path)
            .cloned()
            .collect();

        let ignored = all_edits.len() - target_edits.len();
        if ignored > 0 {
            debug!(ignored, "edits for other artifacts ignored");
        }
        if target_edits.is_empty() {
            return no_op_result(
                original_text,
                upstream_warnings,
                format!(
                    "none of the {} edits target '{}'; returning original text unchanged",
                    all_edits.len(),
                    artifact_path
                ),
            );
        }

        let conflicts = ConflictDetector::detect(&target_edits);
        let resolved = ConflictResolver::resolve(conflicts, self.strategy);
        let mut result = EditApplier::apply(
            original_text,
            &target_edits,
            &resolved,
            self.validator.as_ref(),
        );

        if !upstream_warnings.is_empty() {
            result.warnings.splice(0..0, upstream_warnings);
            result.success = false;
        }

        info!(
            applied = result.applied_edits.len(),
            conflicts = result.conflicts.len(),
            warnings = result.warnings.len(),
            success = result.success,
            "unification complete"
        );
        result
    }
}

/// Early return for runs with nothing to apply: the informational message
/// does not count against `success`, upstream warnings do.
fn no_op_result(
    original_text: &str,
    upstream_warnings: Vec<String>,
    message: String,
) -> UnificationResult {
    let success = upstream_warnings.is_empty();
    let mut warnings = upstream_warnings;
    warnings.push(message);
    UnificationResult {
        unified_text: original_text.to_string(),
        applied_edits: Vec::new(),
        conflicts: Vec::new(),
        warnings,
        success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_two_contributor_scenario() {
        let original = "def f():\n    pass\n\ndef g():\n    pass";
        let mut a = Edit::new("X", "f.py", 2, 2, "    return 1");
        a.confidence = 0.9;
        let mut b = Edit::new("Y", "f.py", 2, 2, "    return 2");
        b.confidence = 0.5;

        for strategy in [Strategy::Conservative, Strategy::Smart] {
            let unifier = Unifier::new(strategy);
            let result =
                unifier.unify(original, "f.py", &[vec![a.clone()], vec![b.clone()]]);

            assert_eq!(result.conflicts.len(), 1);
            assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
            assert!(result.success);
            let lines: Vec<&str> = result.unified_text.split('\n').collect();
            assert_eq!(lines[1], "    return 1");
            assert_eq!(result.applied_edits.len(), 1);
            assert_eq!(result.applied_edits[0].contributor_id, "X");
        }
    }

    #[test]
    fn test_empty_edit_sets_return_original_successfully() {
        let unifier = Unifier::new(Strategy::Smart);
        let result = unifier.unify("line1\nline2", "f.py", &[]);

        assert_eq!(result.unified_text, "line1\nline2");
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_upstream_warnings_flow_into_result() {
        let unifier = Unifier::new(Strategy::Smart);
        let result = unifier.unify_with_warnings(
            "line1",
            "f.py",
            &[vec![Edit::new("a", "f.py", 1, 1, "changed")]],
            vec!["failed to read proposal source 'bad.json'".to_string()],
        );

        assert_eq!(result.unified_text, "changed");
        assert!(!result.success);
        assert!(result.warnings[0].contains("bad.json"));
    }

    #[test]
    fn test_edits_for_other_artifacts_are_ignored() {
        let unifier = Unifier::new(Strategy::Smart);
        let result = unifier.unify(
            "line1\nline2",
            "f.py",
            &[vec![
                Edit::new("a", "f.py", 1, 1, "changed"),
                Edit::new("b", "g.py", 2, 2, "other file"),
            ]],
        );

        assert!(result.success);
        assert_eq!(result.unified_text, "changed\nline2");
        assert_eq!(result.applied_edits.len(), 1);
    }

    #[test]
    fn test_no_conflict_unification_is_idempotent() {
        let original = "a\nb\nc\nd\ne";
        let sets = vec![
            vec![Edit::new("a", "f.py", 1, 1, "A")],
            vec![Edit::new("b", "f.py", 4, 4, "D")],
        ];
        let unifier = Unifier::new(Strategy::Smart);

        let first = unifier.unify(original, "f.py", &sets);
        let second = unifier.unify(original, "f.py", &sets);

        assert!(first.success && second.success);
        assert_eq!(first.unified_text, second.unified_text);
        assert_eq!(first.unified_text, "A\nb\nc\nD\ne");
    }

    #[test]
    fn test_validator_is_exercised() {
        let unifier =
            Unifier::new(Strategy::Smart).with_validator(Box::new(|_: &str| false));
        let result = unifier.unify(
            "line1",
            "f.py",
            &[vec![Edit::new("a", "f.py", 1, 1, "changed")]],
        );

        assert!(!result.success);
        assert!(result
            .warnings
            .iter()
            .any(|w| w == "unified text failed validation"));
    }
}
