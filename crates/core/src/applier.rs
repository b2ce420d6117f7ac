//! Order-correct application of surviving edits to the base text.
//!
//! The applier owns the only mutable line buffer in the pipeline. Edits are
//! spliced from the bottom of the document upward so that a splice never
//! invalidates the coordinates of an edit still pending application. Every
//! failure mode here is a warning inside the returned [`UnificationResult`],
//! never an error that aborts the unification.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conflict::declaration::{imports_in, is_import_line};
use crate::conflict::resolver::ResolutionAction;
use crate::conflict::{Conflict, ConflictKind, DeclarationKind};
use crate::edit::Edit;
use crate::validate::ArtifactValidator;

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// The terminal value of a unification run. Owned solely by the caller;
/// the engine retains no reference to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnificationResult {
    /// The unified text, always populated even when validation fails.
    pub unified_text: String,
    /// Edits that were actually spliced in, in application order.
    pub applied_edits: Vec<Edit>,
    /// Every detected conflict, with attached resolutions.
    pub conflicts: Vec<Conflict>,
    /// Warnings accumulated during application and validation.
    pub warnings: Vec<String>,
    /// True iff no warnings were raised.
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Applier
// ---------------------------------------------------------------------------

/// Stateless applier that splices surviving edits into the original text.
pub struct EditApplier;

impl EditApplier {
    /// Apply `edits` to `original_text`, honouring the resolutions attached
    /// to `conflicts`, and validate the result with `validator`.
    pub fn apply(
        original_text: &str,
        edits: &[Edit],
        conflicts: &[Conflict],
        validator: &dyn ArtifactValidator,
    ) -> UnificationResult {
        info!(
            edit_count = edits.len(),
            conflict_count = conflicts.len(),
            "applying edits"
        );

        let mut lines: Vec<String> =
            original_text.split('\n').map(str::to_string).collect();
        let mut warnings = Vec::new();
        let mut applied: Vec<Edit> = Vec::new();

        // Unresolved conflicts withhold every participant.
        for conflict in conflicts {
            if let Some(resolution) = &conflict.resolution {
                if resolution.is_unresolved() {
                    let message = format!(
                        "conflict ({}) on '{}' left unresolved; {} edits withheld",
                        conflict.kind,
                        conflict.artifact_path,
                        conflict.edits.len()
                    );
                    warn!(conflict_id = %conflict.id, "{message}");
                    warnings.push(message);
                }
            }
        }

        // An edit that loses any resolved conflict is suppressed. Aggressive
        // resolutions name every participant as winning, so they never
        // suppress anything here.
        let mut survivors: Vec<&Edit> = edits
            .iter()
            .filter(|edit| !is_suppressed(edit, conflicts))
            .collect();

        // Bottom-up: numerically higher start lines first, so a splice never
        // shifts the coordinates of an edit still pending application.
        survivors.sort_by(|a, b| b.start_line.cmp(&a.start_line));

        // Ranges (original coordinates) of edits already spliced, for the
        // aggressive still-overlapping case.
        let mut applied_ranges: Vec<&Edit> = Vec::new();

        for edit in survivors {
            if edit.start_line < 1 || edit.end_line > lines.len() {
                let message = format!(
                    "edit from '{}' targets lines {}-{} but the document has {} lines; skipped",
                    edit.contributor_id,
                    edit.start_line,
                    edit.end_line,
                    lines.len()
                );
                warn!("{message}");
                warnings.push(message);
                continue;
            }

            if let Some(prior) = applied_ranges.iter().find(|p| p.overlaps(edit)) {
                let message = format!(
                    "overlapping edits from '{}' and '{}' both applied; the effect of the edit \
                     at lines {}-{} may be partially overwritten",
                    prior.contributor_id,
                    edit.contributor_id,
                    edit.start_line,
                    edit.end_line
                );
                warn!("{message}");
                warnings.push(message);
            }

            debug!(
                contributor = %edit.contributor_id,
                start = edit.start_line,
                end = edit.end_line,
                "splicing edit"
            );
            lines.splice(edit.start_line - 1..edit.end_line, edit.replacement_lines());
            applied_ranges.push(edit);
            applied.push(edit.clone());
        }

        merge_imports(&mut lines, conflicts, &applied);

        let unified_text = lines.join("\n");

        if !validator.is_well_formed(&unified_text) {
            let message = "unified text failed validation".to_string();
            warn!("{message}");
            warnings.push(message);
        }

        let success = warnings.is_empty();
        info!(
            applied = applied.len(),
            warnings = warnings.len(),
            success,
            "application complete"
        );

        UnificationResult {
            unified_text,
            applied_edits: applied,
            conflicts: conflicts.to_vec(),
            warnings,
            success,
        }
    }
}

/// Whether `edit` loses any resolved conflict it participates in.
fn is_suppressed(edit: &Edit, conflicts: &[Conflict]) -> bool {
    conflicts.iter().any(|conflict| {
        conflict.resolution.as_ref().is_some_and(|resolution| {
            conflict.edits.contains(edit) && !resolution.winning_edits.contains(edit)
        })
    })
}

/// Merge import statements into one block.
///
/// Runs when an import collision was resolved as "combine", or when at
/// least two applied edits carry import statements. The distinct import
/// lines of the participating edits replace the first contiguous block of
/// import lines in the current sequence (or are inserted at line 1 when no
/// block exists).
fn merge_imports(lines: &mut Vec<String>, conflicts: &[Conflict], applied: &[Edit]) {
    let mut participants: Vec<&Edit> = conflicts
        .iter()
        .filter(|c| {
            c.kind == ConflictKind::ConflictingDeclaration(DeclarationKind::Import)
                && c.resolution
                    .as_ref()
                    .is_some_and(|r| r.action == ResolutionAction::CombineImports)
        })
        .flat_map(|c| c.edits.iter())
        .collect();

    let importers: Vec<&Edit> = applied
        .iter()
        .filter(|e| !imports_in(&e.replacement_text).is_empty())
        .collect();

    if participants.is_empty() && importers.len() < 2 {
        return;
    }
    participants.extend(importers);

    // BTreeSet: distinct and sorted, deterministically.
    let union: std::collections::BTreeSet<String> = participants
        .iter()
        .flat_map(|e| imports_in(&e.replacement_text))
        .map(|stmt| stmt.raw)
        .collect();

    debug!(count = union.len(), "merging import statements");

    match lines.iter().position(|l| is_import_line(l)) {
        Some(start) => {
            let mut end = start;
            while end < lines.len() && is_import_line(&lines[end]) {
                end += 1;
            }
            lines.splice(start..end, union);
        }
        None => {
            for (offset, statement) in union.into_iter().enumerate() {
                lines.insert(offset, statement);
            }
        }
    }
}
