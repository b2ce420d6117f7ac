//! Strategy-driven conflict resolution.
//!
//! The [`ConflictResolver`] attaches a [`Resolution`] to every detected
//! conflict. The strategy set is closed and matched exhaustively; given the
//! same conflict and strategy, resolution is identical on every run (no map
//! iteration, hashing, or clock involved).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::detector::{Conflict, ConflictKind, DeclarationKind};
use crate::edit::Edit;
use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// The policy governing how conflicts are resolved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Keep the highest-confidence edit; ties go to the first seen.
    Conservative,
    /// Attempt to keep everything: overlaps all win, imports combine.
    Aggressive,
    /// Confidence, then replacement length, then the conservative rule.
    #[default]
    Smart,
    /// No automatic winner; conflicts are surfaced unresolved.
    Manual,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conservative => write!(f, "conservative"),
            Self::Aggressive => write!(f, "aggressive"),
            Self::Smart => write!(f, "smart"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" => Ok(Self::Conservative),
            "aggressive" => Ok(Self::Aggressive),
            "smart" => Ok(Self::Smart),
            "manual" => Ok(Self::Manual),
            other => Err(ConfigError::InvalidValue {
                field: "strategy".to_string(),
                detail: format!(
                    "unknown strategy '{other}' (expected conservative, aggressive, smart, or manual)"
                ),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// What the applier should do with the winning edits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    /// Apply the winning edits; suppress the rest.
    PickWinners,
    /// Merge the union of the participants' import statements.
    CombineImports,
}

/// The outcome of applying a strategy to one conflict.
///
/// Created by the resolver, consumed by the applier, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// Surviving edits, ordered by the strategy's preference. Empty means
    /// the conflict is left unresolved for external handling.
    pub winning_edits: Vec<Edit>,
    /// How the applier should act on the winners.
    pub action: ResolutionAction,
    /// Human-readable explanation of the decision.
    pub rationale: String,
}

impl Resolution {
    /// Whether no winner was selected (manual / unresolved).
    pub fn is_unresolved(&self) -> bool {
        self.winning_edits.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Stateless resolver that attaches a [`Resolution`] to each conflict.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Resolve every conflict under `strategy`.
    pub fn resolve(conflicts: Vec<Conflict>, strategy: Strategy) -> Vec<Conflict> {
        info!(count = conflicts.len(), %strategy, "resolving conflicts");

        conflicts
            .into_iter()
            .map(|mut conflict| {
                let resolution = resolve_one(&conflict, strategy);
                debug!(
                    conflict_id = %conflict.id,
                    kind = %conflict.kind,
                    rationale = %resolution.rationale,
                    "conflict resolved"
                );
                conflict.resolution = Some(resolution);
                conflict
            })
            .collect()
    }
}

fn resolve_one(conflict: &Conflict, strategy: Strategy) -> Resolution {
    match strategy {
        Strategy::Conservative => resolve_conservative(conflict),
        Strategy::Aggressive => resolve_aggressive(conflict),
        Strategy::Smart => resolve_smart(conflict),
        Strategy::Manual => Resolution {
            winning_edits: Vec::new(),
            action: ResolutionAction::PickWinners,
            rationale: "left unresolved for manual review".to_string(),
        },
    }
}

/// Highest confidence wins; ties are broken by first-seen order.
fn resolve_conservative(conflict: &Conflict) -> Resolution {
    let mut best = &conflict.edits[0];
    for edit in &conflict.edits[1..] {
        if edit.confidence > best.confidence {
            best = edit;
        }
    }
    Resolution {
        winning_edits: vec![best.clone()],
        action: ResolutionAction::PickWinners,
        rationale: format!(
            "using edit from '{}' (confidence {:.2})",
            best.contributor_id, best.confidence
        ),
    }
}

/// Keep everything: every participant wins. Import collisions are marked
/// for the applier's combine step.
fn resolve_aggressive(conflict: &Conflict) -> Resolution {
    let winning_edits = conflict.edits.clone();
    match conflict.kind {
        ConflictKind::OverlappingRanges => Resolution {
            winning_edits,
            action: ResolutionAction::PickWinners,
            rationale: "keeping all overlapping edits".to_string(),
        },
        ConflictKind::ConflictingDeclaration(DeclarationKind::Import) => Resolution {
            winning_edits,
            action: ResolutionAction::CombineImports,
            rationale: "combining all imports".to_string(),
        },
        ConflictKind::ConflictingDeclaration(DeclarationKind::Function)
        | ConflictKind::SyntaxRisk => Resolution {
            winning_edits,
            action: ResolutionAction::PickWinners,
            rationale: "applying all changes".to_string(),
        },
    }
}

/// For overlaps: confidence, then replacement length as a proxy for the
/// more complete change, then the conservative rule. Everything else
/// defers to conservative.
fn resolve_smart(conflict: &Conflict) -> Resolution {
    if conflict.kind != ConflictKind::OverlappingRanges {
        return resolve_conservative(conflict);
    }

    let mut best = &conflict.edits[0];
    for edit in &conflict.edits[1..] {
        if edit.confidence > best.confidence {
            best = edit;
        } else if edit.confidence == best.confidence
            && edit.replacement_text.len() > best.replacement_text.len()
        {
            best = edit;
        }
    }

    let strictly_more_confident = conflict
        .edits
        .iter()
        .all(|e| std::ptr::eq(e, best) || e.confidence < best.confidence);
    let rationale = if strictly_more_confident {
        format!(
            "using edit from '{}' (higher confidence {:.2})",
            best.contributor_id, best.confidence
        )
    } else if conflict.edits.iter().any(|e| {
        !std::ptr::eq(e, best) && e.replacement_text.len() < best.replacement_text.len()
    }) {
        format!(
            "using edit from '{}' (more comprehensive replacement)",
            best.contributor_id
        )
    } else {
        format!(
            "using edit from '{}' (first seen among equals)",
            best.contributor_id
        )
    };

    Resolution {
        winning_edits: vec![best.clone()],
        action: ResolutionAction::PickWinners,
        rationale,
    }
}
