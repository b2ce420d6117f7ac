//! CodeUnify core library.
//!
//! This crate unifies competing edit proposals for a single text artifact --
//! submitted independently by multiple contributors such as AI models,
//! linters, or human reviewers -- into one coherent result. The pipeline is
//! Detector -> Resolver -> Applier: detect positional and semantic
//! conflicts, decide survivors under a strategy, then splice the survivors
//! bottom-up and validate the outcome. A [`UnificationResult`] is always
//! produced; failures along the way surface as warnings inside it.

pub mod applier;
pub mod config;
pub mod conflict;
pub mod edit;
pub mod errors;
pub mod ingest;
pub mod unifier;
pub mod validate;

// Re-exports for convenience.
pub use applier::{EditApplier, UnificationResult};
pub use config::AppConfig;
pub use conflict::{
    Conflict, ConflictDetector, ConflictKind, ConflictResolver, DeclarationKind, Resolution,
    ResolutionAction, Strategy,
};
pub use edit::Edit;
pub use errors::CoreError;
pub use unifier::Unifier;
pub use validate::{ArtifactValidator, BalancedDelimiters, NoValidation};
