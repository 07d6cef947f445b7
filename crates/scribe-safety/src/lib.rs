/// Content analysis for the Scribe pipeline.
///
/// This crate implements the pure, deterministic leaves of the pipeline:
/// - **Safety classifier**: heuristic spam/shouting/punctuation scoring
/// - **Constraint validator**: required/forbidden substring enforcement
/// - **Personalization scorer**: weighted recipient-attribute presence
pub mod classifier;
pub mod constraints;
pub mod personalization;

pub use classifier::{HeuristicClassifier, SAFETY_THRESHOLD};
pub use constraints::validate_constraints;
pub use personalization::personalization_score;
