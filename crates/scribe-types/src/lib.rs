/// Shared types, traits, and errors for the Scribe content pipeline.
///
/// This crate is the foundation that all other Scribe crates depend on.
/// It contains:
/// - **Trait contracts** (`traits`) for the external collaborators: feature
///   gates, model provider, audit sink, safety classifier
/// - **Shared data types** (`content`) — request contexts, results, audit
///   records — the stable contract callers depend on
/// - **Error types** (`errors`) for unified error handling
/// - **Config types** (`config`) with env-style overrides
pub mod config;
pub mod content;
pub mod errors;
pub mod traits;

// Re-export commonly used types at the crate root for convenience.
pub use config::{AuditSettings, PipelineConfig};
pub use content::*;
pub use errors::GenerationError;
pub use traits::*;
