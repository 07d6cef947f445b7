/// Trait contracts for the Scribe content pipeline.
///
/// Every external collaborator is consumed through a trait defined here, so
/// the orchestrator can be unit tested with fakes instead of live services.
/// All traits live in `scribe-types` so every crate can depend on them
/// without circular dependencies.
use async_trait::async_trait;

use crate::content::{
    ActorContext, GenerationAuditRecord, SafetyAssessment, StructuredRequest, TextRequest,
};
use crate::errors::GenerationError;

/// Boolean feature-gate oracle (kill switches, family gates, capability gates).
///
/// The gate service is potentially networked and cached by the collaborator;
/// the pipeline treats it as a black box. Implementations should resolve
/// lookup failures to `false` so enablement gates fail closed.
#[async_trait]
pub trait FeatureGateClient: Send + Sync {
    /// Check whether a named gate is enabled for the given actor.
    async fn check_gate(&self, actor: &ActorContext, gate_key: &str) -> bool;

    /// Initialize/warm the client before first use (cache priming,
    /// connection setup). Default is a no-op for clients that need none.
    async fn warm(&self) -> Result<(), GenerationError> {
        Ok(())
    }
}

/// Provider-agnostic language model interface.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate a response matching the request's JSON schema.
    ///
    /// The returned value is the provider's structured payload; schema
    /// conformance is checked by the caller when decoding into its typed
    /// result.
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<serde_json::Value, GenerationError>;

    /// Generate free text. Used by capabilities that post-process prose
    /// rather than a schema.
    async fn generate_text(&self, request: TextRequest) -> Result<String, GenerationError>;
}

/// Append-only sink for generation audit records.
///
/// The orchestrator writes exactly one record per call; a failed insert is
/// logged by the orchestrator and never propagated in place of the call's
/// own result or error.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Durably append an audit record.
    async fn insert(&self, record: GenerationAuditRecord) -> Result<(), GenerationError>;
}

/// Content safety strategy.
///
/// Kept behind a trait so stricter or ML-based classifiers can be substituted
/// without touching orchestration code. Implementations must be deterministic,
/// perform no I/O, and tolerate any input. This runs on every generated field,
/// so it must be fast — no async.
pub trait ContentClassifier: Send + Sync {
    /// Score a piece of text for safety.
    fn assess(&self, text: &str) -> SafetyAssessment;
}
