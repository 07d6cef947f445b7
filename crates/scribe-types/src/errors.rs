/// Unified error type for the Scribe content pipeline.
///
/// All crates use this error type for propagation across crate boundaries.
/// Every variant is terminal to the generation call that raised it: nothing
/// is auto-recovered beyond the retry executor's transient-fault retries,
/// and every error propagates to the caller unchanged after being audited.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The operator kill switch is active; all generation traffic is halted.
    #[error("{0}")]
    KillSwitch(String),

    /// The capability family is not enabled for this actor.
    #[error("{0}")]
    FamilyDisabled(String),

    /// The specific capability gate is not enabled for this actor.
    #[error("{0}")]
    CapabilityDisabled(String),

    /// The model provider failed after the retry budget was exhausted
    /// (transport faults, API errors, malformed transport payloads).
    #[error("provider error: {0}")]
    Provider(String),

    /// Structured output did not match the expected schema or bounds.
    #[error("validation error: {0}")]
    Validation(String),

    /// Primary generated content failed the heuristic safety classifier.
    #[error("safety violation: {0}")]
    SafetyViolation(String),

    /// Generated content is missing required content or contains
    /// prohibited content. The message names the offending term.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Error from the audit sink (storage or serialization failures).
    #[error("audit error: {0}")]
    Audit(String),

    /// Error from configuration loading or validation.
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_errors_display_their_message_verbatim() {
        let err = GenerationError::KillSwitch("AI content generation is temporarily disabled".into());
        assert_eq!(err.to_string(), "AI content generation is temporarily disabled");

        let err = GenerationError::CapabilityDisabled(
            "Specific feature 'email_body_generation' is not enabled".into(),
        );
        assert!(err.to_string().contains("email_body_generation"));
    }

    #[test]
    fn constraint_errors_name_the_offending_term() {
        let err = GenerationError::ConstraintViolation(
            "missing required content: \"spring sale\"".into(),
        );
        assert!(err.to_string().contains("missing required content"));
        assert!(err.to_string().contains("spring sale"));
    }

    #[test]
    fn serde_errors_convert_to_validation() {
        let bad = serde_json::from_str::<u32>("\"not a number\"").unwrap_err();
        let err: GenerationError = bad.into();
        assert!(matches!(err, GenerationError::Validation(_)));
    }
}
