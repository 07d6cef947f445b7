/// Configuration for the Scribe content pipeline.
///
/// Every knob has a sensible default and can be overridden through
/// `SCRIBE_*` environment variables without code changes.
use serde::{Deserialize, Serialize};

use crate::content::Capability;
use crate::errors::GenerationError;

/// Default model used when no per-capability override is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
/// Default sampling temperature for generation calls.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Default token budget for generation calls.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model used for any capability without a specific override.
    pub default_model: String,
    /// Model override for subject generation.
    pub subject_model: Option<String>,
    /// Model override for body generation.
    pub body_model: Option<String>,
    /// Model override for template optimization.
    pub template_model: Option<String>,
    /// Model override for personalization.
    pub personalize_model: Option<String>,
    /// Maximum characters allowed in a generated subject line.
    pub max_subject_length: usize,
    /// Maximum characters allowed in a generated email body.
    pub max_body_length: usize,
    /// Default retry budget (retries after the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries, in milliseconds.
    pub base_delay_ms: u64,
    /// Safety score at or above which content is considered safe.
    pub safety_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            subject_model: None,
            body_model: None,
            template_model: None,
            personalize_model: None,
            max_subject_length: 100,
            max_body_length: 5000,
            max_retries: 2,
            base_delay_ms: 1000,
            safety_threshold: 0.8,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the process environment, starting from
    /// defaults and applying any `SCRIBE_*` overrides.
    pub fn from_env() -> Result<Self, GenerationError> {
        let mut config = Self::default();
        config.apply_overrides(&|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the model identifier for a capability.
    pub fn model_for(&self, capability: Capability) -> &str {
        let override_for = match capability {
            Capability::Subject => &self.subject_model,
            Capability::Body => &self.body_model,
            Capability::Template => &self.template_model,
            Capability::Personalize => &self.personalize_model,
        };
        override_for.as_deref().unwrap_or(&self.default_model)
    }

    /// Apply overrides from a key/value lookup (the environment in
    /// production; a map in tests).
    pub fn apply_overrides(
        &mut self,
        get: &dyn Fn(&str) -> Option<String>,
    ) -> Result<(), GenerationError> {
        if let Some(v) = get("SCRIBE_DEFAULT_MODEL") {
            self.default_model = v;
        }
        if let Some(v) = get("SCRIBE_SUBJECT_MODEL") {
            self.subject_model = Some(v);
        }
        if let Some(v) = get("SCRIBE_BODY_MODEL") {
            self.body_model = Some(v);
        }
        if let Some(v) = get("SCRIBE_TEMPLATE_MODEL") {
            self.template_model = Some(v);
        }
        if let Some(v) = get("SCRIBE_PERSONALIZE_MODEL") {
            self.personalize_model = Some(v);
        }
        if let Some(v) = get("SCRIBE_MAX_SUBJECT_LENGTH") {
            self.max_subject_length = parse(&v, "SCRIBE_MAX_SUBJECT_LENGTH")?;
        }
        if let Some(v) = get("SCRIBE_MAX_BODY_LENGTH") {
            self.max_body_length = parse(&v, "SCRIBE_MAX_BODY_LENGTH")?;
        }
        if let Some(v) = get("SCRIBE_MAX_RETRIES") {
            self.max_retries = parse(&v, "SCRIBE_MAX_RETRIES")?;
        }
        if let Some(v) = get("SCRIBE_BASE_DELAY_MS") {
            self.base_delay_ms = parse(&v, "SCRIBE_BASE_DELAY_MS")?;
        }
        if let Some(v) = get("SCRIBE_SAFETY_THRESHOLD") {
            self.safety_threshold = parse(&v, "SCRIBE_SAFETY_THRESHOLD")?;
        }
        Ok(())
    }

    /// Validate the aggregate config for internal consistency.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.default_model.is_empty() {
            return Err(GenerationError::Config(
                "default model must not be empty".to_string(),
            ));
        }
        if self.max_subject_length == 0 {
            return Err(GenerationError::Config(
                "max subject length must be positive".to_string(),
            ));
        }
        if self.max_body_length == 0 {
            return Err(GenerationError::Config(
                "max body length must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.safety_threshold) {
            return Err(GenerationError::Config(format!(
                "safety threshold must be within [0, 1], got {}",
                self.safety_threshold
            )));
        }
        Ok(())
    }
}

/// Settings for the audit logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Whether audit logging is enabled at all.
    pub enabled: bool,
    /// Mirror records to stdout in addition to the durable sink.
    pub stdout: bool,
    /// Directory the audit log file lives in.
    pub directory: String,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            stdout: false,
            directory: "logs".to_string(),
        }
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, GenerationError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| GenerationError::Config(format!("invalid value for {key}: {e}")))
}
