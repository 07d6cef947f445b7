/// Shared data types for the Scribe content pipeline.
///
/// These types are the lingua franca of the system — every crate imports from
/// here. Request contexts and results are the stable contract callers (e.g. a
/// CRM campaign feature) depend on.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum characters of prompt text stored on an audit record.
pub const MAX_AUDIT_PROMPT_CHARS: usize = 1000;
/// Maximum characters of response text stored on an audit record.
pub const MAX_AUDIT_RESPONSE_CHARS: usize = 2000;
/// Maximum characters of error text stored on an audit record.
pub const MAX_AUDIT_ERROR_CHARS: usize = 500;

/// Maximum number of alternative subject lines returned per call.
pub const MAX_SUBJECT_ALTERNATIVES: usize = 3;

// ============================================================
// Requests
// ============================================================

/// The four generation capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Email subject line generation.
    Subject,
    /// Email body generation.
    Body,
    /// Template optimization.
    Template,
    /// Per-recipient personalization.
    Personalize,
}

impl Capability {
    /// Stable string form used for audit records and gate key derivation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Subject => "subject",
            Capability::Body => "body",
            Capability::Template => "template",
            Capability::Personalize => "personalize",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the actor making a generation request.
///
/// Tenant/session resolution happens upstream; the pipeline only carries the
/// resolved identity for gate checks and audit attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    /// Tenant the actor belongs to.
    pub tenant_id: String,
    /// User performing the request.
    pub user_id: String,
}

impl ActorContext {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Per-request option overrides.
///
/// Unset fields resolve against `PipelineConfig` defaults at call time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier override for this call.
    pub model: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f64>,
    /// Token budget override.
    pub max_tokens: Option<u32>,
    /// Retry budget override (number of retries after the initial attempt).
    pub max_retries: Option<u32>,
}

/// Desired tone of voice for generated email content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTone {
    Professional,
    Friendly,
    Formal,
    Casual,
    Urgent,
}

impl std::fmt::Display for EmailTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmailTone::Professional => "professional",
            EmailTone::Friendly => "friendly",
            EmailTone::Formal => "formal",
            EmailTone::Casual => "casual",
            EmailTone::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

/// Business context for subject line generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectContext {
    /// What the email is for (e.g. "spring sale announcement").
    pub purpose: String,
    /// Who will receive it (e.g. "returning customers").
    pub audience: String,
    /// Desired tone, if the caller has a preference.
    pub tone: Option<EmailTone>,
    /// Key points the subject should reflect.
    pub key_points: Vec<String>,
    /// Terms the subject must contain (case-insensitive).
    pub must_include: Vec<String>,
    /// Terms the subject must not contain (case-insensitive).
    pub must_avoid: Vec<String>,
}

/// Business context for email body generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyContext {
    /// What the email is for.
    pub purpose: String,
    /// Who will receive it.
    pub audience: String,
    /// Desired tone, if the caller has a preference.
    pub tone: Option<EmailTone>,
    /// Key points the body should cover.
    pub key_points: Vec<String>,
    /// Call to action to close with, if any.
    pub call_to_action: Option<String>,
    /// Terms the body must contain (case-insensitive).
    pub must_include: Vec<String>,
    /// Terms the body must not contain (case-insensitive).
    pub must_avoid: Vec<String>,
}

/// Context for optimizing an existing email template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    /// The existing template markup to optimize.
    pub template: String,
    /// Optimization goals (e.g. "improve open rate", "shorten").
    pub goals: Vec<String>,
    /// Audience the template targets, if known.
    pub audience: Option<String>,
}

/// A recipient attribute profile used for personalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientProfile {
    /// Recipient's name.
    pub name: Option<String>,
    /// Recipient's company.
    pub company: Option<String>,
    /// Recipient's industry.
    pub industry: Option<String>,
    /// Known interest terms for this recipient.
    pub interests: Vec<String>,
}

/// Context for personalizing base content to a single recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizeContext {
    /// The base subject line to personalize.
    pub subject: String,
    /// The base body to personalize.
    pub body: String,
    /// The recipient to personalize for.
    pub profile: RecipientProfile,
}

// ============================================================
// Results
// ============================================================

/// Result of subject line generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResult {
    /// The generated subject line.
    pub subject: String,
    /// Model confidence in the primary subject (0.0 to 1.0).
    pub confidence: f64,
    /// The model's reasoning for its choice.
    pub reasoning: String,
    /// Alternative subject lines, each independently safety-filtered.
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Result of email body generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyResult {
    /// The generated body text.
    pub body: String,
    /// Tone the model believes it wrote in.
    pub tone: EmailTone,
    /// Model confidence (0.0 to 1.0).
    pub confidence: f64,
    /// The model's reasoning.
    pub reasoning: String,
    /// Safety score for the body. The model reports one, but the pipeline
    /// overwrites it with the classifier's score before returning.
    pub safety_score: f64,
}

/// The structural sections of an optimized template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStructure {
    pub header: String,
    pub body: String,
    pub footer: String,
    pub call_to_action: String,
}

/// Result of template optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResult {
    /// The optimized template markup.
    pub template: String,
    /// Placeholder variable names used by the template.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Structural breakdown of the optimized template.
    pub structure: TemplateStructure,
    /// Model confidence (0.0 to 1.0).
    pub confidence: f64,
    /// Further improvement recommendations.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Result of per-recipient personalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizeResult {
    /// Personalized subject line.
    pub subject: String,
    /// Personalized body.
    pub body: String,
    /// How much of the recipient profile was woven in (0.0 to 1.0).
    pub personalization_score: f64,
}

// ============================================================
// Safety and gating
// ============================================================

/// Outcome of the heuristic safety classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAssessment {
    /// Whether the content is safe to use.
    pub safe: bool,
    /// Safety score where 1.0 is maximally safe.
    pub score: f64,
    /// Human-readable findings, in detection order.
    pub issues: Vec<String>,
}

impl SafetyAssessment {
    /// Build an assessment from a score and findings.
    ///
    /// Maintains the invariant `safe == (score >= threshold)`.
    pub fn new(score: f64, issues: Vec<String>, threshold: f64) -> Self {
        Self {
            safe: score >= threshold,
            score,
            issues,
        }
    }
}

/// The three-tier authorization decision, evaluated kill switch first.
///
/// When an earlier tier denies the request, later tiers are not consulted
/// and report as disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Whether the operator kill switch is active.
    pub kill_switch_active: bool,
    /// Whether the capability family gate is enabled for the actor.
    pub family_enabled: bool,
    /// Whether the specific capability gate is enabled for the actor.
    pub capability_enabled: bool,
}

impl GateDecision {
    /// The request may proceed only if every tier passed.
    pub fn allowed(&self) -> bool {
        !self.kill_switch_active && self.family_enabled && self.capability_enabled
    }
}

// ============================================================
// Provider requests
// ============================================================

/// A structured-generation request handed to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredRequest {
    /// Model identifier.
    pub model: String,
    /// The full prompt, with constraints embedded in the instructions.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Token budget for the response.
    pub max_tokens: u32,
    /// Name of the schema the response must match.
    pub schema_name: String,
    /// JSON schema the response must match.
    pub schema: serde_json::Value,
}

/// A free-text generation request handed to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    /// Model identifier.
    pub model: String,
    /// The full prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Token budget for the response.
    pub max_tokens: u32,
}

// ============================================================
// Audit
// ============================================================

/// A durable record of one top-level generation call.
///
/// Exactly one record is written per orchestrator call, on both the success
/// and failure paths. Records are append-only and never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationAuditRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Tenant the call was made for.
    pub tenant_id: String,
    /// User who made the call.
    pub actor_id: String,
    /// Which capability was invoked.
    pub capability: Capability,
    /// Model identifier used for the call.
    pub model: String,
    /// The prompt sent to the provider, truncated to 1000 chars.
    pub prompt: String,
    /// Serialized response, truncated to 2000 chars. Absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Whether the call returned a result to the caller.
    pub success: bool,
    /// Wall-clock duration of the call in milliseconds.
    pub duration_ms: u64,
    /// Error message, truncated to 500 chars. Absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl GenerationAuditRecord {
    /// Create a record for a completed call, truncating oversized fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        actor: &ActorContext,
        capability: Capability,
        model: &str,
        prompt: &str,
        response: Option<&str>,
        success: bool,
        duration_ms: u64,
        error: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: actor.tenant_id.clone(),
            actor_id: actor.user_id.clone(),
            capability,
            model: model.to_string(),
            prompt: truncate_chars(prompt, MAX_AUDIT_PROMPT_CHARS),
            response: response.map(|r| truncate_chars(r, MAX_AUDIT_RESPONSE_CHARS)),
            success,
            duration_ms,
            error: error.map(|e| truncate_chars(e, MAX_AUDIT_ERROR_CHARS)),
            created_at: Utc::now(),
        }
    }
}

/// Truncate a string to at most `max` chars, respecting char boundaries.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}
