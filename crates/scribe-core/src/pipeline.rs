//! Generation orchestrator.
//!
//! One procedure per capability, all following the same skeleton:
//! build prompt → enforce gates → provider call under retry (including
//! structured decoding) → safety classification → constraint validation →
//! typed result. Every call, success or failure, writes exactly one audit
//! record before the outcome reaches the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scribe_safety::{personalization_score, validate_constraints};
use scribe_types::config::{PipelineConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use scribe_types::content::{
    ActorContext, BodyContext, BodyResult, Capability, GenerationAuditRecord, GenerationOptions,
    PersonalizeContext, PersonalizeResult, SafetyAssessment, StructuredRequest, SubjectContext,
    SubjectResult, TemplateContext, TemplateResult, TextRequest, MAX_SUBJECT_ALTERNATIVES,
};
use scribe_types::errors::GenerationError;
use scribe_types::traits::{AuditSink, ContentClassifier, FeatureGateClient, ModelProvider};

use crate::gates::GateEnforcer;
use crate::prompts;
use crate::retry::with_retry;

/// All trait-object dependencies required by the pipeline.
///
/// Grouping these keeps every dependency explicit and injectable for testing.
pub struct PipelineDeps {
    /// Feature-gate oracle for the authorization hierarchy.
    pub gates: Arc<dyn FeatureGateClient>,
    /// Language model provider.
    pub provider: Arc<dyn ModelProvider>,
    /// Durable audit sink.
    pub audit: Arc<dyn AuditSink>,
    /// Content safety strategy.
    pub classifier: Arc<dyn ContentClassifier>,
}

/// The generation orchestrator.
///
/// Stateless per call: dependencies are shared trait objects, configuration
/// is read-only, and the audit sink is append-only, so concurrent calls need
/// no synchronization.
pub struct ContentPipeline {
    gates: GateEnforcer,
    provider: Arc<dyn ModelProvider>,
    audit: Arc<dyn AuditSink>,
    classifier: Arc<dyn ContentClassifier>,
    config: PipelineConfig,
}

impl ContentPipeline {
    /// Create a new pipeline with all dependencies injected.
    pub fn new(deps: PipelineDeps, config: PipelineConfig) -> Self {
        Self {
            gates: GateEnforcer::new(deps.gates),
            provider: deps.provider,
            audit: deps.audit,
            classifier: deps.classifier,
            config,
        }
    }

    /// Warm the gate client before serving traffic.
    pub async fn warm(&self) -> Result<(), GenerationError> {
        self.gates.warm().await
    }

    /// Generate an email subject line.
    pub async fn generate_subject(
        &self,
        actor: &ActorContext,
        context: &SubjectContext,
        options: &GenerationOptions,
    ) -> Result<SubjectResult, GenerationError> {
        let started = Instant::now();
        let prompt = prompts::subject_prompt(context, &self.config);
        let model = self.resolve_model(Capability::Subject, options);

        let outcome = self
            .subject_inner(actor, context, options, &prompt, &model)
            .await;
        self.record_audit(actor, Capability::Subject, &model, &prompt, started, &outcome)
            .await;
        outcome
    }

    async fn subject_inner(
        &self,
        actor: &ActorContext,
        context: &SubjectContext,
        options: &GenerationOptions,
        prompt: &str,
        model: &str,
    ) -> Result<SubjectResult, GenerationError> {
        self.gates.enforce(actor, Capability::Subject).await?;

        let template = StructuredRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            schema_name: "email_subject".to_string(),
            schema: prompts::subject_schema(&self.config),
        };

        let provider = &self.provider;
        let config = &self.config;
        let mut result = with_retry(
            || {
                let request = template.clone();
                async move {
                    let value = provider.generate_structured(request).await?;
                    decode_subject(value, config)
                }
            },
            options.max_retries.unwrap_or(self.config.max_retries),
            Duration::from_millis(self.config.base_delay_ms),
        )
        .await?;

        // The primary subject aborts on a safety failure; alternatives are
        // best-effort supplementary content and unsafe ones are dropped.
        self.assess_primary(&result.subject, "subject")?;
        result.alternatives.retain(|alternative| {
            let assessment = self.classifier.assess(alternative);
            if !assessment.safe {
                tracing::debug!(
                    issues = ?assessment.issues,
                    "dropping unsafe alternative subject line"
                );
            }
            assessment.safe
        });

        validate_constraints(&result.subject, &context.must_include, &context.must_avoid)?;
        Ok(result)
    }

    /// Generate an email body.
    pub async fn generate_body(
        &self,
        actor: &ActorContext,
        context: &BodyContext,
        options: &GenerationOptions,
    ) -> Result<BodyResult, GenerationError> {
        let started = Instant::now();
        let prompt = prompts::body_prompt(context, &self.config);
        let model = self.resolve_model(Capability::Body, options);

        let outcome = self
            .body_inner(actor, context, options, &prompt, &model)
            .await;
        self.record_audit(actor, Capability::Body, &model, &prompt, started, &outcome)
            .await;
        outcome
    }

    async fn body_inner(
        &self,
        actor: &ActorContext,
        context: &BodyContext,
        options: &GenerationOptions,
        prompt: &str,
        model: &str,
    ) -> Result<BodyResult, GenerationError> {
        self.gates.enforce(actor, Capability::Body).await?;

        let template = StructuredRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            schema_name: "email_body".to_string(),
            schema: prompts::body_schema(&self.config),
        };

        let provider = &self.provider;
        let config = &self.config;
        let mut result = with_retry(
            || {
                let request = template.clone();
                async move {
                    let value = provider.generate_structured(request).await?;
                    decode_body(value, config)
                }
            },
            options.max_retries.unwrap_or(self.config.max_retries),
            Duration::from_millis(self.config.base_delay_ms),
        )
        .await?;

        // The model's self-reported safety score is never trusted; the
        // classifier's score replaces it.
        let assessment = self.assess_primary(&result.body, "body")?;
        result.safety_score = assessment.score;

        validate_constraints(&result.body, &context.must_include, &context.must_avoid)?;
        Ok(result)
    }

    /// Optimize an existing email template.
    pub async fn optimize_template(
        &self,
        actor: &ActorContext,
        context: &TemplateContext,
        options: &GenerationOptions,
    ) -> Result<TemplateResult, GenerationError> {
        let started = Instant::now();
        let prompt = prompts::template_prompt(context);
        let model = self.resolve_model(Capability::Template, options);

        let outcome = self
            .template_inner(actor, options, &prompt, &model)
            .await;
        self.record_audit(actor, Capability::Template, &model, &prompt, started, &outcome)
            .await;
        outcome
    }

    async fn template_inner(
        &self,
        actor: &ActorContext,
        options: &GenerationOptions,
        prompt: &str,
        model: &str,
    ) -> Result<TemplateResult, GenerationError> {
        self.gates.enforce(actor, Capability::Template).await?;

        let template = StructuredRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            schema_name: "email_template".to_string(),
            schema: prompts::template_schema(),
        };

        let provider = &self.provider;
        let result = with_retry(
            || {
                let request = template.clone();
                async move {
                    let value = provider.generate_structured(request).await?;
                    decode_template(value)
                }
            },
            options.max_retries.unwrap_or(self.config.max_retries),
            Duration::from_millis(self.config.base_delay_ms),
        )
        .await?;

        self.assess_primary(&result.template, "template")?;
        Ok(result)
    }

    /// Personalize base content for one recipient.
    pub async fn personalize(
        &self,
        actor: &ActorContext,
        context: &PersonalizeContext,
        options: &GenerationOptions,
    ) -> Result<PersonalizeResult, GenerationError> {
        let started = Instant::now();
        let prompt = prompts::personalize_prompt(context);
        let model = self.resolve_model(Capability::Personalize, options);

        let outcome = self
            .personalize_inner(actor, context, options, &prompt, &model)
            .await;
        self.record_audit(
            actor,
            Capability::Personalize,
            &model,
            &prompt,
            started,
            &outcome,
        )
        .await;
        outcome
    }

    async fn personalize_inner(
        &self,
        actor: &ActorContext,
        context: &PersonalizeContext,
        options: &GenerationOptions,
        prompt: &str,
        model: &str,
    ) -> Result<PersonalizeResult, GenerationError> {
        self.gates.enforce(actor, Capability::Personalize).await?;

        let template = TextRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let provider = &self.provider;
        let (subject, body) = with_retry(
            || {
                let request = template.clone();
                async move {
                    let text = provider.generate_text(request).await?;
                    parse_personalized(&text)
                }
            },
            options.max_retries.unwrap_or(self.config.max_retries),
            Duration::from_millis(self.config.base_delay_ms),
        )
        .await?;

        // Both parsed fields are primary content for this capability.
        self.assess_primary(&subject, "personalized subject")?;
        self.assess_primary(&body, "personalized body")?;

        let combined = format!("{subject}\n{body}");
        let score = personalization_score(&combined, &context.profile);

        Ok(PersonalizeResult {
            subject,
            body,
            personalization_score: score,
        })
    }

    /// Resolve the model for a capability, honoring the per-call override.
    fn resolve_model(&self, capability: Capability, options: &GenerationOptions) -> String {
        options
            .model
            .clone()
            .unwrap_or_else(|| self.config.model_for(capability).to_string())
    }

    /// Classify a primary output field, aborting the call when unsafe.
    fn assess_primary(
        &self,
        text: &str,
        field: &str,
    ) -> Result<SafetyAssessment, GenerationError> {
        let assessment = self.classifier.assess(text);
        if !assessment.safe {
            return Err(GenerationError::SafetyViolation(format!(
                "generated {field} failed safety review (score {:.2}): {}",
                assessment.score,
                assessment.issues.join("; ")
            )));
        }
        Ok(assessment)
    }

    /// Write the single audit record for a completed call.
    ///
    /// An audit failure is logged locally and never replaces the call's own
    /// result or error.
    async fn record_audit<T: serde::Serialize>(
        &self,
        actor: &ActorContext,
        capability: Capability,
        model: &str,
        prompt: &str,
        started: Instant,
        outcome: &Result<T, GenerationError>,
    ) {
        let duration_ms = started.elapsed().as_millis() as u64;
        let (success, response, error) = match outcome {
            Ok(value) => (true, serde_json::to_string(value).ok(), None),
            Err(err) => (false, None, Some(err.to_string())),
        };

        let record = GenerationAuditRecord::new(
            actor,
            capability,
            model,
            prompt,
            response.as_deref(),
            success,
            duration_ms,
            error.as_deref(),
        );

        if let Err(err) = self.audit.insert(record).await {
            tracing::error!(
                error = %err,
                capability = %capability,
                tenant = %actor.tenant_id,
                "failed to write generation audit record"
            );
        }
    }
}

/// Ensure a model-reported score lies within the `[0, 1]` unit interval.
fn check_unit_interval(value: f64, field: &str) -> Result<(), GenerationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(GenerationError::Validation(format!(
            "{field} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Decode and bounds-check a structured subject payload.
fn decode_subject(
    value: serde_json::Value,
    config: &PipelineConfig,
) -> Result<SubjectResult, GenerationError> {
    let mut result: SubjectResult = serde_json::from_value(value).map_err(|e| {
        GenerationError::Validation(format!("subject response did not match schema: {e}"))
    })?;

    if result.subject.chars().count() > config.max_subject_length {
        return Err(GenerationError::Validation(format!(
            "subject exceeds maximum length of {} characters",
            config.max_subject_length
        )));
    }
    check_unit_interval(result.confidence, "confidence")?;
    result.alternatives.truncate(MAX_SUBJECT_ALTERNATIVES);
    Ok(result)
}

/// Decode and bounds-check a structured body payload.
fn decode_body(
    value: serde_json::Value,
    config: &PipelineConfig,
) -> Result<BodyResult, GenerationError> {
    let result: BodyResult = serde_json::from_value(value).map_err(|e| {
        GenerationError::Validation(format!("body response did not match schema: {e}"))
    })?;

    if result.body.chars().count() > config.max_body_length {
        return Err(GenerationError::Validation(format!(
            "body exceeds maximum length of {} characters",
            config.max_body_length
        )));
    }
    check_unit_interval(result.confidence, "confidence")?;
    check_unit_interval(result.safety_score, "safety_score")?;
    Ok(result)
}

/// Decode and bounds-check a structured template payload.
fn decode_template(value: serde_json::Value) -> Result<TemplateResult, GenerationError> {
    let result: TemplateResult = serde_json::from_value(value).map_err(|e| {
        GenerationError::Validation(format!("template response did not match schema: {e}"))
    })?;
    check_unit_interval(result.confidence, "confidence")?;
    Ok(result)
}

/// Case-insensitively strip a line marker like `Subject:`, char-boundary safe.
fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let prefix = line.get(..marker.len())?;
    prefix
        .eq_ignore_ascii_case(marker)
        .then(|| &line[marker.len()..])
}

/// Split a personalized free-text response into subject and body.
fn parse_personalized(text: &str) -> Result<(String, String), GenerationError> {
    let mut lines = text.lines();

    let subject = loop {
        match lines.next() {
            Some(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match strip_marker(trimmed, "subject:") {
                    Some(rest) => break rest.trim().to_string(),
                    None => {
                        return Err(GenerationError::Validation(
                            "personalized response must start with a 'Subject:' line".to_string(),
                        ))
                    }
                }
            }
            None => {
                return Err(GenerationError::Validation(
                    "personalized response must start with a 'Subject:' line".to_string(),
                ));
            }
        }
    };

    if subject.is_empty() {
        return Err(GenerationError::Validation(
            "personalized response has an empty subject".to_string(),
        ));
    }

    let mut body_lines: Vec<&str> = lines.collect();
    if let Some(first) = body_lines.first().copied() {
        if let Some(rest) = strip_marker(first.trim(), "body:") {
            body_lines[0] = rest.trim_start();
        }
    }
    let body = body_lines.join("\n").trim().to_string();
    if body.is_empty() {
        return Err(GenerationError::Validation(
            "personalized response is missing a body".to_string(),
        ));
    }

    Ok((subject, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scribe_safety::HeuristicClassifier;
    use scribe_types::content::EmailTone;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::gates::{CONTENT_FAMILY_GATE, KILL_SWITCH_GATE};

    struct StaticGates {
        kill: bool,
        family: bool,
        capability: bool,
    }

    impl StaticGates {
        fn open() -> Self {
            Self {
                kill: false,
                family: true,
                capability: true,
            }
        }
    }

    #[async_trait]
    impl FeatureGateClient for StaticGates {
        async fn check_gate(&self, _actor: &ActorContext, gate_key: &str) -> bool {
            match gate_key {
                KILL_SWITCH_GATE => self.kill,
                CONTENT_FAMILY_GATE => self.family,
                _ => self.capability,
            }
        }
    }

    /// Provider that replays queued responses and counts invocations.
    #[derive(Default)]
    struct ScriptedProvider {
        structured: Mutex<VecDeque<Result<serde_json::Value, GenerationError>>>,
        text: Mutex<VecDeque<Result<String, GenerationError>>>,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        fn structured(responses: Vec<Result<serde_json::Value, GenerationError>>) -> Self {
            Self {
                structured: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn text(responses: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                text: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn generate_structured(
            &self,
            _request: StructuredRequest,
        ) -> Result<serde_json::Value, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.structured
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Provider("script exhausted".to_string())))
        }

        async fn generate_text(&self, _request: TextRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Provider("script exhausted".to_string())))
        }
    }

    #[derive(Default)]
    struct MemoryAudit {
        records: Mutex<Vec<GenerationAuditRecord>>,
    }

    impl MemoryAudit {
        fn records(&self) -> Vec<GenerationAuditRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuditSink for MemoryAudit {
        async fn insert(&self, record: GenerationAuditRecord) -> Result<(), GenerationError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

    struct FailingAudit;

    #[async_trait]
    impl AuditSink for FailingAudit {
        async fn insert(&self, _record: GenerationAuditRecord) -> Result<(), GenerationError> {
            Err(GenerationError::Audit("disk full".to_string()))
        }
    }

    fn pipeline(
        gates: StaticGates,
        provider: Arc<ScriptedProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> ContentPipeline {
        let mut config = PipelineConfig::default();
        // Keep retry sleeps negligible in tests.
        config.base_delay_ms = 1;
        ContentPipeline::new(
            PipelineDeps {
                gates: Arc::new(gates),
                provider,
                audit,
                classifier: Arc::new(HeuristicClassifier::default()),
            },
            config,
        )
    }

    fn actor() -> ActorContext {
        ActorContext::new("acme", "user-1")
    }

    fn subject_context() -> SubjectContext {
        SubjectContext {
            purpose: "spring sale announcement".to_string(),
            audience: "returning customers".to_string(),
            tone: Some(EmailTone::Friendly),
            key_points: vec![],
            must_include: vec![],
            must_avoid: vec![],
        }
    }

    fn body_context() -> BodyContext {
        BodyContext {
            purpose: "onboarding welcome".to_string(),
            audience: "new signups".to_string(),
            tone: None,
            key_points: vec![],
            call_to_action: None,
            must_include: vec![],
            must_avoid: vec![],
        }
    }

    fn no_retries() -> GenerationOptions {
        GenerationOptions {
            max_retries: Some(0),
            ..Default::default()
        }
    }

    fn subject_json(subject: &str, alternatives: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "subject": subject,
            "confidence": 0.9,
            "reasoning": "clear and specific",
            "alternatives": alternatives,
        })
    }

    fn body_json(body: &str, safety_score: f64) -> serde_json::Value {
        serde_json::json!({
            "body": body,
            "tone": "friendly",
            "confidence": 0.85,
            "reasoning": "warm welcome",
            "safety_score": safety_score,
        })
    }

    #[tokio::test]
    async fn subject_success_returns_result_and_audits_once() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(subject_json(
            "Spring savings for loyal customers",
            &["A fresh look for spring"],
        ))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider.clone(), audit.clone());

        let result = pipeline
            .generate_subject(&actor(), &subject_context(), &no_retries())
            .await
            .unwrap();

        assert_eq!(result.subject, "Spring savings for loyal customers");
        assert_eq!(result.alternatives, vec!["A fresh look for spring"]);
        assert_eq!(provider.call_count(), 1);

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].success);
        assert_eq!(records[0].capability, Capability::Subject);
        assert_eq!(records[0].tenant_id, "acme");
        assert!(records[0].response.as_ref().unwrap().contains("Spring savings"));
        assert!(records[0].error.is_none());
        assert!(!records[0].prompt.is_empty());
    }

    #[tokio::test]
    async fn kill_switch_blocks_before_the_provider_is_invoked() {
        let provider = Arc::new(ScriptedProvider::default());
        let audit = Arc::new(MemoryAudit::default());
        let gates = StaticGates {
            kill: true,
            family: true,
            capability: true,
        };
        let pipeline = pipeline(gates, provider.clone(), audit.clone());

        let err = pipeline
            .generate_subject(&actor(), &subject_context(), &no_retries())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::KillSwitch(_)));
        assert!(err.to_string().contains("temporarily disabled"));
        assert_eq!(provider.call_count(), 0);

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert!(records[0]
            .error
            .as_ref()
            .unwrap()
            .contains("temporarily disabled"));
    }

    #[tokio::test]
    async fn disabled_capability_propagates_and_audits() {
        let provider = Arc::new(ScriptedProvider::default());
        let audit = Arc::new(MemoryAudit::default());
        let gates = StaticGates {
            kill: false,
            family: true,
            capability: false,
        };
        let pipeline = pipeline(gates, provider.clone(), audit.clone());

        let err = pipeline
            .generate_body(&actor(), &body_context(), &no_retries())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::CapabilityDisabled(_)));
        assert!(err.to_string().contains("email_body_generation"));
        assert_eq!(provider.call_count(), 0);
        assert_eq!(audit.records().len(), 1);
    }

    #[tokio::test]
    async fn unsafe_alternatives_are_dropped_but_the_call_succeeds() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(subject_json(
            "Your spring preview is ready",
            &[
                "A calm look at the new season",
                "URGENT! Click here for FREE money!",
                "BUY NOW!!!! DON'T MISS OUT!!!!",
            ],
        ))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit);

        let result = pipeline
            .generate_subject(&actor(), &subject_context(), &no_retries())
            .await
            .unwrap();

        assert_eq!(result.alternatives, vec!["A calm look at the new season"]);
    }

    #[tokio::test]
    async fn unsafe_primary_subject_aborts_the_call() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(subject_json(
            "URGENT! Click here to claim your FREE money!",
            &[],
        ))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit.clone());

        let err = pipeline
            .generate_subject(&actor(), &subject_context(), &no_retries())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::SafetyViolation(_)));
        assert!(err.to_string().contains("Prohibited pattern"));

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
    }

    #[tokio::test]
    async fn missing_required_content_raises_a_constraint_error() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(body_json(
            "Welcome aboard. We're glad you joined.",
            0.95,
        ))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit.clone());

        let mut context = body_context();
        context.must_include = vec!["required phrase not in body".to_string()];

        let err = pipeline
            .generate_body(&actor(), &context, &no_retries())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::ConstraintViolation(_)));
        assert!(err.to_string().contains("missing required content"));
        assert_eq!(audit.records().len(), 1);
        assert!(!audit.records()[0].success);
    }

    #[tokio::test]
    async fn forbidden_content_raises_a_constraint_error() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(body_json(
            "We avoid technical jargon, mostly.",
            0.95,
        ))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit);

        let mut context = body_context();
        context.must_avoid = vec!["technical jargon".to_string()];

        let err = pipeline
            .generate_body(&actor(), &context, &no_retries())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("prohibited content"));
        assert!(err.to_string().contains("technical jargon"));
    }

    #[tokio::test]
    async fn body_safety_score_is_overwritten_by_the_classifier() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(body_json(
            "Welcome aboard. We're glad you joined.",
            0.1,
        ))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit);

        let result = pipeline
            .generate_body(&actor(), &body_context(), &no_retries())
            .await
            .unwrap();

        // The clean body scores 1.0 with the classifier; the model's 0.1
        // self-report is discarded.
        assert_eq!(result.safety_score, 1.0);
    }

    #[tokio::test]
    async fn schema_mismatch_is_retried_like_a_transient_fault() {
        let provider = Arc::new(ScriptedProvider::structured(vec![
            Ok(serde_json::json!({"wrong": "shape"})),
            Ok(subject_json("Second attempt lands", &[])),
        ]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider.clone(), audit);

        let options = GenerationOptions {
            max_retries: Some(1),
            ..Default::default()
        };
        let result = pipeline
            .generate_subject(&actor(), &subject_context(), &options)
            .await
            .unwrap();

        assert_eq!(result.subject, "Second attempt lands");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn provider_exhaustion_surfaces_the_last_error() {
        let provider = Arc::new(ScriptedProvider::structured(vec![
            Err(GenerationError::Provider("connection reset".to_string())),
            Err(GenerationError::Provider("connection reset".to_string())),
            Err(GenerationError::Provider("connection reset".to_string())),
        ]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider.clone(), audit.clone());

        let options = GenerationOptions {
            max_retries: Some(2),
            ..Default::default()
        };
        let err = pipeline
            .generate_subject(&actor(), &subject_context(), &options)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Provider(_)));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(audit.records().len(), 1);
    }

    #[tokio::test]
    async fn over_length_subject_is_a_validation_error() {
        let long_subject = "s".repeat(101);
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(subject_json(
            &long_subject,
            &[],
        ))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit);

        let err = pipeline
            .generate_subject(&actor(), &subject_context(), &no_retries())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Validation(_)));
        assert!(err.to_string().contains("maximum length"));
    }

    #[tokio::test]
    async fn audit_failure_never_masks_the_result() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(subject_json(
            "Quiet launch note",
            &[],
        ))]));
        let pipeline = pipeline(StaticGates::open(), provider, Arc::new(FailingAudit));

        let result = pipeline
            .generate_subject(&actor(), &subject_context(), &no_retries())
            .await
            .unwrap();

        assert_eq!(result.subject, "Quiet launch note");
    }

    #[tokio::test]
    async fn template_optimization_round_trips_the_structure() {
        let provider = Arc::new(ScriptedProvider::structured(vec![Ok(serde_json::json!({
            "template": "<h1>{{title}}</h1><p>{{body}}</p>",
            "variables": ["title", "body"],
            "structure": {
                "header": "<h1>{{title}}</h1>",
                "body": "<p>{{body}}</p>",
                "footer": "",
                "call_to_action": "See plans"
            },
            "confidence": 0.8,
            "recommendations": ["add preheader text"],
        }))]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit.clone());

        let context = TemplateContext {
            template: "<h1>old</h1>".to_string(),
            goals: vec!["improve open rate".to_string()],
            audience: None,
        };
        let result = pipeline
            .optimize_template(&actor(), &context, &no_retries())
            .await
            .unwrap();

        assert_eq!(result.variables, vec!["title", "body"]);
        assert_eq!(result.structure.call_to_action, "See plans");
        assert_eq!(result.recommendations, vec!["add preheader text"]);
        assert_eq!(audit.records()[0].capability, Capability::Template);
    }

    #[tokio::test]
    async fn personalize_parses_text_and_scores_the_profile() {
        let provider = Arc::new(ScriptedProvider::text(vec![Ok(
            "Subject: Dana, a plan for Globex\n\nHi Dana, here's how Globex can modernize \
             logistics with route planning."
                .to_string(),
        )]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit.clone());

        let context = PersonalizeContext {
            subject: "A plan for your team".to_string(),
            body: "Here's how we can help.".to_string(),
            profile: scribe_types::content::RecipientProfile {
                name: Some("Dana".to_string()),
                company: Some("Globex".to_string()),
                industry: Some("logistics".to_string()),
                interests: vec!["route planning".to_string()],
            },
        };

        let result = pipeline
            .personalize(&actor(), &context, &no_retries())
            .await
            .unwrap();

        assert_eq!(result.subject, "Dana, a plan for Globex");
        assert!(result.body.contains("route planning"));
        assert!((result.personalization_score - 1.0).abs() < 1e-9);
        assert_eq!(audit.records().len(), 1);
        assert!(audit.records()[0].success);
    }

    #[tokio::test]
    async fn personalize_without_subject_marker_is_a_validation_error() {
        let provider = Arc::new(ScriptedProvider::text(vec![Ok(
            "Here's a personalized note without the expected format.".to_string(),
        )]));
        let audit = Arc::new(MemoryAudit::default());
        let pipeline = pipeline(StaticGates::open(), provider, audit);

        let context = PersonalizeContext {
            subject: "Base".to_string(),
            body: "Base body".to_string(),
            profile: Default::default(),
        };

        let err = pipeline
            .personalize(&actor(), &context, &no_retries())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Validation(_)));
        assert!(err.to_string().contains("Subject:"));
    }

    #[test]
    fn parse_personalized_strips_optional_body_marker() {
        let (subject, body) =
            parse_personalized("Subject: Hello Dana\nBody: Welcome to the team.").unwrap();
        assert_eq!(subject, "Hello Dana");
        assert_eq!(body, "Welcome to the team.");
    }

    #[test]
    fn parse_personalized_skips_leading_blank_lines() {
        let (subject, body) = parse_personalized("\n\nSubject: Hi\n\nFirst paragraph.").unwrap();
        assert_eq!(subject, "Hi");
        assert_eq!(body, "First paragraph.");
    }
}
