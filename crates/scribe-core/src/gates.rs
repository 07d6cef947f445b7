//! Three-tier gate enforcement.
//!
//! Every generation call passes kill switch → family gate → capability gate,
//! in that order, short-circuiting on the first failure. The kill switch is
//! always checked first and independently of the family/capability state so
//! an operator can halt all generation traffic with a single flag flip
//! regardless of per-tenant overrides.

use std::sync::Arc;

use scribe_types::content::{ActorContext, Capability, GateDecision};
use scribe_types::errors::GenerationError;
use scribe_types::traits::FeatureGateClient;

/// Operator kill switch. When active, all generation traffic is halted.
pub const KILL_SWITCH_GATE: &str = "ai_content_kill_switch";

/// Family gate covering every generation capability.
pub const CONTENT_FAMILY_GATE: &str = "ai_content_generation";

/// Gate key for a specific capability.
pub fn capability_gate(capability: Capability) -> &'static str {
    match capability {
        Capability::Subject => "email_subject_generation",
        Capability::Body => "email_body_generation",
        Capability::Template => "template_optimization",
        Capability::Personalize => "email_personalization",
    }
}

/// Evaluates the authorization hierarchy against a gate client.
pub struct GateEnforcer {
    gates: Arc<dyn FeatureGateClient>,
}

impl GateEnforcer {
    pub fn new(gates: Arc<dyn FeatureGateClient>) -> Self {
        Self { gates }
    }

    /// Warm the underlying gate client before first use.
    pub async fn warm(&self) -> Result<(), GenerationError> {
        self.gates.warm().await
    }

    /// Evaluate the three tiers in order, short-circuiting on first failure.
    ///
    /// Tiers after a failed one are not consulted and report as disabled.
    pub async fn decide(&self, actor: &ActorContext, capability: Capability) -> GateDecision {
        if self.gates.check_gate(actor, KILL_SWITCH_GATE).await {
            return GateDecision {
                kill_switch_active: true,
                family_enabled: false,
                capability_enabled: false,
            };
        }

        if !self.gates.check_gate(actor, CONTENT_FAMILY_GATE).await {
            return GateDecision {
                kill_switch_active: false,
                family_enabled: false,
                capability_enabled: false,
            };
        }

        let capability_enabled = self
            .gates
            .check_gate(actor, capability_gate(capability))
            .await;
        GateDecision {
            kill_switch_active: false,
            family_enabled: true,
            capability_enabled,
        }
    }

    /// Enforce the decision, mapping each failed tier to its typed error.
    pub async fn enforce(
        &self,
        actor: &ActorContext,
        capability: Capability,
    ) -> Result<(), GenerationError> {
        let decision = self.decide(actor, capability).await;

        if decision.kill_switch_active {
            tracing::warn!(
                tenant = %actor.tenant_id,
                capability = %capability,
                "kill switch active, refusing generation call"
            );
            return Err(GenerationError::KillSwitch(
                "AI content generation is temporarily disabled".to_string(),
            ));
        }
        if !decision.family_enabled {
            return Err(GenerationError::FamilyDisabled(
                "AI content functionality is not enabled for this user".to_string(),
            ));
        }
        if !decision.capability_enabled {
            return Err(GenerationError::CapabilityDisabled(format!(
                "Specific feature '{}' is not enabled",
                capability_gate(capability)
            )));
        }
        Ok(())
    }
}
