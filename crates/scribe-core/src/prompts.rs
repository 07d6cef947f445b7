//! Prompt and schema builders for each generation capability.
//!
//! Constraints (length limits, required/forbidden terms, tone, audience) are
//! embedded directly into the instructions given to the model, then enforced
//! again downstream by the validators — the prompt steers, the validators
//! decide.

use scribe_types::config::PipelineConfig;
use scribe_types::content::{
    BodyContext, PersonalizeContext, SubjectContext, TemplateContext, MAX_SUBJECT_ALTERNATIVES,
};

/// Build the prompt for subject line generation.
pub fn subject_prompt(context: &SubjectContext, config: &PipelineConfig) -> String {
    let mut prompt = String::new();
    prompt.push_str("Write an email subject line for a marketing campaign.\n\n");
    prompt.push_str(&format!("Purpose: {}\n", context.purpose));
    prompt.push_str(&format!("Audience: {}\n", context.audience));
    if let Some(tone) = context.tone {
        prompt.push_str(&format!("Tone: {tone}\n"));
    }
    push_list(&mut prompt, "Key points to reflect", &context.key_points);
    prompt.push_str(&format!(
        "\nThe subject line must be at most {} characters.\n",
        config.max_subject_length
    ));
    push_terms(&mut prompt, "It must include", &context.must_include);
    push_terms(&mut prompt, "It must not mention", &context.must_avoid);
    prompt.push_str(&format!(
        "\nAlso provide up to {MAX_SUBJECT_ALTERNATIVES} alternative subject lines, \
         a confidence between 0 and 1, and a short reasoning for your choice.\n"
    ));
    prompt
}

/// Schema for the structured subject result.
pub fn subject_schema(config: &PipelineConfig) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "subject": {
                "type": "string",
                "maxLength": config.max_subject_length,
                "description": "The subject line."
            },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "reasoning": { "type": "string" },
            "alternatives": {
                "type": "array",
                "items": { "type": "string", "maxLength": config.max_subject_length },
                "maxItems": MAX_SUBJECT_ALTERNATIVES
            }
        },
        "required": ["subject", "confidence", "reasoning"]
    })
}

/// Build the prompt for email body generation.
pub fn body_prompt(context: &BodyContext, config: &PipelineConfig) -> String {
    let mut prompt = String::new();
    prompt.push_str("Write the body of a marketing email.\n\n");
    prompt.push_str(&format!("Purpose: {}\n", context.purpose));
    prompt.push_str(&format!("Audience: {}\n", context.audience));
    if let Some(tone) = context.tone {
        prompt.push_str(&format!("Tone: {tone}\n"));
    }
    push_list(&mut prompt, "Key points to cover", &context.key_points);
    if let Some(cta) = &context.call_to_action {
        prompt.push_str(&format!("Close with this call to action: {cta}\n"));
    }
    prompt.push_str(&format!(
        "\nThe body must be at most {} characters of plain text.\n",
        config.max_body_length
    ));
    push_terms(&mut prompt, "It must include", &context.must_include);
    push_terms(&mut prompt, "It must not mention", &context.must_avoid);
    prompt.push_str(
        "\nReport the tone you wrote in, a confidence between 0 and 1, a short \
         reasoning, and your own safety score for the content between 0 and 1.\n",
    );
    prompt
}

/// Schema for the structured body result.
pub fn body_schema(config: &PipelineConfig) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "body": {
                "type": "string",
                "maxLength": config.max_body_length,
                "description": "The email body text."
            },
            "tone": {
                "type": "string",
                "enum": ["professional", "friendly", "formal", "casual", "urgent"]
            },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "reasoning": { "type": "string" },
            "safety_score": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
        },
        "required": ["body", "tone", "confidence", "reasoning", "safety_score"]
    })
}

/// Build the prompt for template optimization.
pub fn template_prompt(context: &TemplateContext) -> String {
    let mut prompt = String::new();
    prompt.push_str("Optimize the following email template.\n\n");
    if let Some(audience) = &context.audience {
        prompt.push_str(&format!("Audience: {audience}\n"));
    }
    push_list(&mut prompt, "Optimization goals", &context.goals);
    prompt.push_str("\nTemplate:\n");
    prompt.push_str(&context.template);
    prompt.push_str(
        "\n\nReturn the optimized template markup, the placeholder variable names \
         it uses, its header/body/footer/call-to-action structure, a confidence \
         between 0 and 1, and any further recommendations.\n",
    );
    prompt
}

/// Schema for the structured template result.
pub fn template_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "template": { "type": "string", "description": "The optimized template markup." },
            "variables": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Placeholder variable names used by the template."
            },
            "structure": {
                "type": "object",
                "properties": {
                    "header": { "type": "string" },
                    "body": { "type": "string" },
                    "footer": { "type": "string" },
                    "call_to_action": { "type": "string" }
                },
                "required": ["header", "body", "footer", "call_to_action"]
            },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "recommendations": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["template", "structure", "confidence"]
    })
}

/// Build the prompt for per-recipient personalization.
///
/// Personalization post-processes free text rather than a schema: the model
/// is instructed to answer with a `Subject:` line followed by the body.
pub fn personalize_prompt(context: &PersonalizeContext) -> String {
    let mut prompt = String::new();
    prompt.push_str("Personalize the following email for one recipient.\n\n");
    prompt.push_str("Recipient profile:\n");
    if let Some(name) = &context.profile.name {
        prompt.push_str(&format!("- Name: {name}\n"));
    }
    if let Some(company) = &context.profile.company {
        prompt.push_str(&format!("- Company: {company}\n"));
    }
    if let Some(industry) = &context.profile.industry {
        prompt.push_str(&format!("- Industry: {industry}\n"));
    }
    push_list(&mut prompt, "- Interests", &context.profile.interests);
    prompt.push_str(&format!("\nBase subject: {}\n", context.subject));
    prompt.push_str(&format!("Base body:\n{}\n", context.body));
    prompt.push_str(
        "\nWeave the recipient's details naturally into the content. Answer with \
         a single line starting with \"Subject:\" followed by the personalized \
         body on the lines after it.\n",
    );
    prompt
}

fn push_list(prompt: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push_str(&format!("{label}:\n"));
    for item in items {
        prompt.push_str(&format!("- {item}\n"));
    }
}

fn push_terms(prompt: &mut String, label: &str, terms: &[String]) {
    if terms.is_empty() {
        return;
    }
    let quoted: Vec<String> = terms.iter().map(|t| format!("\"{t}\"")).collect();
    prompt.push_str(&format!("{label}: {}.\n", quoted.join(", ")));
}
