//! Anthropic Messages API provider.
//!
//! Implements [`ModelProvider`] for Claude models via the Anthropic Messages
//! API. Structured generation forces a single tool whose `input_schema` is
//! the capability schema and reads the resulting `tool_use` block; free-text
//! generation joins the response's text blocks.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use scribe_types::content::{StructuredRequest, TextRequest};
use scribe_types::errors::GenerationError;
use scribe_types::traits::ModelProvider;

/// Default Anthropic API base URL.
const DEFAULT_API_BASE: &str = "https://api.anthropic.com";

/// Current Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

/// Anthropic model provider using the Messages API.
pub struct AnthropicProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Anthropic API key.
    api_key: String,
    /// Base URL for the API (overridable for testing).
    api_base: String,
}

// -- Anthropic Messages API request/response types --

/// Request body for the Anthropic Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiToolDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

/// A message in the Anthropic Messages API format.
#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

/// Tool definition in Anthropic's API format.
#[derive(Debug, Serialize)]
struct ApiToolDef {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

/// Forced tool selection.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: String },
}

/// A content block in the response.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    /// Text content block.
    #[serde(rename = "text")]
    Text { text: String },
    /// Tool use content block — carries the structured payload.
    #[serde(rename = "tool_use")]
    ToolUse { input: serde_json::Value },
}

/// Response from the Anthropic Messages API.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// Error response from the Anthropic API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Create a new Anthropic provider with a custom base URL (for testing).
    pub fn with_base_url(api_key: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base,
        }
    }

    /// Send a request to the Messages API and parse the content blocks.
    async fn send_request(
        &self,
        request: MessagesRequest,
    ) -> Result<Vec<ContentBlock>, GenerationError> {
        let url = format!("{}/v1/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Provider(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::Provider(
                "Anthropic API rate limit exceeded (429)".to_string(),
            ));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GenerationError::Provider(
                "Anthropic API authentication failed: invalid API key".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err_resp) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(GenerationError::Provider(format!(
                    "Anthropic API error ({}): {}",
                    err_resp.error.error_type, err_resp.error.message
                )));
            }
            return Err(GenerationError::Provider(format!(
                "Anthropic API error (HTTP {status}): {body}"
            )));
        }

        let resp_body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Provider(format!("failed to parse response: {e}")))?;

        Ok(resp_body.content)
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    /// Generate a structured payload by forcing a schema-carrying tool.
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<serde_json::Value, GenerationError> {
        let tool_name = request.schema_name.clone();
        let api_request = MessagesRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.prompt,
            }],
            temperature: Some(request.temperature),
            tools: Some(vec![ApiToolDef {
                name: tool_name.clone(),
                description: "Record the generation result in the required structure.".to_string(),
                input_schema: request.schema,
            }]),
            tool_choice: Some(ToolChoice::Tool { name: tool_name }),
        };

        let content = self.send_request(api_request).await?;

        for block in content {
            if let ContentBlock::ToolUse { input, .. } = block {
                return Ok(input);
            }
        }

        Err(GenerationError::Validation(
            "model response contained no structured output".to_string(),
        ))
    }

    /// Generate free text by joining the response's text blocks.
    async fn generate_text(&self, request: TextRequest) -> Result<String, GenerationError> {
        let api_request = MessagesRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.prompt,
            }],
            temperature: Some(request.temperature),
            tools: None,
            tool_choice: None,
        };

        let content = self.send_request(api_request).await?;

        let text: String = content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse { .. } => None,
            })
            .collect();

        Ok(text)
    }
}
