/// Core orchestration for the Scribe content pipeline.
///
/// This crate wires the pieces together:
/// - **Gate enforcement** (`gates`): kill switch → family → capability
/// - **Retry executor** (`retry`): exponential backoff with jitter
/// - **Model provider** (`llm`): Anthropic Messages API client
/// - **Prompt builders** (`prompts`): typed prompts and schemas per capability
/// - **Orchestrator** (`pipeline`): the four generation procedures
pub mod gates;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod retry;

pub use gates::GateEnforcer;
pub use llm::AnthropicProvider;
pub use pipeline::{ContentPipeline, PipelineDeps};
pub use retry::with_retry;
