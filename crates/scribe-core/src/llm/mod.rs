//! Model provider implementations for the Scribe pipeline.
//!
//! Provides the concrete implementation of the
//! [`scribe_types::traits::ModelProvider`] trait:
//! - **Anthropic** (`AnthropicProvider`): Claude models via the Messages API,
//!   with structured generation via forced tool use

pub mod anthropic;

pub use anthropic::AnthropicProvider;
