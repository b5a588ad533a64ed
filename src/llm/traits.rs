//! LLM Provider trait for abstracting model backends
//!
//! The orchestrator only talks to this trait, so any chat-completions style
//! service (or a scripted fake in tests) can drive a turn.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::core::{FinishReason, Message, Result, StreamFragment, ToolCall, ToolSpec};

/// Response from an LLM provider
#[derive(Debug, Clone, PartialEq)]
pub struct LLMResponse {
    /// Why generation stopped
    pub finish_reason: FinishReason,
    /// Text content of the response
    pub content: Option<String>,
    /// Tool calls in issue order
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    /// A final text answer
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            finish_reason: FinishReason::Stop,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            usage: None,
        }
    }

    /// A batch of tool calls
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            finish_reason: FinishReason::ToolCalls,
            content: None,
            tool_calls,
            usage: None,
        }
    }

    /// A response with an arbitrary finish reason and no payload
    pub fn finished(finish_reason: FinishReason) -> Self {
        Self {
            finish_reason,
            content: None,
            tool_calls: Vec::new(),
            usage: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Type alias for a boxed stream of response fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamFragment>> + Send>>;

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send the conversation and tool specs, wait for the whole response
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse>;

    /// Send the conversation and tool specs, return the response as fragments
    async fn complete_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<FragmentStream>;

    /// Get the provider name
    fn name(&self) -> &str;
}
