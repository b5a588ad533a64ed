//! LLM module - language model integrations
//!
//! Provides the provider abstraction and an OpenAI-compatible client.

pub mod openai;
pub mod traits;

pub use openai::OpenAIClient;
pub use traits::{FragmentStream, LLMProvider, LLMResponse, TokenUsage};
