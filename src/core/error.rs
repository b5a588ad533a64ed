//! Custom error types for conduit
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for conduit operations
#[derive(Error, Debug)]
pub enum ConduitError {
    /// Tool host connection, handshake or teardown failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The model stopped for a reason that ends the turn
    #[error(transparent)]
    FinishReason(#[from] FinishReasonError),

    /// Tool call arguments were not a JSON object
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    ToolArgument { tool: String, reason: String },

    /// The tool host reported a failure for a call
    #[error("Tool call '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// A tool returned a content item other than text
    #[error("Unsupported result type from tool '{tool}': {kind}")]
    UnsupportedResultType { tool: String, kind: String },

    /// The model kept requesting tools past the configured turn limit
    #[error("Turn limit exceeded: the model requested tools for {limit} consecutive turns")]
    TurnLimitExceeded { limit: usize },

    /// Model service errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Finish reasons that abort the current turn
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FinishReasonError {
    #[error("Length limit reached{}. Please try a shorter query.", tokens_suffix(.total_tokens))]
    Length { total_tokens: Option<u32> },

    #[error("Content filter triggered. Please try a different query.")]
    ContentFilter,

    #[error("Deprecated API usage. The model should use tool_calls instead of function_call.")]
    DeprecatedFunctionCall,

    #[error("Unknown finish reason: {0:?}")]
    Unknown(String),
}

fn tokens_suffix(total_tokens: &Option<u32>) -> String {
    match total_tokens {
        Some(total) => format!(" ({} tokens)", total),
        None => String::new(),
    }
}

/// Convenience Result type for conduit operations
pub type Result<T> = std::result::Result<T, ConduitError>;

impl ConduitError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a tool execution error
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a tool argument error
    pub fn tool_argument(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolArgument {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the tool host session is unusable
    ///
    /// Only transport failures end the process; everything else fails the
    /// current turn.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
