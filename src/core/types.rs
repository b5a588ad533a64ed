//! Shared types used across conduit modules
//!
//! Contains the conversation message model, tool call and tool spec
//! definitions, finish reasons and streamed response fragments.

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Text content, absent on assistant messages that only carry tool calls
    pub content: Option<String>,
    /// Tool calls issued by the assistant, in issue order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Id of the call this message answers (tool role only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create an assistant message carrying a final text answer
    pub fn assistant_text(content: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create an assistant message carrying a batch of tool calls
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a tool-role message answering the call with `tool_call_id`
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text content, or an empty string
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Id of the call, unique within the issuing assistant message
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Raw JSON arguments, parsed only at dispatch time
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Model-callable function specification derived from a tool host descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Name of the function
    pub name: String,
    /// Description of what the function does (empty if the host gave none)
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal completion with a final answer
    Stop,
    /// The model requested a batch of tool calls
    ToolCalls,
    /// Output truncated by the token limit
    Length,
    /// Output withheld by the content policy
    ContentFilter,
    /// Deprecated single-function call path
    FunctionCall,
    /// Anything the client does not recognize, with the raw value
    Unknown(String),
}

impl FinishReason {
    /// Map a wire value onto a finish reason; never fails
    pub fn parse(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "tool_calls" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            "function_call" => FinishReason::FunctionCall,
            other => FinishReason::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::ToolCalls => write!(f, "tool_calls"),
            FinishReason::Length => write!(f, "length"),
            FinishReason::ContentFilter => write!(f, "content_filter"),
            FinishReason::FunctionCall => write!(f, "function_call"),
            FinishReason::Unknown(raw) => write!(f, "unknown({})", raw),
        }
    }
}

/// Incremental update to one in-progress tool call slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallDelta {
    /// Slot the update targets; several fragments may share a slot
    pub slot_index: usize,
    /// Call id, usually sent once on the first fragment
    pub id: Option<String>,
    /// Call type, usually "function"
    pub kind: Option<String>,
    /// Piece of the function name
    pub name_delta: Option<String>,
    /// Piece of the JSON arguments text
    pub arguments_delta: Option<String>,
}

/// One piece of a streamed model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFragment {
    /// Piece of the assistant's text
    Text(String),
    /// Piece of an indexed tool call
    ToolCall(ToolCallDelta),
    /// Terminal finish reason
    Finish(FinishReason),
}
