//! MCP module - the tool host side of a session
//!
//! The [`ToolHost`] trait is the seam between the turn loop and whatever
//! executes tools. [`SessionManager`] provides the real implementation over an
//! MCP stdio connection; tests substitute in-memory hosts.

pub mod catalog;
pub mod session;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::core::Result;

pub use catalog::to_function_specs;
pub use session::{McpToolHost, SessionManager};

/// A tool as advertised by the tool host
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// One content item of a tool result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Content kind, e.g. "text", "image", "resource"
    pub kind: String,
    /// Text payload for "text" items
    pub text: Option<String>,
}

impl ContentItem {
    /// A text content item
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }

    /// A non-text content item of the given kind
    pub fn other(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: None,
        }
    }
}

/// Outcome of a single tool invocation as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOutcome {
    pub is_error: bool,
    pub content: Vec<ContentItem>,
    pub error: Option<String>,
}

impl CallOutcome {
    /// A successful outcome with text items
    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_error: false,
            content: texts.into_iter().map(ContentItem::text).collect(),
            error: None,
        }
    }

    /// A failed outcome
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Something that advertises and executes named tools
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// Current tool catalog
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke `name` with parsed JSON object arguments
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallOutcome>;
}
