//! Tool host session over MCP stdio
//!
//! Spawns the tool host as a child process, performs the MCP handshake and
//! owns the connection until [`SessionManager::close`].

use std::path::Path;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, Content, RawContent, Tool as McpTool};
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::ServiceExt;
use serde_json::{Map, Value};
use tokio::process::Command;

use crate::core::config::HostConfig;
use crate::core::{ConduitError, Result};
use crate::mcp::{CallOutcome, ContentItem, ToolDescriptor, ToolHost};

/// Owns the single connection to the tool host
pub struct SessionManager {
    service: RunningService<RoleClient, ()>,
    launch_target: String,
}

impl SessionManager {
    /// Launch the tool host and complete the MCP handshake
    ///
    /// `.py` targets run under the configured Python interpreter, `.js`
    /// targets under Node; anything else is executed directly.
    pub async fn connect(launch_target: &str, host: &HostConfig) -> Result<Self> {
        let (program, args) = resolve_launch(launch_target, host);
        tracing::debug!(%program, ?args, "launching tool host");

        let mut command = Command::new(&program);
        command.args(&args);

        let transport = TokioChildProcess::new(command).map_err(|e| {
            ConduitError::transport(format!("Failed to launch '{}': {}", launch_target, e))
        })?;

        let service = ().serve(transport).await.map_err(|e| {
            ConduitError::transport(format!("Handshake with '{}' failed: {}", launch_target, e))
        })?;

        tracing::info!(%launch_target, "connected to tool host");

        Ok(Self {
            service,
            launch_target: launch_target.to_string(),
        })
    }

    /// Handle for listing and calling tools over this connection
    pub fn host(&self) -> McpToolHost {
        McpToolHost {
            peer: self.service.peer().clone(),
        }
    }

    /// What the session was launched from
    pub fn launch_target(&self) -> &str {
        &self.launch_target
    }

    /// Shut down the connection and the child process
    pub async fn close(self) -> Result<()> {
        let reason = self
            .service
            .cancel()
            .await
            .map_err(|e| ConduitError::transport(format!("Teardown failed: {}", e)))?;
        tracing::debug!(launch_target = %self.launch_target, ?reason, "tool host session closed");
        Ok(())
    }
}

/// Pick the program and arguments used to start a launch target
pub fn resolve_launch(launch_target: &str, host: &HostConfig) -> (String, Vec<String>) {
    let extension = Path::new(launch_target)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("py") => (host.python.clone(), vec![launch_target.to_string()]),
        Some("js") => (host.node.clone(), vec![launch_target.to_string()]),
        _ => (launch_target.to_string(), Vec::new()),
    }
}

/// [`ToolHost`] backed by the session's MCP peer
///
/// Clones share the one underlying connection.
#[derive(Clone)]
pub struct McpToolHost {
    peer: Peer<RoleClient>,
}

#[async_trait]
impl ToolHost for McpToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| ConduitError::transport(format!("Failed to list tools: {}", e)))?;

        Ok(tools.into_iter().map(to_descriptor).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallOutcome> {
        let params = CallToolRequestParams {
            meta: None,
            name: name.to_string().into(),
            arguments: Some(arguments),
            task: None,
        };

        let result: CallToolResult = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| ConduitError::tool_execution(name, e.to_string()))?;

        Ok(to_outcome(result))
    }
}

fn to_descriptor(tool: McpTool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: Value::Object((*tool.input_schema).clone()),
    }
}

fn to_content_item(content: &Content) -> ContentItem {
    match &content.raw {
        RawContent::Text(t) => ContentItem::text(t.text.clone()),
        RawContent::Image(_) => ContentItem::other("image"),
        RawContent::Resource(_) => ContentItem::other("resource"),
        RawContent::Audio(_) => ContentItem::other("audio"),
        #[allow(unreachable_patterns)]
        _ => ContentItem::other("resource_link"),
    }
}

fn to_outcome(result: CallToolResult) -> CallOutcome {
    let content: Vec<ContentItem> = result.content.iter().map(to_content_item).collect();
    let is_error = result.is_error == Some(true);

    // MCP reports tool failures as text content on an error result
    let error = is_error.then(|| {
        content
            .iter()
            .filter_map(|item| item.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    });

    CallOutcome {
        is_error,
        content,
        error,
    }
}
