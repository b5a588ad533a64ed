//! Tool dispatcher
//!
//! Runs one batch of tool calls against the tool host concurrently and turns
//! each result into a tool-role message. Results come back in the order the
//! calls were issued, whatever order they complete in. The first failure
//! fails the whole batch and aborts the calls still in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::task::JoinSet;

use crate::core::{ConduitError, Message, Result, ToolCall};
use crate::mcp::ToolHost;

/// Concurrent executor for a batch of tool calls
#[derive(Clone)]
pub struct ToolDispatcher {
    host: Arc<dyn ToolHost>,
    timeout: Option<Duration>,
}

impl ToolDispatcher {
    /// Create a dispatcher; `timeout` bounds each call individually
    pub fn new(host: Arc<dyn ToolHost>, timeout: Option<Duration>) -> Self {
        Self { host, timeout }
    }

    /// Execute every call and return one tool message per call, in issue order
    pub async fn dispatch(&self, tool_calls: &[ToolCall]) -> Result<Vec<Message>> {
        let mut set: JoinSet<(usize, Result<Message>)> = JoinSet::new();

        for (index, call) in tool_calls.iter().enumerate() {
            let host = Arc::clone(&self.host);
            let call = call.clone();
            let timeout = self.timeout;

            set.spawn(async move { (index, execute_call(host, call, timeout).await) });
        }

        let mut results: Vec<Option<Message>> = vec![None; tool_calls.len()];

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(message))) => results[index] = Some(message),
                Ok((index, Err(e))) => {
                    tracing::warn!(
                        tool = %tool_calls[index].name,
                        call_id = %tool_calls[index].id,
                        error = %e,
                        "tool call failed, abandoning batch"
                    );
                    set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    set.abort_all();
                    return Err(ConduitError::tool_execution(
                        "dispatcher",
                        format!("Tool task panicked: {}", e),
                    ));
                }
            }
        }

        results
            .into_iter()
            .zip(tool_calls)
            .map(|(message, call)| {
                message.ok_or_else(|| {
                    ConduitError::tool_execution(&call.name, "Tool call produced no result")
                })
            })
            .collect()
    }
}

/// Parse raw JSON arguments into an object
///
/// Empty text means no arguments.
pub fn parse_arguments(call: &ToolCall) -> Result<Map<String, Value>> {
    if call.arguments.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&call.arguments) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ConduitError::tool_argument(
            &call.name,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(e) => Err(ConduitError::tool_argument(&call.name, e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Run one call start to finish
async fn execute_call(
    host: Arc<dyn ToolHost>,
    call: ToolCall,
    timeout: Option<Duration>,
) -> Result<Message> {
    let arguments = parse_arguments(&call)?;
    tracing::debug!(tool = %call.name, call_id = %call.id, "tool call started");

    let start = Instant::now();
    let invocation = host.call_tool(&call.name, arguments.clone());
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, invocation).await.map_err(|_| {
            ConduitError::tool_execution(
                &call.name,
                format!("timed out after {}s", limit.as_secs_f64()),
            )
        })??,
        None => invocation.await?,
    };
    tracing::debug!(
        tool = %call.name,
        call_id = %call.id,
        elapsed_ms = start.elapsed().as_millis() as u64,
        is_error = outcome.is_error,
        "tool call finished"
    );

    if outcome.is_error {
        let message = outcome
            .error
            .unwrap_or_else(|| "tool reported an error".to_string());
        return Err(ConduitError::tool_execution(&call.name, message));
    }

    let mut texts = Vec::with_capacity(outcome.content.len());
    for item in outcome.content {
        match (item.kind.as_str(), item.text) {
            ("text", Some(text)) => texts.push(Value::String(text)),
            (kind, _) => {
                return Err(ConduitError::UnsupportedResultType {
                    tool: call.name.clone(),
                    kind: kind.to_string(),
                })
            }
        }
    }

    let mut content = arguments;
    content.insert(call.name.clone(), Value::Array(texts));

    Ok(Message::tool_result(
        call.id,
        Value::Object(content).to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{CallOutcome, ContentItem, ToolDescriptor};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Host answering from a fixed table, with optional per-tool delays
    #[derive(Default)]
    struct TableHost {
        outcomes: HashMap<String, CallOutcome>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
    }

    impl TableHost {
        fn with(mut self, name: &str, outcome: CallOutcome) -> Self {
            self.outcomes.insert(name.to_string(), outcome);
            self
        }

        fn delayed(mut self, name: &str, delay: Duration) -> Self {
            self.delays.insert(name.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl ToolHost for TableHost {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
            Ok(Vec::new())
        }

        async fn call_tool(&self, name: &str, _arguments: Map<String, Value>) -> Result<CallOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(name) {
                tokio::time::sleep(*delay).await;
            }
            Ok(self
                .outcomes
                .get(name)
                .cloned()
                .unwrap_or_else(|| CallOutcome::failure(format!("no tool named {}", name))))
        }
    }

    fn dispatcher(host: TableHost) -> ToolDispatcher {
        ToolDispatcher::new(Arc::new(host), None)
    }

    #[tokio::test]
    async fn test_result_merges_arguments_and_texts() {
        let d = dispatcher(TableHost::default().with("search", CallOutcome::texts(["r1", "r2"])));
        let messages = d
            .dispatch(&[ToolCall::new("c1", "search", r#"{"q":"x"}"#)])
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("c1"));
        let content: Value = serde_json::from_str(messages[0].text()).unwrap();
        assert_eq!(content, serde_json::json!({"q": "x", "search": ["r1", "r2"]}));
    }

    #[tokio::test]
    async fn test_results_follow_issue_order() {
        let host = TableHost::default()
            .with("slow", CallOutcome::texts(["s"]))
            .with("fast", CallOutcome::texts(["f"]))
            .delayed("slow", Duration::from_millis(50));
        let d = dispatcher(host);

        let messages = d
            .dispatch(&[
                ToolCall::new("a", "slow", "{}"),
                ToolCall::new("b", "fast", "{}"),
            ])
            .await
            .unwrap();

        let ids: Vec<_> = messages
            .iter()
            .map(|m| m.tool_call_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_malformed_arguments_fail_without_calling_host() {
        let host = Arc::new(TableHost::default().with("search", CallOutcome::texts(["r"])));
        let d = ToolDispatcher::new(host.clone(), None);

        let err = d
            .dispatch(&[ToolCall::new("c1", "search", "{not json")])
            .await
            .unwrap_err();

        assert!(matches!(err, ConduitError::ToolArgument { .. }));
        assert_eq!(host.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_arguments_parse_as_empty_object() {
        let call = ToolCall::new("c1", "list_files", "  ");
        assert!(parse_arguments(&call).unwrap().is_empty());
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let call = ToolCall::new("c1", "search", "[1, 2]");
        let err = parse_arguments(&call).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[tokio::test]
    async fn test_host_error_is_execution_error() {
        let d = dispatcher(
            TableHost::default().with("run_pytest", CallOutcome::failure("exit status 2")),
        );
        let err = d
            .dispatch(&[ToolCall::new("c1", "run_pytest", "{}")])
            .await
            .unwrap_err();

        match err {
            ConduitError::ToolExecution { tool, message } => {
                assert_eq!(tool, "run_pytest");
                assert_eq!(message, "exit status 2");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_text_item_is_unsupported() {
        let outcome = CallOutcome {
            is_error: false,
            content: vec![ContentItem::text("ok"), ContentItem::other("image")],
            error: None,
        };
        let d = dispatcher(TableHost::default().with("screenshot", outcome));
        let err = d
            .dispatch(&[ToolCall::new("c1", "screenshot", "{}")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConduitError::UnsupportedResultType { ref kind, .. } if kind == "image"
        ));
    }

    #[tokio::test]
    async fn test_timeout_becomes_execution_error() {
        let host = TableHost::default()
            .with("hang", CallOutcome::texts(["never"]))
            .delayed("hang", Duration::from_secs(30));
        let d = ToolDispatcher::new(Arc::new(host), Some(Duration::from_millis(20)));

        let err = d
            .dispatch(&[ToolCall::new("c1", "hang", "{}")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let d = dispatcher(TableHost::default());
        let messages = d.dispatch(&[]).await.unwrap();
        assert!(messages.is_empty());
    }
}
