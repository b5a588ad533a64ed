//! OpenAI-compatible chat completions client
//!
//! Async HTTP client with tool calling and server-sent-event streaming.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::core::config::LlmConfig;
use crate::core::{
    ConduitError, FinishReason, Message, Result, StreamFragment, ToolCall, ToolCallDelta,
    ToolSpec,
};
use crate::llm::traits::{FragmentStream, LLMProvider, LLMResponse, TokenUsage};

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    stream: bool,
}

/// Message in wire format
#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool call in wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// Function invocation inside a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Tool definition in wire format
#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunction,
}

/// Function definition inside a tool
#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Chat completions response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// One streamed chunk
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    /// Set when the service reports a failure mid-stream
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<DeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct DeltaToolCall {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    call_type: Option<String>,
    #[serde(default)]
    function: Option<DeltaFunction>,
}

#[derive(Debug, Deserialize)]
struct DeltaFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Classification of one line of an SSE body
#[derive(Debug, PartialEq, Eq)]
enum SseLine<'a> {
    Data(&'a str),
    Done,
    Skip,
}

fn classify_sse_line(line: &str) -> SseLine<'_> {
    match line.trim().strip_prefix("data:") {
        Some(data) => {
            let data = data.trim_start();
            if data == "[DONE]" {
                SseLine::Done
            } else if data.is_empty() {
                SseLine::Skip
            } else {
                SseLine::Data(data)
            }
        }
        // event:, id:, retry: and comments carry nothing we use
        None => SseLine::Skip,
    }
}

/// Convert one streamed chunk into fragments, in the order they appeared
fn chunk_to_fragments(chunk: StreamChunk) -> Vec<StreamFragment> {
    let mut fragments = Vec::new();

    for choice in chunk.choices {
        if let Some(text) = choice.delta.content {
            if !text.is_empty() {
                fragments.push(StreamFragment::Text(text));
            }
        }

        for tc in choice.delta.tool_calls.unwrap_or_default() {
            let (name_delta, arguments_delta) = match tc.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            fragments.push(StreamFragment::ToolCall(ToolCallDelta {
                slot_index: tc.index,
                id: tc.id,
                kind: tc.call_type,
                name_delta,
                arguments_delta,
            }));
        }

        if let Some(reason) = choice.finish_reason {
            fragments.push(StreamFragment::Finish(FinishReason::parse(&reason)));
        }
    }

    fragments
}

/// What one SSE line contributes to the stream
#[derive(Debug, PartialEq)]
enum Decoded {
    Fragments(Vec<StreamFragment>),
    Done,
    Skip,
}

fn decode_line(line: &str) -> Result<Decoded> {
    let data = match classify_sse_line(line) {
        SseLine::Data(data) => data,
        SseLine::Done => return Ok(Decoded::Done),
        SseLine::Skip => return Ok(Decoded::Skip),
    };

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| ConduitError::llm(format!("Malformed stream chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(ConduitError::llm(match error.kind {
            Some(kind) => format!("Stream error ({}): {}", kind, error.message),
            None => format!("Stream error: {}", error.message),
        }));
    }

    Ok(Decoded::Fragments(chunk_to_fragments(chunk)))
}

/// Decode one line and forward its fragments
///
/// Returns false once nothing more should be sent.
async fn emit_line(raw: &[u8], tx: &mpsc::Sender<Result<StreamFragment>>) -> bool {
    let line = String::from_utf8_lossy(raw);

    match decode_line(&line) {
        Ok(Decoded::Skip) => true,
        Ok(Decoded::Done) => false,
        Ok(Decoded::Fragments(fragments)) => {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    return false;
                }
            }
            true
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

/// Split an SSE byte stream into lines and forward the decoded fragments
///
/// Stops at `[DONE]`, at the first error, or when the receiver goes away. A
/// final line without a trailing newline is still decoded.
async fn forward_sse<S, B, E>(bytes: S, tx: mpsc::Sender<Result<StreamFragment>>)
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut bytes = std::pin::pin!(bytes);
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk_result) = bytes.next().await {
        let chunk = match chunk_result {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx
                    .send(Err(ConduitError::llm(format!("Stream error: {}", e))))
                    .await;
                return;
            }
        };
        buffer.extend_from_slice(chunk.as_ref());

        // Only complete lines are decoded
        while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
            if !emit_line(&raw, &tx).await {
                return;
            }
        }
    }

    if !buffer.is_empty() {
        emit_line(&buffer, &tx).await;
    }
}

impl OpenAIClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Model requests are sent with
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert internal Message to wire format
    fn to_wire_message(msg: &Message) -> WireMessage {
        WireMessage {
            role: msg.role.to_string(),
            content: msg.content.clone(),
            tool_calls: msg.tool_calls.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|tc| WireToolCall {
                        id: tc.id.clone(),
                        call_type: function_type(),
                        function: WireFunctionCall {
                            name: tc.name.clone(),
                            arguments: tc.arguments.clone(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn to_wire_tool(spec: &ToolSpec) -> WireTool {
        WireTool {
            tool_type: "function",
            function: WireFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
        }
    }

    fn build_request<'a>(
        &'a self,
        messages: &[Message],
        tools: &[ToolSpec],
        stream: bool,
    ) -> ChatRequest<'a> {
        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (
                Some(tools.iter().map(Self::to_wire_tool).collect()),
                Some("auto"),
            )
        };

        ChatRequest {
            model: &self.model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            tools,
            tool_choice,
            stream,
        }
    }

    /// Convert a non-streaming response to LLMResponse
    fn to_llm_response(response: ChatResponse) -> Result<LLMResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ConduitError::llm("Response contained no choices"))?;

        let finish_reason = choice
            .finish_reason
            .as_deref()
            .map(FinishReason::parse)
            .unwrap_or_else(|| FinishReason::Unknown(String::new()));

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(LLMResponse {
            finish_reason,
            content: choice.message.content,
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    /// Post a request and check the status
    async fn send(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let body = serde_json::to_string(request)?;
            tracing::trace!(%body, "chat request");
        }

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                ConduitError::llm(format!(
                    "Cannot connect to model service at {}",
                    self.base_url
                ))
            } else {
                ConduitError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ConduitError::llm(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse> {
        let request = self.build_request(messages, tools, false);
        let response = self.send(&request).await?;

        let response_text = response.text().await?;
        tracing::trace!(body = %response_text, "chat response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| ConduitError::llm(format!("Failed to parse response: {}", e)))?;

        Self::to_llm_response(chat_response)
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<FragmentStream> {
        let request = self.build_request(messages, tools, true);
        let response = self.send(&request).await?;

        let (tx, rx) = mpsc::channel::<Result<StreamFragment>>(64);

        tokio::spawn(forward_sse(response.bytes_stream(), tx));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
