//! Shared fakes for the integration tests
//!
//! A scripted model provider, an in-memory tool host and a capturable
//! output buffer, so turns can run end to end without a network or a child
//! process.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conduit::core::{
    ConduitError, FinishReason, Message, Result, StreamFragment, ToolCall, ToolCallDelta,
    ToolSpec,
};
use conduit::llm::{FragmentStream, LLMProvider, LLMResponse};
use conduit::mcp::{CallOutcome, ToolDescriptor, ToolHost};
use conduit::{Config, Orchestrator, Printer};
use futures::StreamExt;
use serde_json::{json, Map, Value};
use tokio::sync::Barrier;

/// One scripted model reply
pub enum Step {
    /// Served whole, or split into fragments when streaming
    Reply(LLMResponse),
    /// Served as exactly these fragments
    Fragments(Vec<StreamFragment>),
    /// The provider call itself fails
    Fail(String),
}

/// Model provider that replays a fixed script
#[derive(Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
    seen_tools: Mutex<Vec<Vec<ToolSpec>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        }
    }

    pub fn replies(replies: Vec<LLMResponse>) -> Self {
        Self::new(replies.into_iter().map(Step::Reply).collect())
    }

    /// Number of model calls made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages sent on each call
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    /// Tool specs sent on each call
    pub fn seen_tools(&self) -> Vec<Vec<ToolSpec>> {
        self.seen_tools.lock().unwrap().clone()
    }

    fn next_step(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Step> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        self.seen_tools.lock().unwrap().push(tools.to_vec());

        match self.steps.lock().unwrap().pop_front() {
            Some(Step::Fail(message)) => Err(ConduitError::llm(message)),
            Some(step) => Ok(step),
            None => Err(ConduitError::llm("script exhausted")),
        }
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse> {
        match self.next_step(messages, tools)? {
            Step::Reply(response) => Ok(response),
            Step::Fragments(_) => Err(ConduitError::llm("fragments scripted for complete()")),
            Step::Fail(_) => unreachable!(),
        }
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<FragmentStream> {
        let fragments = match self.next_step(messages, tools)? {
            Step::Reply(response) => fragments_for(&response),
            Step::Fragments(fragments) => fragments,
            Step::Fail(_) => unreachable!(),
        };
        Ok(futures::stream::iter(fragments.into_iter().map(Ok)).boxed())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Split a response into the fragments a streaming service would send
pub fn fragments_for(response: &LLMResponse) -> Vec<StreamFragment> {
    let mut fragments = Vec::new();

    if let Some(ref text) = response.content {
        let middle = text.char_indices().nth(text.chars().count() / 2);
        match middle {
            Some((cut, _)) if cut > 0 => {
                fragments.push(StreamFragment::Text(text[..cut].to_string()));
                fragments.push(StreamFragment::Text(text[cut..].to_string()));
            }
            _ => fragments.push(StreamFragment::Text(text.clone())),
        }
    }

    for (slot, call) in response.tool_calls.iter().enumerate() {
        fragments.push(StreamFragment::ToolCall(ToolCallDelta {
            slot_index: slot,
            id: Some(call.id.clone()),
            kind: Some("function".to_string()),
            name_delta: Some(call.name.clone()),
            arguments_delta: None,
        }));
    }
    for (slot, call) in response.tool_calls.iter().enumerate() {
        fragments.push(StreamFragment::ToolCall(ToolCallDelta {
            slot_index: slot,
            arguments_delta: Some(call.arguments.clone()),
            ..Default::default()
        }));
    }

    fragments.push(StreamFragment::Finish(response.finish_reason.clone()));
    fragments
}

/// Tool host backed by a table of canned outcomes
#[derive(Default)]
pub struct MemoryHost {
    tools: Vec<ToolDescriptor>,
    outcomes: HashMap<String, CallOutcome>,
    delays: HashMap<String, Duration>,
    barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
    list_calls: AtomicUsize,
    disconnected: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a tool and answer its calls with `outcome`
    pub fn tool(mut self, name: &str, outcome: CallOutcome) -> Self {
        self.tools.push(ToolDescriptor {
            name: name.to_string(),
            description: Some(format!("The {} tool", name)),
            input_schema: json!({"type": "object", "properties": {}}),
        });
        self.outcomes.insert(name.to_string(), outcome);
        self
    }

    /// Delay every call to `name`
    pub fn delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Hold every call until `parties` calls are in flight at once
    pub fn rendezvous(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Fail catalog requests the way a dead session does
    pub fn disconnected(mut self) -> Self {
        self.disconnected = true;
        self
    }

    /// Tool name and arguments of every call, in arrival order
    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolHost for MemoryHost {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.disconnected {
            return Err(ConduitError::transport("Failed to list tools: connection closed"));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallOutcome> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));

        if let Some(ref barrier) = self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }

        Ok(self
            .outcomes
            .get(name)
            .cloned()
            .unwrap_or_else(|| CallOutcome::failure(format!("Unknown tool: {}", name))))
    }
}

/// Clonable in-memory writer for capturing printed output
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A printer writing into a fresh buffer
pub fn capture() -> (Printer, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (Printer::from_writer(buffer.clone()), buffer)
}

/// Test configuration with streaming chosen explicitly
pub fn config(streaming: bool) -> Config {
    let mut config = Config::default();
    config.agent.streaming = streaming;
    config.agent.system_prompt = None;
    config.transcript.enabled = false;
    config
}

/// Build an orchestrator over the given fakes
pub fn orchestrator(
    llm: &Arc<ScriptedProvider>,
    host: &Arc<MemoryHost>,
    config: &Config,
) -> Orchestrator {
    Orchestrator::new(llm.clone(), host.clone(), config)
}

pub fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall::new(id, name, arguments)
}

pub fn finished(reason: FinishReason) -> LLMResponse {
    LLMResponse::finished(reason)
}
