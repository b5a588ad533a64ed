//! Streaming response assembly
//!
//! Rebuilds a complete [`LLMResponse`] from the fragment sequence of a
//! streamed model response. Text is concatenated in arrival order and echoed
//! for live display; tool call fragments are accumulated per slot and
//! materialized in ascending slot order once the stream ends.

use std::collections::{BTreeMap, HashSet};

use futures::StreamExt;

use crate::core::{FinishReason, Printer, Result, StreamFragment, ToolCall, ToolCallDelta};
use crate::llm::{FragmentStream, LLMResponse};

/// Partial tool call for one slot
#[derive(Debug, Clone, Default)]
struct CallBuilder {
    id: Option<String>,
    kind: Option<String>,
    name: String,
    arguments: String,
}

impl CallBuilder {
    /// Apply a delta; only the fields it carries change
    fn apply(&mut self, delta: ToolCallDelta) {
        if let Some(id) = delta.id {
            self.id = Some(id);
        }
        if let Some(kind) = delta.kind {
            self.kind = Some(kind);
        }
        if let Some(name) = delta.name_delta {
            self.name.push_str(&name);
        }
        if let Some(arguments) = delta.arguments_delta {
            self.arguments.push_str(&arguments);
        }
    }
}

/// Single-pass accumulator over stream fragments
#[derive(Debug, Default)]
pub struct StreamAssembler {
    text: String,
    slots: BTreeMap<usize, CallBuilder>,
    finish_reason: Option<FinishReason>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment, returning any text that should be displayed now
    pub fn push(&mut self, fragment: StreamFragment) -> Option<&str> {
        match fragment {
            StreamFragment::Text(delta) => {
                let start = self.text.len();
                self.text.push_str(&delta);
                Some(&self.text[start..])
            }
            StreamFragment::ToolCall(delta) => {
                self.slots.entry(delta.slot_index).or_default().apply(delta);
                None
            }
            StreamFragment::Finish(reason) => {
                self.finish_reason = Some(reason);
                None
            }
        }
    }

    /// Close the stream and produce the assembled response
    ///
    /// Tool calls are only materialized when the stream finished with
    /// `tool_calls`. A stream that never reported a finish reason is treated
    /// as unknown.
    pub fn finish(self) -> LLMResponse {
        let finish_reason = self
            .finish_reason
            .unwrap_or_else(|| FinishReason::Unknown(String::new()));

        let tool_calls = if finish_reason == FinishReason::ToolCalls {
            materialize(self.slots)
        } else {
            Vec::new()
        };

        LLMResponse {
            finish_reason,
            content: (!self.text.is_empty()).then_some(self.text),
            tool_calls,
            usage: None,
        }
    }
}

/// Turn slot builders into calls, synthesizing ids the model never sent
fn materialize(slots: BTreeMap<usize, CallBuilder>) -> Vec<ToolCall> {
    let mut used: HashSet<String> = slots.values().filter_map(|b| b.id.clone()).collect();

    slots
        .into_iter()
        .map(|(slot, builder)| {
            if let Some(ref kind) = builder.kind {
                if kind != "function" {
                    tracing::warn!(slot, %kind, "tool call slot has a non-function type");
                }
            }

            let id = match builder.id {
                Some(id) => id,
                None => {
                    let base = format!("tool_{}", slot);
                    let mut candidate = base.clone();
                    let mut n = 1;
                    while used.contains(&candidate) {
                        candidate = format!("{}_{}", base, n);
                        n += 1;
                    }
                    used.insert(candidate.clone());
                    candidate
                }
            };

            ToolCall {
                id,
                name: builder.name,
                arguments: builder.arguments,
            }
        })
        .collect()
}

/// Drain a fragment stream, printing text as it arrives
pub async fn assemble(mut stream: FragmentStream, printer: &Printer) -> Result<LLMResponse> {
    let mut assembler = StreamAssembler::new();
    let mut printed = false;

    while let Some(fragment) = stream.next().await {
        if let Some(text) = assembler.push(fragment?) {
            if !printed {
                printer.print("\nAgent: ");
                printed = true;
            }
            printer.print(text);
        }
    }

    if printed {
        printer.println("");
    }

    Ok(assembler.finish())
}
