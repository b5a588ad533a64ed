//! Turn orchestrator
//!
//! Drives one user turn: send the conversation and the current tool catalog
//! to the model, then either record the final answer, dispatch the requested
//! tool calls and ask again, or fail the turn on any other finish reason.

use std::sync::Arc;

use crate::agent::assembler::assemble;
use crate::agent::conversation::Conversation;
use crate::agent::dispatcher::ToolDispatcher;
use crate::agent::loop_state::{Transition, TurnLoopState};
use crate::core::config::AgentConfig;
use crate::core::{Config, ConduitError, Message, Printer, Result, ToolCall};
use crate::llm::{LLMProvider, LLMResponse};
use crate::mcp::{to_function_specs, ToolHost};

/// Owns the conversation and runs turns against the model and tool host
pub struct Orchestrator {
    /// Model service
    llm: Arc<dyn LLMProvider>,
    /// Tool host, re-queried for its catalog before every model call
    host: Arc<dyn ToolHost>,
    /// Concurrent tool executor
    dispatcher: ToolDispatcher,
    /// Conversation history
    conversation: Conversation,
    /// Turn loop configuration
    config: AgentConfig,
}

impl Orchestrator {
    /// Create an orchestrator from the full configuration
    pub fn new(llm: Arc<dyn LLMProvider>, host: Arc<dyn ToolHost>, config: &Config) -> Self {
        let dispatcher = ToolDispatcher::new(Arc::clone(&host), config.tool_timeout());

        Self {
            llm,
            host,
            dispatcher,
            conversation: Conversation::new(),
            config: config.agent.clone(),
        }
    }

    /// Run one user turn to completion
    ///
    /// Returns the index of the user message, so callers can read everything
    /// the turn appended with [`Conversation::messages_since`]. On failure the
    /// messages committed before the failing step stay in the conversation.
    pub async fn run_turn(&mut self, user_input: &str, printer: &Printer) -> Result<usize> {
        let user_index = self.conversation.len();
        self.conversation.push(Message::user(user_input));

        let mut state = TurnLoopState::new(self.config.max_turns);

        loop {
            if !state.can_continue() {
                return Err(ConduitError::TurnLimitExceeded {
                    limit: state.max_turns,
                });
            }
            state.next_turn();

            let response = self.request_model(printer).await?;
            let total_tokens = response.usage.as_ref().map(|u| u.total_tokens);

            tracing::debug!(
                turn = state.turn,
                finish_reason = %response.finish_reason,
                tool_calls = response.tool_calls.len(),
                "model responded"
            );

            match Transition::from_finish_reason(&response.finish_reason, total_tokens) {
                Transition::Final => {
                    self.conversation
                        .push(Message::assistant_text(response.content));
                    return Ok(user_index);
                }
                Transition::Continue => {
                    self.continue_with_tools(response.tool_calls, state.turn, printer)
                        .await?;
                }
                Transition::Failed(reason) => return Err(reason.into()),
            }
        }
    }

    /// Record the tool call batch, dispatch it and record the results
    async fn continue_with_tools(
        &mut self,
        tool_calls: Vec<ToolCall>,
        turn: usize,
        printer: &Printer,
    ) -> Result<()> {
        if !tool_calls.is_empty() {
            let names: Vec<&str> = tool_calls.iter().map(|c| c.name.as_str()).collect();
            printer.println(&format!(
                "[Turn {}] Calling {} tool(s): {}",
                turn,
                tool_calls.len(),
                names.join(", ")
            ));
        }

        self.conversation
            .push(Message::assistant_tool_calls(tool_calls.clone()));

        let results = self.dispatcher.dispatch(&tool_calls).await?;
        self.conversation.extend(results);
        Ok(())
    }

    /// Send the conversation and the current tool catalog to the model
    async fn request_model(&self, printer: &Printer) -> Result<LLMResponse> {
        let specs = to_function_specs(&self.host.list_tools().await?);
        let messages = self.outgoing_messages();

        if self.config.streaming {
            let stream = self.llm.complete_stream(&messages, &specs).await?;
            assemble(stream, printer).await
        } else {
            self.llm.complete(&messages, &specs).await
        }
    }

    /// Messages sent to the model, with the system prompt when configured
    fn outgoing_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.conversation.len() + 1);
        if let Some(ref prompt) = self.config.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend(self.conversation.messages().iter().cloned());
        messages
    }

    /// Get the conversation so far
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Get the turn loop configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Whether responses are streamed
    pub fn is_streaming(&self) -> bool {
        self.config.streaming
    }

    /// Name of the model provider
    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }
}
