//! Turn loop state
//!
//! Tracks where a user turn is in the model/tool cycle and how many model
//! calls it has used.

use crate::core::{FinishReason, FinishReasonError};

/// Where the turn goes after a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Final answer received
    Final,
    /// Tool calls requested; dispatch them and ask the model again
    Continue,
    /// Generation stopped for a reason that ends the turn
    Failed(FinishReasonError),
}

impl Transition {
    /// Classify a finish reason
    ///
    /// `total_tokens` is reported on length failures when known.
    pub fn from_finish_reason(reason: &FinishReason, total_tokens: Option<u32>) -> Self {
        match reason {
            FinishReason::Stop => Transition::Final,
            FinishReason::ToolCalls => Transition::Continue,
            FinishReason::Length => Transition::Failed(FinishReasonError::Length { total_tokens }),
            FinishReason::ContentFilter => Transition::Failed(FinishReasonError::ContentFilter),
            FinishReason::FunctionCall => {
                Transition::Failed(FinishReasonError::DeprecatedFunctionCall)
            }
            FinishReason::Unknown(raw) => Transition::Failed(FinishReasonError::Unknown(raw.clone())),
        }
    }
}

/// Bookkeeping for one user turn
#[derive(Debug, Clone)]
pub struct TurnLoopState {
    /// Model calls made so far
    pub turn: usize,
    /// Maximum model calls allowed
    pub max_turns: usize,
}

impl TurnLoopState {
    /// Create a new loop state with the given max turns
    pub fn new(max_turns: usize) -> Self {
        Self { turn: 0, max_turns }
    }

    /// Whether another model call is allowed
    pub fn can_continue(&self) -> bool {
        self.turn < self.max_turns
    }

    /// Increment the turn counter
    pub fn next_turn(&mut self) {
        self.turn += 1;
    }
}
