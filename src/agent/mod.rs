//! Agent module - turn orchestration and conversation management
//!
//! Contains the turn loop that coordinates model calls and tool execution,
//! plus the streaming assembler and the concurrent tool dispatcher it uses.

pub mod assembler;
pub mod conversation;
pub mod dispatcher;
pub mod loop_state;
pub mod orchestrator;

pub use assembler::{assemble, StreamAssembler};
pub use conversation::Conversation;
pub use dispatcher::ToolDispatcher;
pub use loop_state::{Transition, TurnLoopState};
pub use orchestrator::Orchestrator;
