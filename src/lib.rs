//! conduit - interactive tool-calling agent over MCP
//!
//! Connects an OpenAI-compatible chat model to the tools exposed by an MCP
//! server running as a child process, and lets the model call those tools
//! while answering the user.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, error handling and output
//! - **LLM**: Model provider abstraction with an OpenAI-compatible client
//! - **MCP**: Tool host session and catalog conversion
//! - **Agent**: Turn loop, stream assembly and concurrent tool dispatch
//! - **CLI**: REPL, input parsing and activity display
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use conduit::{Config, OpenAIClient, Orchestrator, Printer, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> conduit::Result<()> {
//!     let config = Config::load();
//!     let session = SessionManager::connect("server.py", &config.host).await?;
//!     let llm = Arc::new(OpenAIClient::from_config(&config.llm)?);
//!
//!     let mut orchestrator = Orchestrator::new(llm, Arc::new(session.host()), &config);
//!     orchestrator
//!         .run_turn("What is the largest prime factor of 600851475143?", &Printer::stdout())
//!         .await?;
//!
//!     session.close().await
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod mcp;

// Re-export commonly used items
pub use agent::Orchestrator;
pub use cli::Repl;
pub use core::{Config, ConduitError, Printer, Result};
pub use llm::{LLMProvider, OpenAIClient};
pub use mcp::{SessionManager, ToolHost};
