//! CLI module - command-line interface
//!
//! Contains the REPL, input parsing, the turn summary display and Ctrl-C
//! handling.

pub mod commands;
pub mod display;
pub mod repl;
pub mod signal;

pub use commands::{parse_input, Input};
pub use display::format_activity;
pub use repl::Repl;
pub use signal::{run_until_interrupted, RunEnd};
