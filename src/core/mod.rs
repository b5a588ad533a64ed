//! Core module - shared infrastructure for conduit
//!
//! This module contains foundational types, configuration, error handling
//! and the output handle used throughout the application.

pub mod config;
pub mod error;
pub mod printer;
pub mod types;

pub use config::Config;
pub use error::{ConduitError, FinishReasonError, Result};
pub use printer::Printer;
pub use types::*;
