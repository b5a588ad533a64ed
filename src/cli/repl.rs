//! Interactive REPL for conduit
//!
//! Reads user lines, runs each one as a turn, and prints what happened. A
//! failed turn is reported and the loop keeps going, unless the tool host
//! session itself is gone.

use std::error::Error;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::agent::Orchestrator;
use crate::cli::commands::{parse_input, Input};
use crate::cli::display::format_activity;
use crate::core::{ConduitError, Printer, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    orchestrator: Orchestrator,
    printer: Printer,
}

impl Repl {
    pub fn new(orchestrator: Orchestrator, printer: Printer) -> Self {
        Self {
            orchestrator,
            printer,
        }
    }

    /// Run the REPL until `exit` or end of input
    ///
    /// A fatal error ends the loop and is returned after being reported.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<()> {
        self.printer.println("Welcome to conduit! Type 'exit' to quit.");

        let mut lines = reader.lines();

        loop {
            self.printer.print("\nYou: ");

            let line = match lines.next_line().await? {
                Some(line) => line,
                None => {
                    self.printer.println("");
                    break;
                }
            };

            match parse_input(&line) {
                Input::Exit => break,
                Input::Empty => continue,
                Input::Prompt(prompt) => {
                    if let Err(e) = self.process(&prompt).await {
                        self.report_error(&e);
                        if e.is_fatal() {
                            return Err(e);
                        }
                    }
                }
            }
        }

        self.printer.println("Goodbye!");
        Ok(())
    }

    /// Run a single query and print its activity
    pub async fn run_once(&mut self, prompt: &str) -> Result<()> {
        self.process(prompt).await
    }

    /// Run one turn and print the summary of what it appended
    async fn process(&mut self, prompt: &str) -> Result<()> {
        let start = self.orchestrator.run_turn(prompt, &self.printer).await?;
        let streaming = self.orchestrator.is_streaming();

        // +1 skips the user message
        let appended = self.orchestrator.conversation().messages_since(start + 1);
        let summary = format_activity(appended, !streaming);

        if streaming {
            if !summary.is_empty() {
                self.printer.println(&format!("\nTool activity:\n{}", summary));
            }
        } else {
            self.printer.println(&format!("\nAgent Response:\n{}", summary));
        }

        Ok(())
    }

    /// Print a failed turn with its cause chain
    fn report_error(&self, error: &ConduitError) {
        tracing::error!(error = %error, fatal = error.is_fatal(), "turn failed");

        self.printer
            .println(&format!("Error processing user input: {}", error));
        for cause in cause_chain(error) {
            self.printer.println(&format!("  caused by: {}", cause));
        }
    }

    /// Get the orchestrator
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

/// Messages of the error's sources, skipping any already shown in full by
/// the message before it
fn cause_chain(error: &dyn Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut shown = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !shown.contains(&text) {
            causes.push(text.clone());
        }
        shown = text;
        source = cause.source();
    }

    causes
}
