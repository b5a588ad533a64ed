//! Output handle for user-facing text
//!
//! A [`Printer`] is created once per run and handed to whatever needs to talk
//! to the user. With a transcript enabled, everything printed also lands in
//! `<dir>/<timestamp>/output.log`.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fans user-facing output out to one or more writers
pub struct Printer {
    sinks: Mutex<Vec<Box<dyn Write + Send>>>,
}

impl Printer {
    /// Print to stdout only
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Print to an arbitrary writer
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sinks: Mutex::new(vec![Box::new(writer)]),
        }
    }

    /// Print to stdout and to a fresh timestamped transcript under `dir`
    ///
    /// Returns the printer and the path of the transcript file.
    pub fn with_transcript(dir: &Path) -> io::Result<(Self, PathBuf)> {
        let run_dir = dir.join(chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string());
        fs::create_dir_all(&run_dir)?;

        let path = run_dir.join("output.log");
        let file = File::create(&path)?;

        let printer = Self {
            sinks: Mutex::new(vec![Box::new(io::stdout()), Box::new(file)]),
        };
        Ok((printer, path))
    }

    /// Write text without a trailing newline and flush
    pub fn print(&self, text: &str) {
        let mut sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.write_all(text.as_bytes()).and_then(|_| sink.flush()) {
                tracing::warn!(error = %e, "failed to write output");
            }
        }
    }

    /// Write text followed by a newline
    pub fn println(&self, text: &str) {
        self.print(&format!("{}\n", text));
    }
}
