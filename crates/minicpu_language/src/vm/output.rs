//! Output sinks for `prn`.
//!
//! The machine's only I/O is an append-only stream of lines. Sinks decide
//! where those lines go.

use std::io::Write;

use minicpu_foundation::{Error, Result};

/// Receives lines emitted by `prn`.
pub trait OutputSink {
    /// Appends one line.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the line cannot be delivered.
    fn emit(&mut self, line: &str) -> Result<()>;
}

/// Collects lines in memory.
impl OutputSink for Vec<String> {
    fn emit(&mut self, line: &str) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes each line, newline-terminated, to a `Write` implementation.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<std::io::Stdout> {
    /// Creates a sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn emit(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::io(format!("failed to write output: {e}")))
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }
}
