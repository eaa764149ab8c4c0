//! Tracing system for MiniCPU.
//!
//! Provides tracing of program execution with near-zero overhead when
//! disabled. Supports both human-readable and JSON output formats.
//!
//! The [`Tracer`] is a [`StepObserver`]: hand it to
//! [`Vm::run_observed`](minicpu_language::Vm::run_observed) and every
//! executed instruction, output line, halt, and fault is recorded.
//!
//! # Example
//!
//! ```text
//! > :trace on
//! > :run
//! S0001    0  start                -> 1    A=0 B=0 C=0 D=0 flags=--- sp=0
//! ...
//! > :trace last 2
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceSummary};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::{TraceEvent, TraceRecord};

use std::io::{self, Write};
use std::time::Instant;

use minicpu_foundation::{Address, Error};
use minicpu_language::{Halt, Instruction, MachineState, StepObserver};

// =============================================================================
// Trace Output
// =============================================================================

/// Where trace output should be sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceOutput {
    /// Only the buffer.
    #[default]
    None,
    /// Also echo each record to stderr as it is recorded.
    Stderr,
}

// =============================================================================
// Tracer Configuration
// =============================================================================

/// Configuration for the tracer.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Whether tracing is enabled.
    pub enabled: bool,
    /// Maximum records kept in the buffer.
    pub buffer_size: usize,
    /// Where records are echoed.
    pub output: TraceOutput,
    /// Whether to render records as JSON.
    pub json_format: bool,
    /// Event types to keep (empty keeps all).
    pub event_filter: Vec<String>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 10_000,
            output: TraceOutput::None,
            json_format: false,
            event_filter: Vec::new(),
        }
    }
}

impl TracerConfig {
    /// Creates a new tracer configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable tracing.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Builder method to set buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to echo records to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.output = TraceOutput::Stderr;
        self
    }

    /// Builder method to use JSON format.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Builder method to keep only some event types.
    #[must_use]
    pub fn filter_events(mut self, types: Vec<String>) -> Self {
        self.event_filter = types;
        self
    }
}

// =============================================================================
// Tracer
// =============================================================================

/// Records execution events reported by the VM.
///
/// Every observer callback returns before allocating if tracing is off.
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    /// Instructions completed so far.
    steps: u64,
    start_time: Instant,
}

impl Tracer {
    /// Creates a new tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let buffer = TraceBuffer::new(config.buffer_size);
        Self {
            config,
            buffer,
            steps: 0,
            start_time: Instant::now(),
        }
    }

    /// Creates a tracer that counts steps but records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Returns whether tracing is enabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Enables tracing.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Disables tracing. Recorded history is kept.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Returns the number of instructions traced so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Restarts step numbering, for a fresh program run.
    pub fn reset_steps(&mut self) {
        self.steps = 0;
    }

    /// Sets the trace output destination.
    pub fn set_output(&mut self, output: TraceOutput) {
        self.config.output = output;
    }

    /// Records a trace event against the given step.
    #[inline]
    pub fn record(&mut self, step: u64, event: TraceEvent) {
        if !self.config.enabled {
            return;
        }
        self.record_internal(step, event);
    }

    fn record_internal(&mut self, step: u64, event: TraceEvent) {
        let filter = &self.config.event_filter;
        if !filter.is_empty() && !filter.iter().any(|t| t == event.event_type()) {
            return;
        }

        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;
        self.buffer.push(step, timestamp_ns, event);

        if self.config.output == TraceOutput::Stderr {
            if let Some(record) = self.buffer.last() {
                let line = self.format_record(record);
                let _ = writeln!(io::stderr(), "{line}");
            }
        }
    }

    /// Formats a record using the configured format.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        if self.config.json_format {
            JsonFormatter.format(record)
        } else {
            HumanFormatter.format(record)
        }
    }

    /// The newest `count` records, optionally of one event type, rendered.
    #[must_use]
    pub fn last(&self, count: usize, event_type: Option<&str>) -> Vec<String> {
        self.render(&self.buffer.recent(count, event_type))
    }

    /// Every record belonging to one instruction, rendered.
    #[must_use]
    pub fn step(&self, step: u64) -> Vec<String> {
        self.render(&self.buffer.for_step(step))
    }

    fn render(&self, records: &[&TraceRecord]) -> Vec<String> {
        records.iter().map(|r| self.format_record(r)).collect()
    }

    /// Returns the trace buffer.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Clears the trace buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Describes what the buffer holds.
    #[must_use]
    pub fn summary(&self) -> TraceSummary {
        self.buffer.summary()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl StepObserver for Tracer {
    fn on_step(
        &mut self,
        pc: Address,
        instruction: &Instruction,
        next: Option<Address>,
        state: &MachineState,
    ) {
        self.steps += 1;
        if !self.is_enabled() {
            return;
        }
        let event = TraceEvent::Step {
            pc,
            instruction: instruction.to_string(),
            next,
            registers: state.registers(),
            flags: state.flags(),
            stack_depth: state.stack_depth(),
        };
        self.record(self.steps, event);
    }

    fn on_output(&mut self, pc: Address, line: &str) {
        if !self.is_enabled() {
            return;
        }
        // Output happens while the instruction is still in progress.
        let step = self.steps + 1;
        self.record(
            step,
            TraceEvent::Output {
                pc,
                line: line.to_string(),
            },
        );
    }

    fn on_halt(&mut self, pc: Address, reason: Halt) {
        self.record(self.steps, TraceEvent::Halt { pc, reason });
    }

    fn on_fault(&mut self, pc: Address, error: &Error) {
        if !self.is_enabled() {
            return;
        }
        let step = self.steps + 1;
        self.record(
            step,
            TraceEvent::Fault {
                pc,
                message: error.kind.to_string(),
            },
        );
    }
}

// =============================================================================
// Tests
// =============================================================================
