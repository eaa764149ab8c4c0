//! Execution tracing for MiniCPU.
//!
//! This crate provides:
//! - `Tracer` - A `StepObserver` that records executed instructions,
//!   output, halts, and faults
//! - `TraceBuffer` - Bounded history of trace records
//! - `HumanFormatter` / `JsonFormatter` - Trace rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod trace;

pub use trace::{
    HumanFormatter, JsonFormatter, TraceBuffer, TraceEvent, TraceFormatter, TraceOutput,
    TraceRecord, TraceSummary, Tracer, TracerConfig,
};
