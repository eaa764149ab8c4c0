//! Trace event and record types.
//!
//! This module defines the events that can be traced during program execution.

use minicpu_foundation::{Address, Register, Word};
use minicpu_language::{Flags, Halt};

// =============================================================================
// Trace Event
// =============================================================================

/// Events that can be traced during program execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// An instruction completed.
    Step {
        /// Address of the instruction.
        pc: Address,
        /// The instruction, rendered.
        instruction: String,
        /// Where execution continues, or `None` if the instruction halted.
        next: Option<Address>,
        /// Register values after the instruction.
        registers: [Word; Register::COUNT],
        /// Flags after the instruction.
        flags: Flags,
        /// Stack depth after the instruction.
        stack_depth: usize,
    },

    /// `prn` emitted a line.
    Output {
        /// Address of the `prn`.
        pc: Address,
        /// The emitted line.
        line: String,
    },

    /// The machine halted.
    Halt {
        /// Program counter at the halt.
        pc: Address,
        /// Why it halted.
        reason: Halt,
    },

    /// An instruction faulted.
    Fault {
        /// Address of the faulting instruction.
        pc: Address,
        /// The fault, rendered.
        message: String,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::Output { .. } => "output",
            Self::Halt { .. } => "halt",
            Self::Fault { .. } => "fault",
        }
    }

    /// Returns the program counter the event happened at.
    #[must_use]
    pub fn pc(&self) -> Address {
        match self {
            Self::Step { pc, .. }
            | Self::Output { pc, .. }
            | Self::Halt { pc, .. }
            | Self::Fault { pc, .. } => *pc,
        }
    }

    /// Returns true if this event ends execution.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Halt { .. } | Self::Fault { .. })
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Unique record ID within the session.
    pub id: u64,
    /// Ordinal of the instruction this event belongs to (1-based).
    pub step: u64,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The trace event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, step: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            step,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

// =============================================================================
// Tests
// =============================================================================
