//! Trace output formatters.
//!
//! A record renders as one line of human-readable text or one JSON object.

use std::fmt::Write;

use minicpu_foundation::Register;

use super::record::{TraceEvent, TraceRecord};

/// Renders a trace record as a single line.
pub trait TraceFormatter {
    /// Formats one record.
    fn format(&self, record: &TraceRecord) -> String;
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Column-aligned text, prefixed with the step number.
///
/// ```text
/// S0002    1  add A, 3             -> 2    A=8 B=0 C=0 D=-1 flags=-L- sp=0
/// S0003    2  OUT 8
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    /// Creates a human formatter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let body = match &record.event {
            TraceEvent::Step {
                pc,
                instruction,
                next,
                registers,
                flags,
                stack_depth,
            } => {
                let next = next.map_or_else(|| "-".to_string(), |n| n.to_string());
                let mut regs = String::new();
                for reg in Register::ALL {
                    let _ = write!(regs, "{reg}={} ", registers[reg.index()]);
                }
                format!("{pc:>4}  {instruction:<20} -> {next:<4} {regs}flags={flags} sp={stack_depth}")
            }
            TraceEvent::Output { pc, line } => format!("{pc:>4}  OUT {line}"),
            TraceEvent::Halt { pc, reason } => format!("{pc:>4}  HALT ({reason})"),
            TraceEvent::Fault { pc, message } => format!("{pc:>4}  FAULT {message}"),
        };
        format!("S{:04} {body}", record.step)
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// One JSON object per record, for `--trace-json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Creates a JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn escape_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(out, "\\u{:04x}", u32::from(c));
                }
                c => out.push(c),
            }
        }
        out
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let fields = match &record.event {
            TraceEvent::Step {
                pc,
                instruction,
                next,
                registers,
                flags,
                stack_depth,
            } => {
                let next = next.map_or_else(|| "null".to_string(), |n| n.to_string());
                let regs: Vec<_> = registers.iter().map(ToString::to_string).collect();
                format!(
                    "\"pc\":{pc},\"instruction\":\"{}\",\"next\":{next},\"registers\":[{}],\
                     \"flags\":{{\"equal\":{},\"less\":{},\"greater\":{}}},\"stack_depth\":{stack_depth}",
                    Self::escape_string(instruction),
                    regs.join(","),
                    flags.equal,
                    flags.less,
                    flags.greater,
                )
            }
            TraceEvent::Output { pc, line } => {
                format!("\"pc\":{pc},\"line\":\"{}\"", Self::escape_string(line))
            }
            TraceEvent::Halt { pc, reason } => format!("\"pc\":{pc},\"reason\":\"{reason}\""),
            TraceEvent::Fault { pc, message } => {
                format!("\"pc\":{pc},\"message\":\"{}\"", Self::escape_string(message))
            }
        };

        format!(
            "{{\"id\":{},\"step\":{},\"timestamp_ns\":{},\"type\":\"{}\",{fields}}}",
            record.id,
            record.step,
            record.timestamp_ns,
            record.event_type()
        )
    }
}
