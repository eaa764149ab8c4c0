//! Error types for the MiniCPU system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Decode errors, execution faults, and host failures share one [`Error`]
//! type so every layer can propagate with `?`.

use std::fmt;

use thiserror::Error;

use crate::register::{Address, Word};

/// The main error type for MiniCPU operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Records the source name, keeping any context already attached.
    #[must_use]
    pub fn in_source(mut self, source: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_source(source));
        self
    }

    /// Creates a parse error at the given source position.
    #[must_use]
    pub fn parse(message: impl Into<String>, line: u32, column: u32, context: &str) -> Self {
        Self::new(ErrorKind::Parse {
            message: message.into(),
            line,
            column,
            context: context.to_string(),
        })
    }

    /// Creates an empty-stack fault.
    #[must_use]
    pub fn stack_underflow() -> Self {
        Self::new(ErrorKind::StackUnderflow)
    }

    /// Creates a full-stack fault.
    #[must_use]
    pub fn stack_overflow(capacity: usize) -> Self {
        Self::new(ErrorKind::StackOverflow { capacity })
    }

    /// Creates a fault for a call to a function that was never declared.
    #[must_use]
    pub fn unresolved_label(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedLabel(name.into()))
    }

    /// Creates an arithmetic overflow fault.
    #[must_use]
    pub fn overflow(op: &'static str, lhs: Word, rhs: Word) -> Self {
        Self::new(ErrorKind::ArithmeticOverflow { op, lhs, rhs })
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io(message.into()))
    }

    /// Creates a host command error.
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Command(message.into()))
    }

    /// Returns true if this error is a machine fault raised during execution.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        self.kind.is_fault()
    }

    /// Returns the program counter the error was raised at, if known.
    #[must_use]
    pub fn pc(&self) -> Option<Address> {
        self.context.as_ref().and_then(|ctx| ctx.pc)
    }

    /// Formats the error together with its context, for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.context {
            Some(ctx) => {
                let ctx = ctx.to_string();
                if ctx.is_empty() {
                    self.kind.to_string()
                } else {
                    format!("{} {ctx}", self.kind)
                }
            }
            None => self.kind.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed source text.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// Opcode is not part of the instruction set.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),

    /// Operand has the wrong shape for its position.
    #[error("invalid operand {operand:?}: expected {expected}")]
    InvalidOperand {
        /// The operand text as written.
        operand: String,
        /// Description of what was expected.
        expected: &'static str,
    },

    /// Wrong number of operands for an opcode.
    #[error("arity mismatch for {opcode}: expected {expected} operand(s), got {actual}")]
    ArityMismatch {
        /// The opcode mnemonic.
        opcode: String,
        /// Number of operands the opcode takes.
        expected: usize,
        /// Number of operands supplied.
        actual: usize,
    },

    /// A function name was declared more than once.
    #[error("duplicate function label: {0}")]
    DuplicateLabel(String),

    /// Jump operand does not name a usable source line.
    #[error("invalid jump target: {0}")]
    InvalidJumpTarget(String),

    /// `pop` or `ret` ran with nothing on the stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// A push would exceed the configured stack capacity.
    #[error("stack overflow (capacity {capacity})")]
    StackOverflow {
        /// The configured capacity.
        capacity: usize,
    },

    /// `call` named a function absent from the label map.
    #[error("unresolved label: {0}")]
    UnresolvedLabel(String),

    /// `ret` popped a word that cannot be an instruction address.
    #[error("invalid return address: {0}")]
    InvalidReturnAddress(Word),

    /// `add` or `sub` result does not fit in a word.
    #[error("arithmetic overflow: {lhs} {op} {rhs}")]
    ArithmeticOverflow {
        /// The operator symbol.
        op: &'static str,
        /// Left-hand operand.
        lhs: Word,
        /// Right-hand operand.
        rhs: Word,
    },

    /// I/O failure (files, output sinks, terminal).
    #[error("io error: {0}")]
    Io(String),

    /// Snapshot encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A host command was malformed or unknown.
    #[error("command error: {0}")]
    Command(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns true for the fatal execution-time faults.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::StackUnderflow
                | Self::StackOverflow { .. }
                | Self::UnresolvedLabel(_)
                | Self::InvalidReturnAddress(_)
                | Self::ArithmeticOverflow { .. }
        )
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file name.
    pub source: Option<String>,
    /// Line number in source (1-indexed).
    pub line: Option<usize>,
    /// Column number in source (1-indexed).
    pub column: Option<usize>,
    /// Program counter of the faulting instruction.
    pub pc: Option<Address>,
    /// Rendered instruction that faulted.
    pub instruction: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Sets the line only.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the program counter.
    #[must_use]
    pub fn with_pc(mut self, pc: Address) -> Self {
        self.pc = Some(pc);
        self
    }

    /// Sets the rendered instruction.
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(pc) = self.pc {
            parts.push(format!("pc {pc}"));
        }
        if let Some(instruction) = &self.instruction {
            parts.push(format!("`{instruction}`"));
        }
        match (&self.source, self.line, self.column) {
            (Some(source), Some(line), Some(col)) => parts.push(format!("{source}:{line}:{col}")),
            (Some(source), Some(line), None) => parts.push(format!("{source}:{line}")),
            (Some(source), None, _) => parts.push(source.clone()),
            (None, Some(line), _) => parts.push(format!("line {line}")),
            (None, None, _) => {}
        }
        if parts.is_empty() {
            Ok(())
        } else {
            write!(f, "at {}", parts.join(", "))
        }
    }
}
