//! Instruction set, lexer, decoder, and fetch-execute VM for MiniCPU.
//!
//! This crate provides:
//! - `Lexer` - Tokenization of MiniCPU assembly
//! - `Decoder` - Decoding tokens into a `Program`
//! - `Vm` - Register/stack machine that executes a `Program`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decoder;
pub mod instruction;
pub mod lexer;
pub mod program;
pub mod token;
pub mod vm;


pub use decoder::{Decoder, decode};
pub use instruction::{Condition, Instruction, Operand, PrintArg};
pub use lexer::Lexer;
pub use program::{LabelMap, Program};
pub use token::{Span, Token, TokenKind};
pub use vm::{
    DEFAULT_STACK_CAPACITY, Flags, Halt, MachineState, NoObserver, NullSink, OutputSink, Snapshot,
    Status, StepObserver, Transition, Vm, VmConfig, WriterSink, execute, run_program,
};

use minicpu_foundation::Result;

/// Decodes and runs source text, returning everything it printed.
///
/// # Errors
/// Returns a decode error or the first execution fault.
pub fn eval(source: &str) -> Result<Vec<String>> {
    let program = decode(source)?;
    run_program(&program).map(|(_, out)| out)
}
