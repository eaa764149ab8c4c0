//! MiniCPU - A four-register virtual CPU
//!
//! This crate re-exports all layers of the MiniCPU system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: minicpu_runtime    - REPL, CLI, batch runner, snapshot files
//! Layer 2: minicpu_debug      - Execution tracing
//! Layer 1: minicpu_language   - Instruction set, lexer, decoder, VM
//! Layer 0: minicpu_foundation - Core types (Word, Register, Error)
//! ```

pub use minicpu_debug as debug;
pub use minicpu_foundation as foundation;
pub use minicpu_language as language;
pub use minicpu_runtime as runtime;
