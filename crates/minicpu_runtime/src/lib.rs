//! REPL, CLI, and snapshot serialization for MiniCPU.
//!
//! This crate provides:
//! - [`Repl`] - Interactive read-eval-print loop over a program buffer
//! - [`runner`] - Batch execution of assembly files under a step budget
//! - Machine snapshot serialization (`MessagePack`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
mod highlight;
pub mod repl;
pub mod runner;
pub mod serialize;
pub mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::{Repl, Reply};
pub use runner::{RunOptions, RunReport, run, run_file, run_source};
pub use serialize::{StateDump, from_bytes, load_from_file, save_to_file, to_bytes};
pub use session::{DEFAULT_REPL_STEP_LIMIT, Session, StepReport};
