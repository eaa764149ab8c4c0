//! Core types shared by every MiniCPU layer.
//!
//! This crate provides:
//! - [`Word`] - The machine's signed integer type
//! - [`Address`] - Instruction indices
//! - [`Register`] - The closed register set `A`..`D`
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod register;

pub use error::{Error, ErrorContext, ErrorKind};
pub use register::{Address, Register, Word};

/// Result alias used throughout MiniCPU.
pub type Result<T> = std::result::Result<T, Error>;
