//! Integration tests for Layer 1: Language
//!
//! Tests for the decoder, the executor, and whole programs.

mod decoder;
mod properties;
mod programs;
