//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: registers, words, and errors.
