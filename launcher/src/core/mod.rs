//! Deterministic, pure logic shared by both workflows.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (settings text, options, log lines) and return deterministic outputs
//! suitable for tests.

pub mod command;
pub mod marker;
pub mod settings;
