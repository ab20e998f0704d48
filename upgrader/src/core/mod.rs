//! Deterministic, pure logic shared by the upgrade engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod compare;
pub mod gate;
pub mod outcome;
pub mod version;
