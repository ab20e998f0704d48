//! In-place product upgrade engine.
//!
//! This crate implements the engine that decides which upgrade modules apply
//! to an installed product and executes them in order, isolating every
//! failure so one module never aborts the run. The architecture enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (version gating, the predicate
//!   comparator, outcome records). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (property files, XML queries,
//!   predicate evaluation, log sinks). Isolated to enable tempdir fixtures
//!   in tests.
//!
//! Orchestration modules ([`select`], [`execute`], [`report`]) coordinate
//! core logic with I/O to implement the CLI commands. The migration content
//! itself lives behind two seams: [`plugins::Plugin`] and
//! [`execute::transform::Transformer`].

pub mod core;
pub mod execute;
pub mod io;
pub mod logging;
pub mod manifest;
pub mod plugins;
pub mod report;
pub mod select;
