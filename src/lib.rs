//! Segue – an embeddable interpreter for data-driven action sequences
//!
//! This crate executes named lists of opaque action records with:
//! - A step cursor per run and an explicit continuation protocol: each action
//!   decides whether, and when, the next step runs
//! - Manual suspension: an action may hold onto the run handle and resume the
//!   sequence from a timer or any other callback, minutes later
//! - Conditional branching with absolute and relative jump targets
//! - A three-tier variable store (per-run, per-entity, process-global)
//! - A pluggable action registry populated from loadable action units
//! - Per-step failure isolation: a failing step is reported and its run
//!   stalls without affecting other runs
//!
//! The engine is a library component: hosts embed it, install action units,
//! load sequence definitions, and fire runs from their own event sources.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Built-in action units covering logging, variables, branching, and timing
pub mod actions;
/// Sequence definitions and the JSON definition loader
pub mod defs;
/// Engine core: cursor protocol, variable store, registry, failure reporting
pub mod engine;
/// Expression evaluation seam and the sandboxed template evaluator
pub mod eval;

// Re-export key types for convenience
pub use engine::{Engine, EngineBuilder, EngineConfig};

/// Current version of the segue engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
