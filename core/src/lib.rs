//! Scenario rendering, remote execution and the sequential runner.
//!
//! High-level callers should only need [`runner::Harness`], an executor from
//! [`transport`], and the ids in [`scenario::ScenarioId`].

pub mod runner;
pub mod scenario;
pub mod template;
pub mod transport;

pub use runner::{Harness, HarnessError, RunReport, Verdict};
pub use scenario::ScenarioId;
