//! Shared domain model for the `sfcheck` harness.
//!
//! Everything in here is read-only once loaded: the inventory describes
//! which machine plays which role, the facts describe what provisioning
//! created, and the config describes how the run should behave.

pub mod config;
pub mod error;
pub mod facts;
pub mod inventory;
pub mod network;

#[doc(hidden)]
pub use tracing as __tracing;

/// Logs a positive outcome. The CLI formatter renders these with their own
/// marker, separate from plain `info!` lines.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "sfcheck::success", $($arg)*)
    };
}
