//! Text protocols spoken by the tools the harness drives remotely.
//!
//! Nothing here talks to a host. These are parsers for what comes back.

pub mod error;
pub mod ping;
pub mod report;

pub use error::ProtocolError;
