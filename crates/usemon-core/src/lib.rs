//! usemon core: transport-agnostic metric primitives, error types, and the
//! batch codec.
//!
//! This crate defines the data points handed to monitoring adapters, the flush
//! cadence vocabulary, and the error surface shared by the engine and adapter
//! implementations. It carries no runtime dependencies so adapters can be
//! written against it without pulling in tokio.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Instrumentation must never take down the host process, so every fallible
//! path surfaces as `UsemonError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, Result, UsemonError};
pub use protocol::{Cadence, DataPoint};
