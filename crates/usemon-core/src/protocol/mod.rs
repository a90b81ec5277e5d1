//! Protocol modules shared with adapters.
//!
//! - `point`: the `DataPoint` handed to monitoring backends.
//! - `cadence`: flush cadence vocabulary (default, per-metric, shutdown).
//! - `batch`: JSON batch codec for adapters that ship points as text.
//!
//! The codec is panic-free: malformed input is reported as `UsemonError`.

pub mod batch;
pub mod cadence;
pub mod point;

pub use cadence::Cadence;
pub use point::DataPoint;
