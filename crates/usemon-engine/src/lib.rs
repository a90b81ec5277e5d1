//! usemon engine library entry.
//!
//! This crate wires the config loader, metric table, measurement store,
//! aggregator, dispatcher, and flush scheduler into a single `Monitor`
//! handle. It is consumed by the `usemon` binary, by host applications that
//! instrument their own use cases, and by integration tests.

pub mod adapters;
pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod monitor;
pub mod obs;
pub mod schedule;
pub mod store;
pub mod table;

pub use monitor::Monitor;
