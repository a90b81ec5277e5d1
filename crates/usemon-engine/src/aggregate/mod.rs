//! Aggregator: turns measurement state into outgoing data points.

mod compose;

pub use compose::{Aggregator, Snapshot};
