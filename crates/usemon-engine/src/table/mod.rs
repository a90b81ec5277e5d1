//! Metric definition table.
//!
//! Validated, immutable view of `monitoring.metrics`: one definition per use
//! case, each carrying only the fields its operation needs.

mod definition;

pub use definition::{MetricDefinition, MetricKind, MetricTable};
