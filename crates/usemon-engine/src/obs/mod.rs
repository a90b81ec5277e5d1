//! Engine self-telemetry.
//!
//! Counters about the engine's own behaviour (dispatch outcomes, rejected
//! lifecycle calls, in-flight sends) rendered in Prometheus text format by
//! `Monitor::render_stats`.

pub mod metrics;

pub use metrics::EngineStats;
