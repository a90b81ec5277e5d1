//! Flush scheduler: one timer for the default cadence plus one per distinct
//! per-metric interval.

mod scheduler;

pub use scheduler::Scheduler;
