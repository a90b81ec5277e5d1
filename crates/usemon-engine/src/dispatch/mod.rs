//! Dispatcher module exports.
//!
//! Re-exports the adapter trait and the dispatcher so adapter implementations
//! can depend on this module directly.

pub mod adapter;
pub mod dispatcher;

pub use adapter::Adapter;
pub use dispatcher::Dispatcher;
