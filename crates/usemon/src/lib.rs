//! Top-level facade crate for usemon.
//!
//! Re-exports core types and the engine so users can depend on a single crate.

pub mod core {
    pub use usemon_core::*;
}

pub mod engine {
    pub use usemon_engine::*;
}

pub use usemon_engine::Monitor;
