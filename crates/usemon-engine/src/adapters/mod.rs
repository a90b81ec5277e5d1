//! Built-in adapters, selected by `monitoring.adapter.kind`.

mod log;
mod stdout;

use std::sync::Arc;

pub use log::LogAdapter;
pub use stdout::StdoutAdapter;

use crate::config::{AdapterKind, AdapterSection};
use crate::dispatch::Adapter;

pub fn build_adapter(section: &AdapterSection) -> Arc<dyn Adapter> {
    match section.kind {
        AdapterKind::Log => Arc::new(LogAdapter::new()),
        AdapterKind::Stdout => Arc::new(StdoutAdapter::new()),
    }
}
