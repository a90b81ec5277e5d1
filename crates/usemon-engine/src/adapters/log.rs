use async_trait::async_trait;

use usemon_core::error::Result;
use usemon_core::DataPoint;

use crate::dispatch::Adapter;

/// Writes every batch to the tracing log at `info`. Never fails.
#[derive(Default)]
pub struct LogAdapter;

impl LogAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Adapter for LogAdapter {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send_batch(&self, points: &[DataPoint]) -> Result<()> {
        for p in points {
            tracing::info!(
                target: "usemon::points",
                key = %p.key,
                value = p.value,
                host = p.host.as_deref().unwrap_or(""),
                "data point"
            );
        }
        Ok(())
    }
}
