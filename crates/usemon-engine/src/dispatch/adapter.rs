use async_trait::async_trait;

use usemon_core::error::Result;
use usemon_core::DataPoint;

/// Delivery collaborator for a monitoring backend.
///
/// Implementations own transport, authentication, and timeouts. The engine only
/// needs the call to resolve eventually; any `Err` is treated as a failed
/// delivery and the batch's data is kept for the next flush.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send_batch(&self, points: &[DataPoint]) -> Result<()>;
}
