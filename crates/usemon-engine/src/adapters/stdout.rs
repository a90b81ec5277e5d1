use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use usemon_core::error::{Result, UsemonError};
use usemon_core::protocol::batch::encode_lines;
use usemon_core::DataPoint;

use crate::dispatch::Adapter;

/// Writes each batch to stdout as JSON lines, one point per line.
#[derive(Default)]
pub struct StdoutAdapter;

impl StdoutAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Adapter for StdoutAdapter {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn send_batch(&self, points: &[DataPoint]) -> Result<()> {
        let body = encode_lines(points)?;
        let mut out = tokio::io::stdout();
        out.write_all(body.as_bytes())
            .await
            .map_err(|e| UsemonError::Dispatch(format!("stdout write failed: {e}")))?;
        out.flush()
            .await
            .map_err(|e| UsemonError::Dispatch(format!("stdout flush failed: {e}")))
    }
}
