use std::sync::atomic::Ordering;

use tokio::time::Instant;

use usemon_core::error::{Result, UsemonError};
use usemon_core::Cadence;

use super::{Monitor, MonitorInner};

impl Monitor {
    /// Stop the timers, send one final snapshot of every metric, and wait for
    /// all in-flight sends (including ones started earlier) to settle.
    ///
    /// The result reflects the final send only; earlier failures were already
    /// logged when they happened. Concurrent or repeated calls all wait for
    /// the same final send and return its outcome.
    pub async fn close(&self) -> Result<()> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        if inner.closing.swap(true, Ordering::SeqCst) {
            tracing::debug!("close called again; waiting for the final flush");
        }
        inner.closed.get_or_init(|| final_flush(inner)).await.clone()
    }
}

async fn final_flush(inner: &MonitorInner) -> Result<()> {
    inner.stats.set_closing();
    inner.scheduler.stop().await;

    let snapshot = inner.aggregator.compose(Cadence::All, Instant::now());
    let points = snapshot.points.len();
    let outcome = match inner.dispatcher.send(snapshot) {
        Some(handle) => match handle.await {
            Ok(res) => res,
            Err(e) => Err(UsemonError::Internal(format!("final send task failed: {e}"))),
        },
        None => Ok(()),
    };

    inner.dispatcher.wait_idle().await;

    match &outcome {
        Ok(()) => tracing::info!(points, "monitoring closed"),
        Err(e) => tracing::error!(points, error = %e, "monitoring closed; final flush failed"),
    }
    outcome
}
