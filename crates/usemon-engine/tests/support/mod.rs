//! Shared fixtures: a recording adapter and a small config.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use usemon_core::error::{Result, UsemonError};
use usemon_core::DataPoint;
use usemon_engine::config::{self, MonitoringSection};
use usemon_engine::dispatch::Adapter;
use usemon_engine::Monitor;

pub const CONFIG: &str = r#"
version: 1
monitoring:
  step: 60
  adapter:
    kind: log
    host: web-01
  metrics:
    render:
      key: app.render.avg
      operation: average
      secondaryKey: app.render.count
    websocketConnections:
      key: app.ws.active
      operation: count
      step: 10
    cacheFlush:
      key: app.cache.flush
      operation: count
      immediate: true
    jobsDone:
      key: app.jobs.done
      operation: resolvedRequests
    legacy:
      key: app.legacy
      operation: average
      disabled: true
"#;

pub fn section() -> MonitoringSection {
    config::load_from_str(CONFIG).unwrap().monitoring.unwrap()
}

/// Records every batch; fails on demand; optionally waits for a permit per call.
#[derive(Default)]
pub struct RecordingAdapter {
    batches: Mutex<Vec<Vec<DataPoint>>>,
    fail: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every send blocks until `release` hands out a permit.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        })
    }

    pub fn release(&self, sends: usize) {
        if let Some(g) = &self.gate {
            g.add_permits(sends);
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<DataPoint>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn last(&self) -> Vec<(String, f64)> {
        self.batches()
            .last()
            .map(|b| b.iter().map(|p| (p.key.clone(), p.value)).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_batch(&self, points: &[DataPoint]) -> Result<()> {
        if let Some(g) = &self.gate {
            g.acquire()
                .await
                .map_err(|e| UsemonError::Dispatch(e.to_string()))?
                .forget();
        }
        self.batches.lock().unwrap().push(points.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            Err(UsemonError::Dispatch("backend unavailable".into()))
        } else {
            Ok(())
        }
    }
}

pub fn start(adapter: &Arc<RecordingAdapter>) -> Monitor {
    let adapter: Arc<dyn Adapter> = Arc::clone(adapter) as Arc<dyn Adapter>;
    Monitor::start(&section(), adapter).unwrap()
}

pub fn pairs(points: &[(&str, f64)]) -> Vec<(String, f64)> {
    points.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}
