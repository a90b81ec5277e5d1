//! Monitor: the owning handle for one metrics engine.
//!
//! Wires the metric table, measurement store, aggregator, dispatcher, and
//! scheduler together. Cheap to clone; every clone talks to the same engine.
//! A disabled monitor accepts every call and does nothing.

mod lifecycle;
mod shutdown;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tokio::time::Instant;

use usemon_core::error::{Result, UsemonError};
use usemon_core::Cadence;

use crate::adapters::build_adapter;
use crate::aggregate::Aggregator;
use crate::config::{MonitoringSection, UsemonConfig};
use crate::dispatch::{Adapter, Dispatcher};
use crate::obs::EngineStats;
use crate::schedule::Scheduler;
use crate::store::{MeasurementState, MeasurementStore};
use crate::table::MetricTable;

#[derive(Clone)]
pub struct Monitor {
    inner: Option<Arc<MonitorInner>>,
}

struct MonitorInner {
    table: Arc<MetricTable>,
    store: Arc<MeasurementStore>,
    aggregator: Arc<Aggregator>,
    dispatcher: Arc<Dispatcher>,
    scheduler: Scheduler,
    stats: Arc<EngineStats>,
    closing: AtomicBool,
    /// Outcome of the final flush, shared by every `close()` caller.
    closed: OnceCell<Result<()>>,
}

impl Monitor {
    /// Build from a loaded config using the configured built-in adapter.
    /// An absent or disabled monitoring section yields a disabled monitor.
    pub fn from_config(cfg: &UsemonConfig) -> Result<Self> {
        let Some(section) = cfg.active_monitoring() else {
            tracing::debug!("monitoring module inactive");
            return Ok(Self::disabled());
        };
        // validate() already guarantees the adapter section when enabled
        let adapter = section
            .adapter
            .as_ref()
            .map(build_adapter)
            .ok_or_else(|| UsemonError::Config("monitoring.adapter is required".into()))?;
        Self::start(section, adapter)
    }

    /// Start the engine with an explicit adapter. Spawns the flush timers, so
    /// this must run inside a tokio runtime.
    pub fn start(section: &MonitoringSection, adapter: Arc<dyn Adapter>) -> Result<Self> {
        if section.disabled {
            return Ok(Self::disabled());
        }
        section.validate()?;

        let table = Arc::new(MetricTable::load(section)?);
        let host = section.adapter.as_ref().and_then(|a| a.host.clone());
        let store = Arc::new(MeasurementStore::new());
        let stats = Arc::new(EngineStats::default());

        let aggregator = Arc::new(Aggregator::new(Arc::clone(&table), Arc::clone(&store), host));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&adapter),
            Arc::clone(&store),
            Arc::clone(&stats),
        ));
        let scheduler = Scheduler::spawn(&table, Arc::clone(&aggregator), Arc::clone(&dispatcher));

        tracing::info!(
            metrics = table.iter_active().count(),
            disabled = table.len() - table.iter_active().count(),
            default_step = table.default_step(),
            timers = scheduler.cadences().len(),
            adapter = adapter.name(),
            "monitoring started"
        );

        Ok(Self {
            inner: Some(Arc::new(MonitorInner {
                table,
                store,
                aggregator,
                dispatcher,
                scheduler,
                stats,
                closing: AtomicBool::new(false),
                closed: OnceCell::new(),
            })),
        })
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Run one flush cycle now and wait for it to settle.
    /// Returns the number of points delivered.
    pub async fn flush(&self, cadence: Cadence) -> Result<usize> {
        let Some(inner) = &self.inner else {
            return Ok(0);
        };
        let snapshot = inner.aggregator.compose(cadence, Instant::now());
        inner.dispatcher.send_and_wait(snapshot).await
    }

    /// Resolve once no send is in flight.
    pub async fn wait_idle(&self) {
        if let Some(inner) = &self.inner {
            inner.dispatcher.wait_idle().await;
        }
    }

    /// Copy of a metric's current runtime state.
    pub fn measurement(&self, name: &str) -> Option<MeasurementState> {
        self.inner.as_ref().and_then(|i| i.store.get(name))
    }

    /// Engine self-telemetry in Prometheus text format.
    pub fn render_stats(&self) -> String {
        self.inner
            .as_ref()
            .map(|i| i.stats.render())
            .unwrap_or_default()
    }
}
