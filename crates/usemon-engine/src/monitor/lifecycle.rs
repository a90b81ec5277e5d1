//! Caller-facing lifecycle calls.
//!
//! Instrumentation must never break the instrumented operation: every failure
//! is logged here and returned as a value the caller is free to ignore.

use std::sync::atomic::Ordering;

use tokio::time::Instant;

use usemon_core::error::{Result, UsemonError};

use super::{Monitor, MonitorInner};
use crate::store::StartOutcome;
use crate::table::{MetricDefinition, MetricKind};

fn new_measurement_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl MonitorInner {
    fn definition(&self, name: &str) -> Result<&MetricDefinition> {
        if self.closing.load(Ordering::Relaxed) {
            tracing::debug!(metric = %name, "lifecycle call after close; may not be flushed");
        }
        self.table.active(name).map_err(|e| {
            tracing::error!(metric = %name, "there is no measurement configuration available");
            self.stats.lifecycle_rejections.inc(&[("reason", "unknown_metric")]);
            e
        })
    }
}

impl Monitor {
    /// Open a measurement for use case `name`. A fresh id is generated when
    /// `id` is `None`. Returns the id to pass to `end_measurement`.
    pub fn start_measurement(&self, name: &str, id: Option<&str>) -> Result<String> {
        let Some(inner) = &self.inner else {
            return Ok(id.map(str::to_owned).unwrap_or_else(new_measurement_id));
        };
        let def = inner.definition(name)?;

        let id = match id {
            Some(id) => id.to_string(),
            None => {
                let id = new_measurement_id();
                tracing::debug!(metric = %name, %id, "no id specified for the measurement, generating one");
                id
            }
        };

        let outcome = inner.store.ensure(name).start(&def.kind, &id, Instant::now());
        if outcome == StartOutcome::Restarted {
            tracing::warn!(metric = %name, %id, "measurement restarted while still open");
        }
        Ok(id)
    }

    /// Close measurement `id` of use case `name`. A second end for the same
    /// id is a no-op.
    pub fn end_measurement(&self, name: &str, id: &str) -> Result<()> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        let def = inner.definition(name)?;

        let res = match inner.store.get_mut(name) {
            Some(mut state) => state.end(name, &def.kind, id, Instant::now()).map(|_| ()),
            None => Err(UsemonError::NoOpenMeasurement {
                key: name.to_string(),
                id: id.to_string(),
            }),
        };

        if let Err(e) = &res {
            tracing::warn!(metric = %name, %id, error = %e, "end without open measurement ignored");
            inner
                .stats
                .lifecycle_rejections
                .inc(&[("reason", "no_open_measurement")]);
        }
        res
    }

    /// Record a one-off event on a `count` use case.
    pub fn register_event(&self, name: &str) -> Result<()> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        let def = inner.definition(name)?;

        match &def.kind {
            MetricKind::Count { immediate } => {
                inner.store.ensure(name).register(*immediate, Instant::now());
                Ok(())
            }
            other => {
                tracing::warn!(metric = %name, operation = other.operation(), "events are only recorded for count metrics");
                inner
                    .stats
                    .lifecycle_rejections
                    .inc(&[("reason", "operation_mismatch")]);
                Err(UsemonError::OperationMismatch {
                    key: name.to_string(),
                    operation: other.operation(),
                    call: "register_event",
                })
            }
        }
    }
}
