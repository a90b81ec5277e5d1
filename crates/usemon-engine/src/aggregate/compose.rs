use std::sync::Arc;

use tokio::time::Instant;

use usemon_core::{Cadence, DataPoint};

use crate::store::{MeasurementStore, SentAmounts};
use crate::table::{MetricKind, MetricTable};

/// Points composed for one flush cycle, plus what each metric contributed.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub cadence: Cadence,
    pub taken_at: Instant,
    pub points: Vec<DataPoint>,
    /// Metrics that emitted at least one point, keyed by use case name.
    pub sent: Vec<(String, SentAmounts)>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub struct Aggregator {
    table: Arc<MetricTable>,
    store: Arc<MeasurementStore>,
    host: Option<String>,
}

impl Aggregator {
    pub fn new(table: Arc<MetricTable>, store: Arc<MeasurementStore>, host: Option<String>) -> Self {
        Self { table, store, host }
    }

    fn point(&self, key: &str, value: f64) -> DataPoint {
        DataPoint::new(key, value).with_host(self.host.as_deref())
    }

    /// Compose the snapshot for `cadence`. `Cadence::All` covers every metric
    /// and reports touched gauges even without recent activity.
    pub fn compose(&self, cadence: Cadence, now: Instant) -> Snapshot {
        let window = cadence.window(self.table.default_step());
        let mut points = Vec::new();
        let mut sent = Vec::new();

        for def in self.table.iter_active().filter(|d| cadence.includes(d.cadence)) {
            let Some(mut state) = self.store.get_mut(&def.name) else {
                continue;
            };

            let before = points.len();
            let resolved = state.resolved_requests;
            let mut amounts = SentAmounts {
                cadence: def.cadence,
                resolved,
                seq: state.activity_seq,
                ..SentAmounts::default()
            };

            match &def.kind {
                MetricKind::Average { secondary_key } => {
                    if resolved > 0 {
                        points.push(self.point(&def.key, state.total / resolved as f64));
                        if let Some(k) = secondary_key {
                            points.push(self.point(k, resolved as f64));
                        }
                        amounts.total = state.total;
                        amounts.closed_ids = state.closed_ids();
                    }
                }
                MetricKind::Time => {
                    if resolved > 0 {
                        points.push(self.point(&def.key, state.total));
                        amounts.total = state.total;
                        amounts.closed_ids = state.closed_ids();
                    }
                }
                MetricKind::Count { .. } => {
                    if cadence == Cadence::All || state.active_within(window, now) {
                        points.push(self.point(&def.key, state.active_requests as f64));
                        if state.registered {
                            amounts.active = state.active_requests;
                        }
                    }
                }
                MetricKind::ResolvedRequests => {
                    if resolved != 0 {
                        points.push(self.point(&def.key, resolved as f64));
                    }
                }
                MetricKind::Number => {
                    points.push(self.point(&def.key, state.total));
                }
            }

            let since_last_flush = state.last_flush_at.map(|t| now.saturating_duration_since(t));
            state.last_flush_at = Some(now);
            if points.len() > before {
                tracing::trace!(
                    metric = %def.name,
                    %cadence,
                    points = points.len() - before,
                    since_last_flush = ?since_last_flush,
                    "metric composed"
                );
                sent.push((def.name.clone(), amounts));
            }
        }

        tracing::debug!(%cadence, points = points.len(), metrics = sent.len(), "composed snapshot");
        Snapshot {
            cadence,
            taken_at: now,
            points,
            sent,
        }
    }
}
