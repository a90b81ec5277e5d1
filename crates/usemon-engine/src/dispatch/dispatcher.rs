use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use usemon_core::error::{Result, UsemonError};
use usemon_core::Cadence;

use crate::aggregate::Snapshot;
use crate::dispatch::Adapter;
use crate::obs::EngineStats;
use crate::store::MeasurementStore;

/// Ships snapshots through the adapter and settles the store afterwards.
///
/// At most one send per cadence is outstanding; a tick that finds its cadence
/// busy is skipped and its data simply stays accumulated.
pub struct Dispatcher {
    adapter: Arc<dyn Adapter>,
    store: Arc<MeasurementStore>,
    stats: Arc<EngineStats>,
    /// Cadence -> compose time of the outstanding batch.
    pending: DashMap<Cadence, Instant>,
    in_flight: watch::Sender<usize>,
}

/// Held by a spawned send; releases the cadence slot when dropped, even if
/// the adapter future panics.
struct InFlight {
    dispatcher: Arc<Dispatcher>,
    cadence: Cadence,
}

impl InFlight {
    fn enter(dispatcher: Arc<Dispatcher>, cadence: Cadence) -> Self {
        dispatcher.in_flight.send_modify(|n| *n += 1);
        dispatcher.stats.sends_in_flight.inc();
        Self { dispatcher, cadence }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.dispatcher.pending.remove(&self.cadence);
        self.dispatcher.stats.sends_in_flight.dec();
        self.dispatcher.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Dispatcher {
    pub fn new(adapter: Arc<dyn Adapter>, store: Arc<MeasurementStore>, stats: Arc<EngineStats>) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            adapter,
            store,
            stats,
            pending: DashMap::new(),
            in_flight,
        }
    }

    /// Submit a snapshot. Returns `None` when nothing was submitted (empty
    /// snapshot, or a send for the same cadence is still pending).
    pub fn send(self: &Arc<Self>, snapshot: Snapshot) -> Option<JoinHandle<Result<()>>> {
        let cadence = snapshot.cadence;
        if snapshot.is_empty() {
            tracing::trace!(%cadence, "nothing to send");
            return None;
        }

        match self.pending.entry(cadence) {
            Entry::Occupied(busy) => {
                tracing::debug!(
                    %cadence,
                    pending_for_ms = u64::try_from(busy.get().elapsed().as_millis()).unwrap_or(u64::MAX),
                    "previous send still pending; keeping data for next tick"
                );
                self.stats.dispatches.inc(&[("outcome", "skipped")]);
                return None;
            }
            Entry::Vacant(slot) => {
                slot.insert(snapshot.taken_at);
            }
        }

        let guard = InFlight::enter(Arc::clone(self), cadence);
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _guard = guard;
            this.deliver(snapshot).await
        }))
    }

    /// Submit and wait for the outcome. `Ok(n)` is the number of points
    /// delivered (0 when nothing was submitted).
    pub async fn send_and_wait(self: &Arc<Self>, snapshot: Snapshot) -> Result<usize> {
        let n = snapshot.points.len();
        match self.send(snapshot) {
            Some(handle) => handle
                .await
                .map_err(|e| UsemonError::Internal(format!("send task failed: {e}")))?
                .map(|()| n),
            None => Ok(0),
        }
    }

    async fn deliver(&self, snapshot: Snapshot) -> Result<()> {
        let cadence = snapshot.cadence;
        let points = snapshot.points.len();
        let started = Instant::now();

        let res = self.adapter.send_batch(&snapshot.points).await;

        let outcome = if res.is_ok() { "ok" } else { "failed" };
        self.stats.dispatches.inc(&[("outcome", outcome)]);
        self.stats
            .dispatch_duration
            .observe(&[("outcome", outcome)], started.elapsed());

        match res {
            Ok(()) => {
                for (name, sent) in &snapshot.sent {
                    self.store.reset(name, cadence, sent);
                }
                let label = cadence.to_string();
                self.stats
                    .points_sent
                    .add(&[("cadence", label.as_str())], points as u64);
                tracing::debug!(adapter = self.adapter.name(), %cadence, points, "batch delivered");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    adapter = self.adapter.name(),
                    %cadence,
                    points,
                    error = %e,
                    "failed to send data, not resetting values"
                );
                Err(match e {
                    UsemonError::Dispatch(_) => e,
                    other => UsemonError::Dispatch(other.to_string()),
                })
            }
        }
    }

    /// Resolve once no send is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.in_flight.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}
