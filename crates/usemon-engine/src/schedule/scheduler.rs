use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use usemon_core::Cadence;

use crate::aggregate::Aggregator;
use crate::dispatch::Dispatcher;
use crate::table::MetricTable;

pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    cadences: Vec<Cadence>,
}

impl Scheduler {
    /// Spawn the timers. Must be called from within a tokio runtime.
    pub fn spawn(table: &MetricTable, aggregator: Arc<Aggregator>, dispatcher: Arc<Dispatcher>) -> Self {
        let (shutdown, _) = watch::channel(false);

        let mut timers = vec![(Cadence::Default, table.default_step())];
        timers.extend(table.custom_intervals().into_iter().map(|s| (Cadence::Every(s), s)));

        let cadences = timers.iter().map(|(c, _)| *c).collect();
        let tasks = timers
            .into_iter()
            .map(|(cadence, secs)| {
                tokio::spawn(run_timer(
                    cadence,
                    Duration::from_secs(secs),
                    Arc::clone(&aggregator),
                    Arc::clone(&dispatcher),
                    shutdown.subscribe(),
                ))
            })
            .collect();

        Self {
            shutdown,
            tasks: Mutex::new(tasks),
            cadences,
        }
    }

    /// Cadences that have a timer.
    pub fn cadences(&self) -> &[Cadence] {
        &self.cadences
    }

    /// Stop every timer and wait for them to exit. Sends already submitted
    /// keep running; the dispatcher tracks those.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);

        let tasks = match self.tasks.lock() {
            Ok(mut g) => std::mem::take(&mut *g),
            // Poisoned lock means a panicking holder; nothing left to join.
            Err(_) => Vec::new(),
        };

        let mut futs: FuturesUnordered<_> = tasks.into_iter().collect();
        while let Some(res) = futs.next().await {
            if let Err(e) = res {
                tracing::warn!(error = %e, "flush timer exited abnormally");
            }
        }
    }
}

async fn run_timer(
    cadence: Cadence,
    period: Duration,
    aggregator: Arc<Aggregator>,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) {
    // First tick one full period after start, not immediately.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::debug!(%cadence, period_secs = period.as_secs(), "flush timer started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = aggregator.compose(cadence, Instant::now());
                // Fire and forget; the dispatcher tracks the send.
                let _ = dispatcher.send(snapshot);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::debug!(%cadence, "flush timer stopped");
}
