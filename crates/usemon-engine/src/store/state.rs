use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use usemon_core::error::{Result, UsemonError};
use usemon_core::Cadence;

use crate::table::MetricKind;

/// One measurement id's record.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    /// Set while the measurement is open.
    pub started_at: Option<Instant>,
    /// Elapsed time of every completed run of this id (timed metrics only).
    pub durations: Vec<Duration>,
}

impl Entry {
    pub fn is_open(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Result of `start` for a given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Opened,
    /// A closed entry was opened again; its history is kept.
    Reopened,
    /// The id was already open; only the start time moved.
    Restarted,
}

/// Mutable runtime state of one metric.
#[derive(Debug, Clone, Default)]
pub struct MeasurementState {
    /// Accumulated milliseconds for timed metrics, current level for `number`.
    pub total: f64,
    pub resolved_requests: u64,
    pub active_requests: u64,
    pub entries: HashMap<String, Entry>,
    /// Gauge fed by `register_event` rather than start/end pairs.
    pub registered: bool,
    /// Latest start, end, or event.
    pub last_activity: Option<Instant>,
    /// Latest compose that looked at this metric.
    pub last_flush_at: Option<Instant>,
    /// Bumped on every mutation.
    pub activity_seq: u64,
    /// `activity_seq` of the latest `immediate` event.
    pub pinned_seq: u64,
    /// `activity_seq` covered by the last confirmed send.
    pub reset_seq: u64,
}

/// Amounts a snapshot carried for one metric; subtracted on confirmed send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentAmounts {
    /// Cadence the metric is flushed on.
    pub cadence: Cadence,
    pub total: f64,
    pub resolved: u64,
    /// Registered gauge value that was reported.
    pub active: u64,
    /// Completed entries folded into `total`.
    pub closed_ids: Vec<String>,
    /// `activity_seq` at compose time.
    pub seq: u64,
}

impl MeasurementState {
    fn touch(&mut self, now: Instant) {
        self.last_activity = Some(now);
        self.activity_seq += 1;
    }

    /// Open (or restart) measurement `id`.
    pub fn start(&mut self, kind: &MetricKind, id: &str, now: Instant) -> StartOutcome {
        let outcome = match self.entries.get_mut(id) {
            Some(e) if e.is_open() => {
                e.started_at = Some(now);
                StartOutcome::Restarted
            }
            Some(e) => {
                e.started_at = Some(now);
                StartOutcome::Reopened
            }
            None => {
                self.entries.insert(
                    id.to_string(),
                    Entry {
                        started_at: Some(now),
                        durations: Vec::new(),
                    },
                );
                StartOutcome::Opened
            }
        };

        if outcome != StartOutcome::Restarted {
            self.active_requests += 1;
            if matches!(kind, MetricKind::Number) {
                self.total += 1.0;
            }
        }
        self.touch(now);
        outcome
    }

    /// Close measurement `id`. Returns the elapsed time for timed metrics.
    pub fn end(&mut self, name: &str, kind: &MetricKind, id: &str, now: Instant) -> Result<Option<Duration>> {
        let started = self
            .entries
            .get(id)
            .and_then(|e| e.started_at)
            .ok_or_else(|| UsemonError::NoOpenMeasurement {
                key: name.to_string(),
                id: id.to_string(),
            })?;

        let elapsed = if kind.is_timed() {
            let elapsed = now.saturating_duration_since(started);
            if let Some(e) = self.entries.get_mut(id) {
                e.started_at = None;
                e.durations.push(elapsed);
            }
            self.total += elapsed.as_micros() as f64 / 1000.0;
            Some(elapsed)
        } else {
            self.entries.remove(id);
            None
        };

        if matches!(kind, MetricKind::Number) {
            self.total = (self.total - 1.0).max(0.0);
        }
        self.resolved_requests += 1;
        self.active_requests = self.active_requests.saturating_sub(1);
        self.touch(now);
        Ok(elapsed)
    }

    /// Record a one-off event on a `count` metric.
    pub fn register(&mut self, immediate: bool, now: Instant) {
        self.registered = true;
        if immediate {
            self.active_requests = 1;
        } else {
            self.active_requests += 1;
        }
        self.touch(now);
        if immediate {
            self.pinned_seq = self.activity_seq;
        }
    }

    /// Whether there was activity inside `window` ending at `now` that no
    /// confirmed send has covered yet.
    pub fn active_within(&self, window: Duration, now: Instant) -> bool {
        let recent = self
            .last_activity
            .map(|t| now.saturating_duration_since(t) <= window)
            .unwrap_or(false);
        recent && self.activity_seq > self.reset_seq
    }

    /// Completed entry ids (their durations are already in `total`).
    pub fn closed_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.is_open())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Lower a registered gauge by what a confirmed send reported. An
    /// `immediate` event newer than the snapshot keeps the gauge pinned at 1.
    pub(super) fn drain_registered(&mut self, sent: &SentAmounts) {
        if self.pinned_seq > sent.seq {
            return;
        }
        self.active_requests = self.active_requests.saturating_sub(sent.active);
    }

    pub(super) fn drain_sent(&mut self, sent: &SentAmounts) {
        self.resolved_requests = self.resolved_requests.saturating_sub(sent.resolved);
        self.total = if self.resolved_requests == 0 && sent.total > 0.0 {
            0.0
        } else {
            (self.total - sent.total).max(0.0)
        };
        for id in &sent.closed_ids {
            if self.entries.get(id).is_some_and(|e| !e.is_open()) {
                self.entries.remove(id);
            }
        }
    }
}
