//! Measurement store: per-metric runtime state.
//!
//! Each use case's `MeasurementState` lives in its own `DashMap` entry; every
//! mutation happens under that entry's lock, so a start and the matching end
//! for the same metric are always applied in order even on a multi-threaded
//! runtime.

mod state;

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use usemon_core::Cadence;

pub use state::{Entry, MeasurementState, SentAmounts, StartOutcome};

#[derive(Default)]
pub struct MeasurementStore {
    states: DashMap<String, MeasurementState>,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    /// Lazily create the state for `name`.
    pub fn ensure(&self, name: &str) -> RefMut<'_, String, MeasurementState> {
        if let Some(state) = self.states.get_mut(name) {
            return state;
        }
        self.states.entry(name.to_string()).or_insert_with(MeasurementState::default)
    }

    /// Copy of the current state, if the metric has been touched.
    pub fn get(&self, name: &str) -> Option<MeasurementState> {
        self.states.get(name).map(|s| s.value().clone())
    }

    pub fn get_mut(&self, name: &str) -> Option<RefMut<'_, String, MeasurementState>> {
        self.states.get_mut(name)
    }

    /// Subtract what a confirmed send carried.
    ///
    /// Accumulators (`total`, `resolved_requests`) and completed entries are
    /// only touched when the tick's cadence covers the metric's cadence.
    /// Registered event gauges are resynced no matter which cadence confirmed
    /// them, unless an `immediate` event arrived after the snapshot was taken.
    pub fn reset(&self, name: &str, tick: Cadence, sent: &SentAmounts) {
        let Some(mut state) = self.states.get_mut(name) else {
            return;
        };
        if tick.includes(sent.cadence) {
            state.drain_sent(sent);
        }
        if state.registered {
            state.drain_registered(sent);
        }
        state.reset_seq = state.reset_seq.max(sent.seq);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
