use std::collections::{BTreeMap, BTreeSet};

use usemon_core::error::{Result, UsemonError};
use usemon_core::Cadence;

use crate::config::{MetricConfig, MonitoringSection, Operation};

/// Operation-specific shape of a metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricKind {
    /// Mean duration of resolved measurements, optionally with a companion
    /// point carrying the resolved count.
    Average { secondary_key: Option<String> },
    /// Accumulated duration of resolved measurements.
    Time,
    /// Gauge of active work (start/end) or a tally of registered events.
    Count { immediate: bool },
    /// Level raised by start and lowered by end.
    Number,
    /// Number of measurements resolved in the window.
    ResolvedRequests,
}

impl MetricKind {
    fn from_config(op: Operation, m: &MetricConfig) -> Self {
        match op {
            Operation::Average => MetricKind::Average {
                secondary_key: m.secondary_key.clone(),
            },
            Operation::Time => MetricKind::Time,
            Operation::Count => MetricKind::Count {
                immediate: m.immediate,
            },
            Operation::Number => MetricKind::Number,
            Operation::ResolvedRequests => MetricKind::ResolvedRequests,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            MetricKind::Average { .. } => Operation::Average.as_str(),
            MetricKind::Time => Operation::Time.as_str(),
            MetricKind::Count { .. } => Operation::Count.as_str(),
            MetricKind::Number => Operation::Number.as_str(),
            MetricKind::ResolvedRequests => Operation::ResolvedRequests.as_str(),
        }
    }

    /// Whether start/end pairs are timed.
    pub fn is_timed(&self) -> bool {
        matches!(self, MetricKind::Average { .. } | MetricKind::Time)
    }
}

#[derive(Debug, Clone)]
pub struct MetricDefinition {
    /// Use case name (the key under `monitoring.metrics`).
    pub name: String,
    /// Outgoing data point name.
    pub key: String,
    pub kind: MetricKind,
    pub cadence: Cadence,
    pub disabled: bool,
}

/// All configured metrics, disabled ones included so lookups stay total.
#[derive(Debug, Default)]
pub struct MetricTable {
    defs: BTreeMap<String, MetricDefinition>,
    default_step: u64,
}

impl MetricTable {
    /// Build the table, failing on the first incomplete definition.
    pub fn load(section: &MonitoringSection) -> Result<Self> {
        let mut defs = BTreeMap::new();

        for (name, m) in &section.metrics {
            let key = match m.key.as_deref() {
                Some(k) if !k.is_empty() => k.to_string(),
                _ => {
                    return Err(UsemonError::Config(format!(
                        "metric key is missing in use case {name}"
                    )))
                }
            };
            let op = m.operation.ok_or_else(|| {
                UsemonError::Config(format!("operation is missing in use case {name}"))
            })?;

            if m.secondary_key.is_some() && op != Operation::Average {
                tracing::warn!(metric = %name, operation = op.as_str(), "secondaryKey ignored for non-average metric");
            }
            if m.immediate && op != Operation::Count {
                tracing::warn!(metric = %name, operation = op.as_str(), "immediate ignored for non-count metric");
            }

            defs.insert(
                name.clone(),
                MetricDefinition {
                    name: name.clone(),
                    key,
                    kind: MetricKind::from_config(op, m),
                    cadence: Cadence::for_interval(m.step),
                    disabled: m.disabled,
                },
            );
        }

        Ok(Self {
            defs,
            default_step: section.step,
        })
    }

    pub fn get(&self, name: &str) -> Option<&MetricDefinition> {
        self.defs.get(name)
    }

    /// Definition for a lifecycle call; absent and disabled metrics are unknown.
    pub fn active(&self, name: &str) -> Result<&MetricDefinition> {
        self.defs
            .get(name)
            .filter(|d| !d.disabled)
            .ok_or_else(|| UsemonError::UnknownMetric(name.to_string()))
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.defs.values().filter(|d| !d.disabled)
    }

    /// Distinct per-metric intervals that need their own timer.
    pub fn custom_intervals(&self) -> BTreeSet<u64> {
        self.iter_active()
            .filter_map(|d| match d.cadence {
                Cadence::Every(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn default_step(&self) -> u64 {
        self.default_step
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config;

    fn section(yaml: &str) -> MonitoringSection {
        config::load_from_str(yaml).unwrap().monitoring.unwrap()
    }

    #[test]
    fn disabled_metrics_stay_in_table() {
        let s = section(
            r#"
version: 1
monitoring:
  adapter: { host: web-01 }
  metrics:
    render: { key: app.render, operation: average, secondaryKey: app.render.n }
    legacy: { key: app.legacy, operation: count, disabled: true }
    ws: { key: app.ws, operation: count, step: 10 }
    idle: { key: app.idle, operation: count, step: 10 }
"#,
        );
        let t = MetricTable::load(&s).unwrap();

        assert_eq!(t.len(), 4);
        assert!(t.get("legacy").is_some());
        assert_eq!(t.active("legacy").unwrap_err().code().as_str(), "UNKNOWN_METRIC");
        assert_eq!(t.iter_active().count(), 3);
        assert_eq!(t.custom_intervals().into_iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(
            t.get("render").unwrap().kind,
            MetricKind::Average {
                secondary_key: Some("app.render.n".into())
            }
        );
        assert_eq!(t.get("ws").unwrap().cadence, Cadence::Every(10));
    }

    #[test]
    fn missing_operation_rejects_whole_table() {
        let s = section(
            r#"
version: 1
monitoring:
  adapter: { host: web-01 }
  metrics:
    a: { key: app.a, operation: count }
    b: { key: app.b }
"#,
        );
        let err = MetricTable::load(&s).unwrap_err();
        assert_eq!(err.code().as_str(), "CONFIG");
        assert!(err.to_string().contains("use case b"));
    }
}
