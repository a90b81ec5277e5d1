use std::collections::BTreeMap;

use serde::Deserialize;
use usemon_core::error::{Result, UsemonError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsemonConfig {
    pub version: u32,

    /// Absent section means monitoring is inactive.
    #[serde(default)]
    pub monitoring: Option<MonitoringSection>,
}

impl UsemonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(UsemonError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if let Some(m) = &self.monitoring {
            m.validate()?;
        }
        Ok(())
    }

    /// Enabled monitoring section, if any.
    pub fn active_monitoring(&self) -> Option<&MonitoringSection> {
        self.monitoring.as_ref().filter(|m| !m.disabled)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitoringSection {
    #[serde(default)]
    pub disabled: bool,

    /// Default flush cadence in seconds.
    #[serde(default = "default_step")]
    pub step: u64,

    #[serde(default)]
    pub adapter: Option<AdapterSection>,

    /// Use case name -> metric definition.
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricConfig>,
}

impl MonitoringSection {
    pub fn validate(&self) -> Result<()> {
        if self.disabled {
            return Ok(());
        }
        if !STEP_RANGE.contains(&self.step) {
            return Err(UsemonError::Config(format!(
                "monitoring.step must be between {} and {}",
                STEP_RANGE.start(),
                STEP_RANGE.end()
            )));
        }

        let adapter = self
            .adapter
            .as_ref()
            .ok_or_else(|| UsemonError::Config("monitoring.adapter is required".into()))?;
        adapter.validate()?;

        if self.metrics.is_empty() {
            return Err(UsemonError::Config("monitoring.metrics must not be empty".into()));
        }
        for (name, m) in &self.metrics {
            if let Some(step) = m.step {
                if !STEP_RANGE.contains(&step) {
                    return Err(UsemonError::Config(format!(
                        "metrics.{name}.step must be between {} and {}",
                        STEP_RANGE.start(),
                        STEP_RANGE.end()
                    )));
                }
            }
        }
        Ok(())
    }
}

const STEP_RANGE: std::ops::RangeInclusive<u64> = 1..=86_400;

fn default_step() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Write batches to the tracing log.
    #[default]
    Log,
    /// Write batches to stdout as JSON lines.
    Stdout,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterSection {
    #[serde(default)]
    pub kind: AdapterKind,

    /// Reporting host stamped on every data point.
    #[serde(default)]
    pub host: Option<String>,
}

impl AdapterSection {
    pub fn validate(&self) -> Result<()> {
        match self.host.as_deref() {
            Some(h) if !h.trim().is_empty() => Ok(()),
            _ => Err(UsemonError::Config("monitoring.adapter.host is required".into())),
        }
    }
}

/// Aggregation semantics of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Count,
    Average,
    ResolvedRequests,
    Number,
    Time,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Count => "count",
            Operation::Average => "average",
            Operation::ResolvedRequests => "resolvedRequests",
            Operation::Number => "number",
            Operation::Time => "time",
        }
    }
}

/// Raw metric entry. `key` and `operation` are optional here so the table
/// loader can report which use case is incomplete.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricConfig {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub operation: Option<Operation>,

    #[serde(default, rename = "secondaryKey", alias = "secondary_key")]
    pub secondary_key: Option<String>,

    /// Flush cadence override in seconds.
    #[serde(default, alias = "flushIntervalSeconds", alias = "flush_interval_seconds")]
    pub step: Option<u64>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub immediate: bool,
}
