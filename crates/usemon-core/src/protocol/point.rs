//! Outgoing data point.

use serde::{Deserialize, Serialize};

/// One value emitted to the monitoring backend per flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataPoint {
    /// Backend item name (the metric's configured `key` or `secondaryKey`).
    pub key: String,
    pub value: f64,
    /// Reporting host, stamped by the engine from adapter config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DataPoint {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
            host: None,
        }
    }

    pub fn with_host(mut self, host: Option<&str>) -> Self {
        self.host = host.map(str::to_owned);
        self
    }
}
