//! Monitoring config loader (strict parsing).

pub mod schema;

use std::fs;

use usemon_core::error::{Result, UsemonError};

pub use schema::{AdapterKind, AdapterSection, MetricConfig, MonitoringSection, Operation, UsemonConfig};

pub fn load_from_file(path: &str) -> Result<UsemonConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| UsemonError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<UsemonConfig> {
    let cfg: UsemonConfig =
        serde_yaml::from_str(s).map_err(|e| UsemonError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
