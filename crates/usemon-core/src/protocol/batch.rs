//! JSON batch codec.
//!
//! A batch is a JSON array of data points. Adapters that speak text (stdout,
//! HTTP collectors, files) encode through here so every point is validated
//! the same way before it leaves the process.

use crate::error::{Result, UsemonError};
use crate::protocol::point::DataPoint;

fn validate(p: &DataPoint) -> Result<()> {
    if p.key.is_empty() {
        return Err(UsemonError::InvalidPoint("data point key must not be empty".into()));
    }
    if !p.value.is_finite() {
        return Err(UsemonError::InvalidPoint(format!(
            "data point {} has non-finite value",
            p.key
        )));
    }
    if matches!(p.host.as_deref(), Some("")) {
        return Err(UsemonError::InvalidPoint(format!(
            "data point {} has empty host",
            p.key
        )));
    }
    Ok(())
}

/// Encode a batch as a JSON array.
pub fn encode_batch(points: &[DataPoint]) -> Result<String> {
    points.iter().try_for_each(validate)?;
    serde_json::to_string(points).map_err(|e| UsemonError::Internal(format!("json encode failed: {e}")))
}

/// Encode a batch as newline-delimited JSON, one point per line.
pub fn encode_lines(points: &[DataPoint]) -> Result<String> {
    let mut out = String::new();
    for p in points {
        validate(p)?;
        let line = serde_json::to_string(p)
            .map_err(|e| UsemonError::Internal(format!("json encode failed: {e}")))?;
        out.push_str(&line);
        out.push('\n');
    }
    tracing::trace!(points = points.len(), bytes = out.len(), "encoded batch lines");
    Ok(out)
}
