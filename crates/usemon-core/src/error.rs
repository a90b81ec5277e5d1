//! Shared error type across usemon crates.

use thiserror::Error;

/// Stable error codes (used in logs and by hosts inspecting `close()` results).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid or incomplete configuration.
    Config,
    /// Lifecycle call against an unconfigured or disabled metric.
    UnknownMetric,
    /// `end_measurement` without a matching open entry.
    NoOpenMeasurement,
    /// Lifecycle call that the metric's operation does not support.
    OperationMismatch,
    /// Data point that cannot be encoded (empty key or host, non-finite value).
    InvalidPoint,
    /// Adapter rejected or failed to deliver a batch.
    Dispatch,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnknownMetric => "UNKNOWN_METRIC",
            ErrorCode::NoOpenMeasurement => "NO_OPEN_MEASUREMENT",
            ErrorCode::OperationMismatch => "OPERATION_MISMATCH",
            ErrorCode::InvalidPoint => "INVALID_POINT",
            ErrorCode::Dispatch => "DISPATCH",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, UsemonError>;

/// Unified error type used by core, engine, and adapters.
#[derive(Debug, Clone, Error)]
pub enum UsemonError {
    #[error("config: {0}")]
    Config(String),
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("no open measurement {id} for metric {key}")]
    NoOpenMeasurement { key: String, id: String },
    #[error("metric {key} ({operation}) does not support {call}")]
    OperationMismatch {
        key: String,
        operation: &'static str,
        call: &'static str,
    },
    #[error("invalid data point: {0}")]
    InvalidPoint(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl UsemonError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            UsemonError::Config(_) => ErrorCode::Config,
            UsemonError::UnknownMetric(_) => ErrorCode::UnknownMetric,
            UsemonError::NoOpenMeasurement { .. } => ErrorCode::NoOpenMeasurement,
            UsemonError::OperationMismatch { .. } => ErrorCode::OperationMismatch,
            UsemonError::InvalidPoint(_) => ErrorCode::InvalidPoint,
            UsemonError::Dispatch(_) => ErrorCode::Dispatch,
            UsemonError::Internal(_) => ErrorCode::Internal,
        }
    }
}
