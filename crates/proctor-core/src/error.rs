//! Configuration Error Types

use thiserror::Error;

/// Errors raised while loading or validating a [`ProctorConfig`](crate::ProctorConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Value out of allowed range
    #[error("{field} value {value} is invalid: {reason}")]
    InvalidValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Behavior weight table has no entries
    #[error("Risk weight table is empty")]
    EmptyWeightTable,

    /// No modality is enabled
    #[error("No active modalities configured")]
    NoActiveModalities,

    /// Config source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
