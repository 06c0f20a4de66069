//! Error types for the health crate.

use thiserror::Error;

/// Result type alias for health operations.
pub type HealthResult<T> = Result<T, HealthError>;

/// Errors that can occur while talking to the health monitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    #[error("Health registration channel is closed")]
    ChannelClosed,
}
