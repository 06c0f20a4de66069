//! # stratus_health
//!
//! Health monitoring for deployed output resources:
//!
//! - The registration contract shared with the deployment engine
//! - A bounded channel that applies backpressure to senders
//! - A monitor that runs one probe per registered output resource

pub mod channel;
pub mod contract;
pub mod error;
pub mod monitor;

pub use channel::HealthChannel;
pub use contract::{
    health_id, HealthAction, HealthCheckOptions, HealthRegistrationMessage, HealthReport,
    HealthResource, HealthStateChange, DEFAULT_HEALTH_INTERVAL_MS,
};
pub use error::{HealthError, HealthResult};
pub use monitor::{HealthMonitor, HealthProbe, HealthStatusHandle, TrackedHealth};
