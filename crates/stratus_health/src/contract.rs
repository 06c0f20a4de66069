//! Messages exchanged between the deployment engine and the health monitor.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use stratus_model::{HealthState, ResourceIdentity, ResourceType};

/// Default interval between two probes of the same output resource.
pub const DEFAULT_HEALTH_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthAction {
    Register,
    Unregister,
}

impl HealthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthAction::Register => "register",
            HealthAction::Unregister => "unregister",
        }
    }
}

impl std::fmt::Display for HealthAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an output resource wants to be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckOptions {
    pub interval_ms: u64,
}

impl Default for HealthCheckOptions {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_HEALTH_INTERVAL_MS,
        }
    }
}

impl HealthCheckOptions {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
        }
    }

    /// Probe interval, never shorter than one millisecond.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// An output resource as seen by the health monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResource {
    /// ID of the owning application resource.
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub identity: ResourceIdentity,
    /// `{resource id}#{identity}`; the key registrations are matched on.
    pub health_id: String,
}

impl HealthResource {
    pub fn new(
        resource_id: impl Into<String>,
        resource_type: ResourceType,
        identity: ResourceIdentity,
    ) -> Self {
        let resource_id = resource_id.into();
        let health_id = health_id(&resource_id, &identity);
        Self {
            resource_id,
            resource_type,
            identity,
            health_id,
        }
    }
}

/// Deterministic key for an output resource of `resource_id`.
pub fn health_id(resource_id: &str, identity: &ResourceIdentity) -> String {
    format!("{}#{}", resource_id, identity)
}

/// A (un)registration request sent to the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRegistrationMessage {
    pub action: HealthAction,
    pub resource: HealthResource,
    #[serde(default)]
    pub options: HealthCheckOptions,
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub state: HealthState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            state: HealthState::Healthy,
            details: None,
        }
    }

    pub fn unhealthy(details: impl Into<String>) -> Self {
        Self {
            state: HealthState::Unhealthy,
            details: Some(details.into()),
        }
    }
}

/// Published whenever a probed resource changes health state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStateChange {
    pub resource: HealthResource,
    pub previous: HealthState,
    pub current: HealthState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
