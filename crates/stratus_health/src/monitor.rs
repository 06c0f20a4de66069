//! Health monitor.
//!
//! The monitor owns the receiving half of the registration channel. Every
//! registered output resource gets its own probe task that runs at the
//! interval requested at registration time and publishes state changes on an
//! optional notification channel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use stratus_model::HealthState;

use crate::contract::{
    HealthAction, HealthCheckOptions, HealthRegistrationMessage, HealthReport, HealthResource,
    HealthStateChange,
};

/// Probes the health of one output resource.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, resource: &HealthResource) -> HealthReport;
}

/// Last known health of a tracked output resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedHealth {
    pub resource: HealthResource,
    pub state: HealthState,
    pub details: Option<String>,
}

/// Read-only view of what the monitor is tracking.
#[derive(Debug, Clone, Default)]
pub struct HealthStatusHandle {
    tracked: Arc<RwLock<HashMap<String, TrackedHealth>>>,
}

impl HealthStatusHandle {
    pub fn is_tracked(&self, health_id: &str) -> bool {
        self.tracked.read().contains_key(health_id)
    }

    pub fn health_state(&self, health_id: &str) -> Option<HealthState> {
        self.tracked.read().get(health_id).map(|t| t.state)
    }

    pub fn get(&self, health_id: &str) -> Option<TrackedHealth> {
        self.tracked.read().get(health_id).cloned()
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.read().len()
    }
}

/// Consumes health registrations and runs the probes.
pub struct HealthMonitor {
    receiver: mpsc::Receiver<HealthRegistrationMessage>,
    probe: Arc<dyn HealthProbe>,
    notifications: Option<mpsc::Sender<HealthStateChange>>,
    status: HealthStatusHandle,
    probes: HashMap<String, JoinHandle<()>>,
}

impl HealthMonitor {
    pub fn new(
        receiver: mpsc::Receiver<HealthRegistrationMessage>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            receiver,
            probe,
            notifications: None,
            status: HealthStatusHandle::default(),
            probes: HashMap::new(),
        }
    }

    /// Publish health state changes on `sender`.
    pub fn with_notifications(mut self, sender: mpsc::Sender<HealthStateChange>) -> Self {
        self.notifications = Some(sender);
        self
    }

    pub fn handle(&self) -> HealthStatusHandle {
        self.status.clone()
    }

    /// Process registrations until every sender has been dropped.
    pub async fn run(mut self) {
        info!("Health monitor started");
        while let Some(message) = self.receiver.recv().await {
            match message.action {
                HealthAction::Register => self.register(message.resource, message.options),
                HealthAction::Unregister => self.unregister(&message.resource),
            }
        }

        for (_, task) in self.probes.drain() {
            task.abort();
        }
        self.status.tracked.write().clear();
        info!("Health monitor stopped");
    }

    fn register(&mut self, resource: HealthResource, options: HealthCheckOptions) {
        let health_id = resource.health_id.clone();
        if self.probes.contains_key(&health_id) {
            info!(
                "Resource {} is already registered, ignoring registration",
                health_id
            );
            return;
        }

        info!(
            "Registering {} ({}) for health monitoring every {:?}",
            health_id,
            resource.resource_type,
            options.interval()
        );
        self.status.tracked.write().insert(
            health_id.clone(),
            TrackedHealth {
                resource: resource.clone(),
                state: HealthState::Unknown,
                details: None,
            },
        );

        let task = tokio::spawn(probe_loop(
            resource,
            options,
            self.probe.clone(),
            self.status.clone(),
            self.notifications.clone(),
        ));
        self.probes.insert(health_id, task);
    }

    fn unregister(&mut self, resource: &HealthResource) {
        match self.probes.remove(&resource.health_id) {
            Some(task) => {
                task.abort();
                self.status.tracked.write().remove(&resource.health_id);
                info!("Unregistered {} from health monitoring", resource.health_id);
            }
            None => debug!("No active probe found for {}", resource.health_id),
        }
    }
}

async fn probe_loop(
    resource: HealthResource,
    options: HealthCheckOptions,
    probe: Arc<dyn HealthProbe>,
    status: HealthStatusHandle,
    notifications: Option<mpsc::Sender<HealthStateChange>>,
) {
    let mut ticker = tokio::time::interval(options.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; probing starts one interval in.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let report = probe.probe(&resource).await;

        let previous = {
            let mut tracked = status.tracked.write();
            let Some(entry) = tracked.get_mut(&resource.health_id) else {
                return;
            };
            let previous = entry.state;
            entry.state = report.state;
            entry.details = report.details.clone();
            previous
        };

        if previous == report.state {
            continue;
        }

        info!(
            "Health state of {} changed from {} to {}",
            resource.health_id, previous, report.state
        );
        if let Some(sender) = &notifications {
            let change = HealthStateChange {
                resource: resource.clone(),
                previous,
                current: report.state,
                details: report.details,
            };
            if sender.send(change).await.is_err() {
                warn!(
                    "Health notification channel closed, dropping change for {}",
                    resource.health_id
                );
            }
        }
    }
}
