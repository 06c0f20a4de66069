//! Bounded registration channel between the deployment engine and the monitor.
//!
//! Senders wait while the channel is full. They never wait for a probe
//! result: delivery to the monitor is the only thing a send guarantees.

use tokio::sync::mpsc;
use tracing::debug;

use crate::contract::{HealthAction, HealthCheckOptions, HealthRegistrationMessage, HealthResource};
use crate::error::{HealthError, HealthResult};

/// Sending half of the health registration channel.
#[derive(Debug, Clone)]
pub struct HealthChannel {
    sender: mpsc::Sender<HealthRegistrationMessage>,
}

impl HealthChannel {
    /// Create a channel holding at most `capacity` pending messages.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<HealthRegistrationMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Send a message, waiting for a free slot if the channel is full.
    pub async fn send(&self, message: HealthRegistrationMessage) -> HealthResult<()> {
        debug!(
            "Sending health {} for {}",
            message.action, message.resource.health_id
        );
        self.sender
            .send(message)
            .await
            .map_err(|_| HealthError::ChannelClosed)
    }

    pub async fn register(
        &self,
        resource: HealthResource,
        options: HealthCheckOptions,
    ) -> HealthResult<()> {
        self.send(HealthRegistrationMessage {
            action: HealthAction::Register,
            resource,
            options,
        })
        .await
    }

    pub async fn unregister(&self, resource: HealthResource) -> HealthResult<()> {
        self.send(HealthRegistrationMessage {
            action: HealthAction::Unregister,
            resource,
            options: HealthCheckOptions::default(),
        })
        .await
    }

    /// Number of free slots right now.
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
