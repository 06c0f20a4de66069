//! Test doubles for renderers, handlers and secret clients.
//!
//! Every double is cheap to clone and shares its state between clones, so a
//! test can keep one copy for assertions while the engine owns another.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use stratus_model::{Resource, ResourceId, ResourceIdentity};

use crate::error::{HandlerError, HandlerResult, RenderError};
use crate::handlers::{DeleteOptions, PutOptions, ResourceHandler, SecretValueClient};
use crate::renderer::{RenderOptions, Renderer, RendererDependency, RendererOutput};

/// Which handler method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Put,
    Delete,
}

/// One recorded handler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerCall {
    pub kind: CallKind,
    pub local_id: String,
    /// Whether `put` received a previously persisted state.
    pub had_existing: bool,
    /// Local IDs whose properties were visible to `put`.
    pub dependency_keys: Vec<String>,
}

/// Ordered record of handler calls, shareable across handlers.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<RwLock<Vec<HandlerCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: HandlerCall) {
        self.calls.write().push(call);
    }

    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.read().clone()
    }

    /// Local IDs passed to `put`, in call order.
    pub fn puts(&self) -> Vec<String> {
        self.of_kind(CallKind::Put)
    }

    /// Local IDs passed to `delete`, in call order.
    pub fn deletes(&self) -> Vec<String> {
        self.of_kind(CallKind::Delete)
    }

    fn of_kind(&self, kind: CallKind) -> Vec<String> {
        self.calls
            .read()
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.local_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.read().is_empty()
    }

    pub fn clear(&self) {
        self.calls.write().clear();
    }
}

/// Resource handler that records calls and succeeds unless told otherwise.
///
/// `put` assigns a UCP identity derived from the local ID when the output
/// resource has none, and returns `{"name": <local id>}` merged with any
/// configured properties.
#[derive(Clone)]
pub struct RecordingHandler {
    log: CallLog,
    properties: Arc<RwLock<HashMap<String, BTreeMap<String, String>>>>,
    deployed: Arc<RwLock<HashMap<String, Value>>>,
    fail_put: Arc<RwLock<HashSet<String>>>,
    fail_delete: Arc<RwLock<HashSet<String>>>,
    assign_identity: Arc<RwLock<bool>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    /// Record into an existing log shared with other handlers.
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            properties: Arc::default(),
            deployed: Arc::default(),
            fail_put: Arc::default(),
            fail_delete: Arc::default(),
            assign_identity: Arc::new(RwLock::new(true)),
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn with_property(
        self,
        local_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.properties
            .write()
            .entry(local_id.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Representation `put` records as deployed for `local_id`.
    pub fn with_deployed(self, local_id: impl Into<String>, resource: Value) -> Self {
        self.deployed.write().insert(local_id.into(), resource);
        self
    }

    pub fn failing_put(self, local_id: impl Into<String>) -> Self {
        self.fail_put.write().insert(local_id.into());
        self
    }

    pub fn failing_delete(self, local_id: impl Into<String>) -> Self {
        self.fail_delete.write().insert(local_id.into());
        self
    }

    /// Leave output resources without an identity after `put`.
    pub fn without_identity(self) -> Self {
        *self.assign_identity.write() = false;
        self
    }

    pub fn clear_failures(&self) {
        self.fail_put.write().clear();
        self.fail_delete.write().clear();
    }
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceHandler for RecordingHandler {
    async fn put(&self, options: &mut PutOptions<'_>) -> HandlerResult<BTreeMap<String, String>> {
        let local_id = options.resource.local_id.clone();
        self.log.record(HandlerCall {
            kind: CallKind::Put,
            local_id: local_id.clone(),
            had_existing: options.existing.is_some(),
            dependency_keys: options.dependency_properties.keys().cloned().collect(),
        });

        if self.fail_put.read().contains(&local_id) {
            return Err(HandlerError::Failed(format!("put failed for {}", local_id)));
        }

        if options.resource.identity.is_none() && *self.assign_identity.read() {
            options.resource.identity = Some(ResourceIdentity::ucp(format!(
                "/planes/test/local/providers/Test.Resources/{}/{}",
                options.resource.resource_type.kind, local_id
            )));
        }
        if let Some(deployed) = self.deployed.read().get(&local_id) {
            options.resource.resource = Some(deployed.clone());
        }

        let mut properties = BTreeMap::new();
        properties.insert("name".to_string(), local_id.clone());
        if let Some(extra) = self.properties.read().get(&local_id) {
            properties.extend(extra.clone());
        }
        Ok(properties)
    }

    async fn delete(&self, options: &DeleteOptions<'_>) -> HandlerResult<()> {
        let local_id = options.existing.local_id.clone();
        self.log.record(HandlerCall {
            kind: CallKind::Delete,
            local_id: local_id.clone(),
            had_existing: true,
            dependency_keys: Vec::new(),
        });

        if self.fail_delete.read().contains(&local_id) {
            return Err(HandlerError::Failed(format!("delete failed for {}", local_id)));
        }
        Ok(())
    }
}

/// Renderer returning a configurable, replaceable output.
#[derive(Clone, Default)]
pub struct StaticRenderer {
    dependency_ids: Arc<RwLock<Vec<ResourceId>>>,
    output: Arc<RwLock<RendererOutput>>,
    fail_dependency_ids: Arc<RwLock<Option<String>>>,
    fail_render: Arc<RwLock<Option<String>>>,
    renders: Arc<AtomicUsize>,
    last_dependencies: Arc<RwLock<BTreeMap<String, RendererDependency>>>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(self, output: RendererOutput) -> Self {
        self.set_output(output);
        self
    }

    pub fn with_dependency(self, id: ResourceId) -> Self {
        self.dependency_ids.write().push(id);
        self
    }

    pub fn failing_dependency_ids(self, message: impl Into<String>) -> Self {
        *self.fail_dependency_ids.write() = Some(message.into());
        self
    }

    pub fn failing_render(self, message: impl Into<String>) -> Self {
        *self.fail_render.write() = Some(message.into());
        self
    }

    /// Replace what the next render returns.
    pub fn set_output(&self, output: RendererOutput) {
        *self.output.write() = output;
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Dependencies passed to the most recent render.
    pub fn last_dependencies(&self) -> BTreeMap<String, RendererDependency> {
        self.last_dependencies.read().clone()
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn get_dependency_ids(
        &self,
        _resource: &Resource,
    ) -> Result<Vec<ResourceId>, RenderError> {
        if let Some(message) = self.fail_dependency_ids.read().clone() {
            return Err(RenderError::InvalidDefinition(message));
        }
        Ok(self.dependency_ids.read().clone())
    }

    async fn render(&self, options: RenderOptions) -> Result<RendererOutput, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        *self.last_dependencies.write() = options.dependencies;

        if let Some(message) = self.fail_render.read().clone() {
            return Err(RenderError::InvalidDefinition(message));
        }
        Ok(self.output.read().clone())
    }
}

/// Secret client answering from a fixed table keyed by action and selector.
#[derive(Clone, Default)]
pub struct StaticSecretClient {
    secrets: Arc<RwLock<HashMap<(String, String), Value>>>,
    default: Arc<RwLock<Option<Value>>>,
    calls: Arc<AtomicUsize>,
}

impl StaticSecretClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(
        self,
        action: impl Into<String>,
        selector: impl Into<String>,
        value: Value,
    ) -> Self {
        self.secrets
            .write()
            .insert((action.into(), selector.into()), value);
        self
    }

    /// Value returned when no entry matches.
    pub fn with_default(self, value: Value) -> Self {
        *self.default.write() = Some(value);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretValueClient for StaticSecretClient {
    async fn fetch_secret(
        &self,
        identity: &ResourceIdentity,
        action: Option<&str>,
        value_selector: Option<&str>,
    ) -> HandlerResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (
            action.unwrap_or_default().to_string(),
            value_selector.unwrap_or_default().to_string(),
        );
        if let Some(value) = self.secrets.read().get(&key) {
            return Ok(value.clone());
        }
        self.default
            .read()
            .clone()
            .ok_or_else(|| HandlerError::NotFound(format!("no secret for {}", identity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_model::{OutputResource, OutputResourceKind, ResourceType};

    #[tokio::test]
    async fn test_recording_handler_assigns_identity_and_logs() {
        let handler = RecordingHandler::new().with_property("Deployment", "replicas", "3");
        let deps = BTreeMap::new();
        let mut options = PutOptions {
            application_name: "shop",
            resource_name: "web",
            resource: OutputResource::new(
                "Deployment",
                ResourceType::kubernetes(OutputResourceKind::Deployment),
            ),
            existing: None,
            dependency_properties: &deps,
        };

        let properties = handler.put(&mut options).await.unwrap();
        assert_eq!(properties["name"], "Deployment");
        assert_eq!(properties["replicas"], "3");
        assert!(options.resource.has_identity());
        assert_eq!(handler.log().puts(), vec!["Deployment".to_string()]);
    }

    #[tokio::test]
    async fn test_shared_log_keeps_global_order() {
        let log = CallLog::new();
        let first = RecordingHandler::with_log(log.clone());
        let second = RecordingHandler::with_log(log.clone());
        let existing =
            OutputResource::new("A", ResourceType::kubernetes(OutputResourceKind::Secret));
        let other =
            OutputResource::new("B", ResourceType::kubernetes(OutputResourceKind::Service));

        second
            .delete(&DeleteOptions {
                application_name: "shop",
                resource_name: "web",
                existing: &other,
            })
            .await
            .unwrap();
        first
            .delete(&DeleteOptions {
                application_name: "shop",
                resource_name: "web",
                existing: &existing,
            })
            .await
            .unwrap();

        assert_eq!(log.deletes(), vec!["B".to_string(), "A".to_string()]);
    }
}
