//! Deployment processor.
//!
//! Drives one deploy, delete or reconcile call end to end: render, order,
//! deploy each output resource through its handler, collect garbage,
//! persist, and finally record the outcome on the operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use stratus_health::{
    HealthChannel, HealthCheckOptions, HealthRegistrationMessage, HealthResource,
};
use stratus_model::{
    gc_output_resources, order_output_resources, pointer, ErrorCode, ErrorDetails, HealthState,
    OperationStatus, OutputResource, ProvisioningState, Resource, ResourceId, ResourceKind,
    ResourceStatus,
};

use crate::config::{EngineConfig, GcMode};
use crate::error::{DeployError, DeployResult, EngineError, EngineResult};
use crate::handlers::{DeleteOptions, PutOptions, SecretValueClient};
use crate::registry::ApplicationModel;
use crate::renderer::{ComputedValueReference, RenderOptions, RendererOutput};
use crate::resolver::DependencyResolver;
use crate::secrets::SecretFetcher;
use crate::store::Store;

/// Entry points of the deployment engine.
///
/// Returned errors are for logging; completion is tracked on the operation.
#[async_trait]
pub trait DeploymentProcessor: Send + Sync {
    /// Render and deploy `resource`. `operation_id` is the resource ID with
    /// an operation segment appended.
    async fn deploy(&self, operation_id: &ResourceId, resource: &Resource) -> DeployResult<()>;

    /// Delete every output resource of `resource`, then the stored record.
    async fn delete(&self, operation_id: &ResourceId, resource: &Resource) -> DeployResult<()>;

    /// Resolve the secret references of a deployed resource.
    async fn fetch_secrets(
        &self,
        id: &ResourceId,
        resource: &Resource,
    ) -> EngineResult<BTreeMap<String, Value>>;

    /// Delete output resources left pending by a deferred garbage collection.
    async fn reconcile(&self, operation_id: &ResourceId) -> DeployResult<()>;
}

/// The default [`DeploymentProcessor`].
pub struct ResourceDeploymentProcessor {
    model: Arc<ApplicationModel>,
    store: Arc<dyn Store>,
    health: HealthChannel,
    secrets: SecretFetcher,
    resolver: DependencyResolver,
    gc_mode: GcMode,
    health_options: HealthCheckOptions,
}

impl ResourceDeploymentProcessor {
    pub fn new(
        model: Arc<ApplicationModel>,
        store: Arc<dyn Store>,
        health: HealthChannel,
        secret_client: Option<Arc<dyn SecretValueClient>>,
    ) -> Self {
        let secrets = SecretFetcher::new(model.clone(), secret_client);
        let resolver = DependencyResolver::new(store.clone(), secrets.clone());
        Self {
            model,
            store,
            health,
            secrets,
            resolver,
            gc_mode: GcMode::Inline,
            health_options: HealthCheckOptions::default(),
        }
    }

    pub fn with_gc_mode(mut self, mode: GcMode) -> Self {
        self.gc_mode = mode;
        self
    }

    /// Options used for output resources whose health handler has none.
    pub fn with_health_options(mut self, options: HealthCheckOptions) -> Self {
        self.health_options = options;
        self
    }

    /// Build a processor and the health channel receiver it sends to.
    pub fn from_config(
        config: &EngineConfig,
        model: Arc<ApplicationModel>,
        store: Arc<dyn Store>,
        secret_client: Option<Arc<dyn SecretValueClient>>,
    ) -> (Self, mpsc::Receiver<HealthRegistrationMessage>) {
        let (health, receiver) = HealthChannel::bounded(config.health_channel_capacity);
        let processor = Self::new(model, store, health, secret_client)
            .with_gc_mode(config.garbage_collection)
            .with_health_options(config.health_check_options());
        (processor, receiver)
    }

    pub fn gc_mode(&self) -> GcMode {
        self.gc_mode
    }

    async fn deploy_resource(
        &self,
        resource_id: &ResourceId,
        resource: &Resource,
    ) -> DeployResult<()> {
        let target = resource_id.as_str();
        let invalid = |source: EngineError| DeployError::invalid(target, source);
        let internal = |source: EngineError| DeployError::internal(target, source);

        let kind = ResourceKind::from_str(&resource_id.resource_type().unwrap_or_default());
        let renderer = self.model.lookup_renderer(&kind).map_err(invalid)?;

        let dependency_ids = renderer
            .get_dependency_ids(resource)
            .await
            .map_err(|e| invalid(e.into()))?;
        let dependencies = self
            .resolver
            .fetch_dependencies(&dependency_ids)
            .await
            .map_err(internal)?;

        info!(
            "Rendering resource {} of application {}",
            resource.resource_name, resource.application_name
        );
        let output = renderer
            .render(RenderOptions {
                resource: resource.clone(),
                dependencies,
            })
            .await
            .map_err(|e| invalid(e.into()))?;
        self.validate_output(&output).map_err(invalid)?;

        let ordered = order_output_resources(&output.resources).map_err(|e| internal(e.into()))?;

        let existing = match self.store.get_resource(resource_id).await {
            Ok(existing) => Some(existing),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(internal(e.into())),
        };
        let existing_status = existing.map(|r| r.status).unwrap_or_default();

        let mut deployed = Vec::with_capacity(ordered.len());
        let mut computed_values = BTreeMap::new();
        let mut properties_by_id: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

        for (index, desired) in ordered.into_iter().enumerate() {
            let local_id = desired.local_id.clone();
            let prior = existing_status
                .output_resources
                .iter()
                .find(|r| r.local_id == local_id);
            let model = self
                .model
                .lookup_output_resource(&desired.resource_type)
                .map_err(invalid)?;

            info!(
                "Deploying output resource [{}/{}]: {} ({})",
                index + 1,
                output.resources.len(),
                local_id,
                desired.resource_type
            );
            let mut options = PutOptions {
                application_name: &resource.application_name,
                resource_name: &resource.resource_name,
                resource: desired,
                existing: prior,
                dependency_properties: &properties_by_id,
            };
            let properties = model
                .resource_handler
                .put(&mut options)
                .await
                .map_err(|source| {
                    internal(EngineError::Handler {
                        local_id: local_id.clone(),
                        source,
                    })
                })?;
            let mut deployed_resource = options.resource;

            let identity = match &deployed_resource.identity {
                Some(identity) if !identity.is_empty() => identity.clone(),
                _ => {
                    return Err(internal(EngineError::HandlerContractViolation { local_id }));
                }
            };

            resolve_computed_values(&output, &deployed_resource, &properties, &mut computed_values)
                .map_err(internal)?;

            if model.supports_health_monitor {
                let options = model
                    .health_handler
                    .get_health_options(&deployed_resource)
                    .unwrap_or(self.health_options);
                let health_resource = HealthResource::new(
                    resource_id.as_str(),
                    deployed_resource.resource_type.clone(),
                    identity,
                );
                self.register_health(health_resource, options).await;
            } else {
                info!(
                    "Health state is not applicable for {}, skipping registration",
                    deployed_resource.resource_type
                );
                deployed_resource.status.health_state = HealthState::NotApplicable;
            }

            deployed_resource.status.provisioning_state = ProvisioningState::Succeeded;
            deployed_resource.persisted_properties = properties.clone();
            properties_by_id.insert(local_id, properties);
            deployed.push(deployed_resource.for_persistence());
        }

        for (name, reference) in &output.computed_values {
            if let ComputedValueReference::Static { value } = reference {
                computed_values.insert(name.clone(), value.clone());
            }
        }

        let mut candidates = existing_status.pending_deletion;
        candidates.extend(existing_status.output_resources);
        let stale = gc_output_resources(&deployed, &candidates);

        let pending_deletion = if stale.is_empty() {
            Vec::new()
        } else {
            match self.gc_mode {
                GcMode::Inline => {
                    info!("Deleting {} stale output resource(s) of {}", stale.len(), target);
                    for output_resource in stale.iter().rev() {
                        self.delete_output_resource(resource, resource_id, output_resource)
                            .await
                            .map_err(|e| DeployError::internal(e.target, e.source))?;
                    }
                    Vec::new()
                }
                GcMode::Deferred => {
                    info!(
                        "Recording {} stale output resource(s) of {} for deletion",
                        stale.len(),
                        target
                    );
                    stale
                }
            }
        };

        let mut updated = resource.clone();
        updated.id = resource_id.clone();
        updated.computed_values = computed_values;
        updated.secret_values = output.secret_values.clone();
        updated.status = ResourceStatus {
            provisioning_state: ProvisioningState::Succeeded,
            output_resources: deployed,
            pending_deletion,
        };
        updated.provisioning_state = ProvisioningState::Succeeded;

        self.store
            .update_resource_status(resource_id, &updated)
            .await
            .map_err(|e| internal(e.into()))?;
        debug!("Persisted resource {}", target);
        Ok(())
    }

    async fn delete_resource(
        &self,
        resource_id: &ResourceId,
        resource: &Resource,
    ) -> DeployResult<()> {
        let pending = resource.status.pending_deletion.iter().rev();
        let deployed = resource.status.output_resources.iter().rev();
        for output_resource in pending.chain(deployed) {
            self.delete_output_resource(resource, resource_id, output_resource)
                .await?;
        }

        match self.store.delete_resource(resource_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("Resource {} was already removed from the store", resource_id);
                Ok(())
            }
            Err(e) => Err(DeployError::internal(resource_id.as_str(), e.into())),
        }
    }

    async fn reconcile_resource(&self, resource_id: &ResourceId) -> DeployResult<()> {
        let mut stored = self.store.get_resource(resource_id).await.map_err(|e| {
            let code = if e.is_not_found() {
                ErrorCode::NotFound
            } else {
                ErrorCode::Internal
            };
            DeployError::new(code, resource_id.as_str(), e.into())
        })?;

        if stored.status.pending_deletion.is_empty() {
            debug!("Nothing pending deletion for {}", resource_id);
            return Ok(());
        }

        info!(
            "Reconciling {} output resource(s) pending deletion for {}",
            stored.status.pending_deletion.len(),
            resource_id
        );
        for output_resource in stored.status.pending_deletion.iter().rev() {
            self.delete_output_resource(&stored, resource_id, output_resource)
                .await?;
        }

        stored.status.pending_deletion.clear();
        self.store
            .update_resource_status(resource_id, &stored)
            .await
            .map_err(|e| DeployError::internal(resource_id.as_str(), e.into()))
    }

    async fn delete_output_resource(
        &self,
        resource: &Resource,
        resource_id: &ResourceId,
        output_resource: &OutputResource,
    ) -> DeployResult<()> {
        let target = resource_id.as_str();
        let model = self
            .model
            .lookup_output_resource(&output_resource.resource_type)
            .map_err(|e| DeployError::invalid(target, e))?;

        info!(
            "Deleting output resource {} ({})",
            output_resource.local_id, output_resource.resource_type
        );
        model
            .resource_handler
            .delete(&DeleteOptions {
                application_name: &resource.application_name,
                resource_name: &resource.resource_name,
                existing: output_resource,
            })
            .await
            .map_err(|source| {
                DeployError::internal(
                    target,
                    EngineError::Handler {
                        local_id: output_resource.local_id.clone(),
                        source,
                    },
                )
            })?;

        if output_resource.status.health_state != HealthState::NotApplicable {
            if let Some(identity) = &output_resource.identity {
                self.unregister_health(HealthResource::new(
                    target,
                    output_resource.resource_type.clone(),
                    identity.clone(),
                ))
                .await;
            }
        }
        Ok(())
    }

    fn validate_output(&self, output: &RendererOutput) -> EngineResult<()> {
        for resource in &output.resources {
            let resource_type = &resource.resource_type;
            if !self.model.is_provider_supported(resource_type.provider) {
                return Err(EngineError::UnsupportedProvider {
                    provider: resource_type.provider,
                    kind: resource_type.kind.clone(),
                });
            }
            self.model.lookup_output_resource(resource_type)?;
        }
        Ok(())
    }

    async fn register_health(&self, resource: HealthResource, options: HealthCheckOptions) {
        let health_id = resource.health_id.clone();
        match self.health.register(resource, options).await {
            Ok(()) => info!("Registered output resource {} for health checks", health_id),
            Err(e) => warn!("Failed to register {} for health checks: {}", health_id, e),
        }
    }

    async fn unregister_health(&self, resource: HealthResource) {
        let health_id = resource.health_id.clone();
        info!("Unregistering output resource {} from health checks", health_id);
        if let Err(e) = self.health.unregister(resource).await {
            warn!("Failed to unregister {} from health checks: {}", health_id, e);
        }
    }

    /// Record the outcome of a call on its operation. Never fails the call.
    async fn finish(
        &self,
        operation_id: &ResourceId,
        result: DeployResult<()>,
    ) -> DeployResult<()> {
        match &result {
            Ok(()) => {
                self.update_operation(operation_id, OperationStatus::Succeeded, None)
                    .await
            }
            Err(err) => {
                error!("Operation {} failed: {}", operation_id, err);
                self.update_operation(operation_id, OperationStatus::Failed, Some(err.details()))
                    .await
            }
        }
        result
    }

    async fn update_operation(
        &self,
        operation_id: &ResourceId,
        status: OperationStatus,
        error: Option<ErrorDetails>,
    ) {
        let mut operation = match self.store.get_operation(operation_id.as_str()).await {
            Ok(operation) => operation,
            Err(e) if e.is_not_found() => {
                error!(
                    "Update operation failed - operation with id {} was not found",
                    operation_id
                );
                return;
            }
            Err(e) => {
                error!("Failed to update operation {}: {}", operation_id, e);
                return;
            }
        };

        operation.complete(status, error);
        match self.store.patch_operation(&operation).await {
            Ok(()) => debug!("Operation {} marked {}", operation_id, status),
            Err(e) => error!("Failed to update operation {}: {}", operation_id, e),
        }
    }
}

/// Resolve the computed values that read from `deployed`.
fn resolve_computed_values(
    output: &RendererOutput,
    deployed: &OutputResource,
    properties: &BTreeMap<String, String>,
    computed_values: &mut BTreeMap<String, Value>,
) -> EngineResult<()> {
    for (name, reference) in &output.computed_values {
        match reference {
            ComputedValueReference::Property { local_id, property }
                if *local_id == deployed.local_id =>
            {
                let value = properties.get(property).cloned().unwrap_or_else(|| {
                    warn!(
                        "Output resource {} returned no property '{}' for computed value '{}'",
                        local_id, property, name
                    );
                    String::new()
                });
                computed_values.insert(name.clone(), Value::String(value));
            }
            ComputedValueReference::Pointer {
                local_id,
                pointer: path,
            } if *local_id == deployed.local_id => {
                let null = Value::Null;
                let document = deployed.resource.as_ref().unwrap_or(&null);
                let value = pointer::extract(document, path).map_err(|source| {
                    EngineError::ComputedValueResolution {
                        name: name.clone(),
                        pointer: path.clone(),
                        source,
                    }
                })?;
                computed_values.insert(name.clone(), value.clone());
            }
            _ => {}
        }
    }
    Ok(())
}

#[async_trait]
impl DeploymentProcessor for ResourceDeploymentProcessor {
    async fn deploy(&self, operation_id: &ResourceId, resource: &Resource) -> DeployResult<()> {
        let resource_id = operation_id.truncate();
        info!("Deploying resource {} (operation {})", resource_id, operation_id);
        let result = self.deploy_resource(&resource_id, resource).await;
        if result.is_ok() {
            info!("Resource {} deployed successfully", resource_id);
        }
        self.finish(operation_id, result).await
    }

    async fn delete(&self, operation_id: &ResourceId, resource: &Resource) -> DeployResult<()> {
        let resource_id = operation_id.truncate();
        info!("Deleting resource {} (operation {})", resource_id, operation_id);
        let result = self.delete_resource(&resource_id, resource).await;
        if result.is_ok() {
            info!("Resource {} deleted successfully", resource_id);
        }
        self.finish(operation_id, result).await
    }

    async fn fetch_secrets(
        &self,
        id: &ResourceId,
        resource: &Resource,
    ) -> EngineResult<BTreeMap<String, Value>> {
        debug!("Fetching secrets of {}", id);
        self.secrets.fetch_secrets(id, resource).await
    }

    async fn reconcile(&self, operation_id: &ResourceId) -> DeployResult<()> {
        let resource_id = operation_id.truncate();
        let result = self.reconcile_resource(&resource_id).await;
        self.finish(operation_id, result).await
    }
}

impl std::fmt::Debug for ResourceDeploymentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDeploymentProcessor")
            .field("model", &self.model)
            .field("gc_mode", &self.gc_mode)
            .finish()
    }
}
