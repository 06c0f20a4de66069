//! Application model: the registry of renderers and output resource handlers.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use stratus_model::{Provider, ResourceKind, ResourceType};

use crate::error::{EngineError, EngineResult};
use crate::handlers::{HealthHandler, ResourceHandler, SecretValueTransformer};
use crate::renderer::Renderer;

/// Everything the engine knows about one output resource kind.
#[derive(Clone)]
pub struct OutputResourceModel {
    pub resource_type: ResourceType,
    pub resource_handler: Arc<dyn ResourceHandler>,
    pub health_handler: Arc<dyn HealthHandler>,
    pub secret_transformer: Option<Arc<dyn SecretValueTransformer>>,
    pub supports_health_monitor: bool,
}

impl OutputResourceModel {
    pub fn new(
        resource_type: ResourceType,
        resource_handler: Arc<dyn ResourceHandler>,
        health_handler: Arc<dyn HealthHandler>,
    ) -> Self {
        Self {
            resource_type,
            resource_handler,
            health_handler,
            secret_transformer: None,
            supports_health_monitor: true,
        }
    }

    pub fn with_secret_transformer(mut self, transformer: Arc<dyn SecretValueTransformer>) -> Self {
        self.secret_transformer = Some(transformer);
        self
    }

    /// Opt this kind out of health monitoring.
    pub fn without_health_monitor(mut self) -> Self {
        self.supports_health_monitor = false;
        self
    }
}

impl std::fmt::Debug for OutputResourceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputResourceModel")
            .field("resource_type", &self.resource_type)
            .field("secret_transformer", &self.secret_transformer.is_some())
            .field("supports_health_monitor", &self.supports_health_monitor)
            .finish()
    }
}

/// Registry of renderers, output resource models and supported providers.
///
/// Built once at start-up and shared read-only behind an `Arc`.
#[derive(Default)]
pub struct ApplicationModel {
    renderers: HashMap<ResourceKind, Arc<dyn Renderer>>,
    output_resources: HashMap<ResourceType, OutputResourceModel>,
    providers: BTreeSet<Provider>,
}

impl ApplicationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the renderer for a resource kind, replacing any previous one.
    pub fn register_renderer(&mut self, kind: ResourceKind, renderer: Arc<dyn Renderer>) {
        let kind = ResourceKind::from_str(kind.as_str());
        debug!("Registering renderer: {}", kind);
        self.renderers.insert(kind, renderer);
    }

    /// Register an output resource model. Its provider becomes supported.
    pub fn register_output_resource(&mut self, model: OutputResourceModel) {
        debug!("Registering output resource model: {}", model.resource_type);
        self.providers.insert(model.resource_type.provider);
        self.output_resources
            .insert(model.resource_type.clone(), model);
    }

    /// Mark a provider as supported without registering any handler for it.
    pub fn register_provider(&mut self, provider: Provider) {
        debug!("Registering provider: {}", provider);
        self.providers.insert(provider);
    }

    pub fn lookup_renderer(&self, kind: &ResourceKind) -> EngineResult<Arc<dyn Renderer>> {
        let kind = ResourceKind::from_str(kind.as_str());
        self.renderers
            .get(&kind)
            .cloned()
            .ok_or_else(|| EngineError::UnsupportedResourceKind(kind.to_string()))
    }

    pub fn lookup_output_resource(
        &self,
        resource_type: &ResourceType,
    ) -> EngineResult<&OutputResourceModel> {
        self.output_resources
            .get(resource_type)
            .ok_or_else(|| EngineError::UnsupportedOutputResourceKind(resource_type.clone()))
    }

    pub fn lookup_handlers(
        &self,
        resource_type: &ResourceType,
    ) -> EngineResult<(Arc<dyn ResourceHandler>, Arc<dyn HealthHandler>)> {
        let model = self.lookup_output_resource(resource_type)?;
        Ok((model.resource_handler.clone(), model.health_handler.clone()))
    }

    /// The transformer registered for `resource_type`.
    pub fn lookup_secret_transformer(
        &self,
        resource_type: &ResourceType,
    ) -> EngineResult<Arc<dyn SecretValueTransformer>> {
        self.output_resources
            .get(resource_type)
            .and_then(|m| m.secret_transformer.clone())
            .ok_or_else(|| EngineError::MissingSecretTransformer(resource_type.clone()))
    }

    pub fn is_provider_supported(&self, provider: Provider) -> bool {
        self.providers.contains(&provider)
    }

    pub fn supports_health_monitor(&self, resource_type: &ResourceType) -> bool {
        self.output_resources
            .get(resource_type)
            .is_some_and(|m| m.supports_health_monitor)
    }

    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    pub fn output_resource_count(&self) -> usize {
        self.output_resources.len()
    }
}

impl std::fmt::Debug for ApplicationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationModel")
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .field(
                "output_resources",
                &self.output_resources.keys().collect::<Vec<_>>(),
            )
            .field("providers", &self.providers)
            .finish()
    }
}
