//! Handler contracts for output resources.
//!
//! Each registered output resource kind has a [`ResourceHandler`] that
//! creates, updates and deletes the underlying object, and a
//! [`HealthHandler`] that decides how it is probed. Secrets are read through
//! a single [`SecretValueClient`] and optionally post-processed by a
//! [`SecretValueTransformer`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use stratus_health::HealthCheckOptions;
use stratus_model::{OutputResource, ResourceIdentity};

use crate::error::HandlerResult;
use crate::renderer::RendererDependency;

/// Inputs of [`ResourceHandler::put`].
#[derive(Debug)]
pub struct PutOptions<'a> {
    pub application_name: &'a str,
    pub resource_name: &'a str,
    /// Desired state. The handler records the deployed identity and
    /// representation here.
    pub resource: OutputResource,
    /// State persisted by the previous deployment, if any.
    pub existing: Option<&'a OutputResource>,
    /// Properties returned by handlers of the output resources deployed so far.
    pub dependency_properties: &'a BTreeMap<String, BTreeMap<String, String>>,
}

/// Inputs of [`ResourceHandler::delete`].
#[derive(Debug)]
pub struct DeleteOptions<'a> {
    pub application_name: &'a str,
    pub resource_name: &'a str,
    pub existing: &'a OutputResource,
}

#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Create or update an output resource and return its properties.
    async fn put(&self, options: &mut PutOptions<'_>) -> HandlerResult<BTreeMap<String, String>>;

    async fn delete(&self, options: &DeleteOptions<'_>) -> HandlerResult<()>;
}

pub trait HealthHandler: Send + Sync {
    /// Options for probing the output resource, or `None` to use the
    /// processor's configured defaults.
    fn get_health_options(&self, resource: &OutputResource) -> Option<HealthCheckOptions>;
}

/// Health handler returning the same options for every output resource.
///
/// The default instance defers to the processor's configured options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHealthHandler {
    options: Option<HealthCheckOptions>,
}

impl DefaultHealthHandler {
    pub fn new(options: HealthCheckOptions) -> Self {
        Self {
            options: Some(options),
        }
    }
}

impl HealthHandler for DefaultHealthHandler {
    fn get_health_options(&self, _resource: &OutputResource) -> Option<HealthCheckOptions> {
        self.options
    }
}

/// Reads secret values from deployed output resources.
#[async_trait]
pub trait SecretValueClient: Send + Sync {
    async fn fetch_secret(
        &self,
        identity: &ResourceIdentity,
        action: Option<&str>,
        value_selector: Option<&str>,
    ) -> HandlerResult<Value>;
}

/// Post-processes a fetched secret, e.g. to build a connection string.
#[async_trait]
pub trait SecretValueTransformer: Send + Sync {
    async fn transform(
        &self,
        dependency: &RendererDependency,
        value: Value,
    ) -> HandlerResult<Value>;
}
