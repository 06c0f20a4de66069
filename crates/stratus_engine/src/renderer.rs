//! Renderer contract.
//!
//! A renderer turns one application resource, plus the resources it
//! connects to, into the output resources that implement it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use stratus_model::{OutputResource, Resource, ResourceId, ResourceIdentity, SecretValueReference};

use crate::error::RenderError;

/// A resource the rendered resource connects to, as seen by its renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererDependency {
    pub resource_id: ResourceId,
    pub definition: Map<String, Value>,
    /// Persisted computed values merged with freshly fetched secrets.
    pub computed_values: BTreeMap<String, Value>,
    /// Identities of the dependency's output resources by local ID.
    pub output_resources: BTreeMap<String, ResourceIdentity>,
}

impl RendererDependency {
    /// View of a persisted resource without its secrets.
    pub fn from_resource(resource: &Resource) -> Self {
        Self {
            resource_id: resource.id.clone(),
            definition: resource.definition.clone(),
            computed_values: resource.computed_values.clone(),
            output_resources: resource
                .status
                .output_resources
                .iter()
                .filter_map(|r| r.identity.clone().map(|i| (r.local_id.clone(), i)))
                .collect(),
        }
    }
}

/// How to obtain a computed value once output resources are deployed.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputedValueReference {
    /// Known at render time.
    Static { value: Value },
    /// A property returned by the handler of `local_id`.
    Property { local_id: String, property: String },
    /// A JSON pointer into the deployed representation of `local_id`.
    Pointer { local_id: String, pointer: String },
}

impl ComputedValueReference {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Static {
            value: value.into(),
        }
    }

    pub fn property(local_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self::Property {
            local_id: local_id.into(),
            property: property.into(),
        }
    }

    pub fn pointer(local_id: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self::Pointer {
            local_id: local_id.into(),
            pointer: pointer.into(),
        }
    }

    /// The output resource this value is read from, if any.
    pub fn local_id(&self) -> Option<&str> {
        match self {
            Self::Static { .. } => None,
            Self::Property { local_id, .. } | Self::Pointer { local_id, .. } => Some(local_id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RendererOutput {
    pub resources: Vec<OutputResource>,
    pub computed_values: BTreeMap<String, ComputedValueReference>,
    pub secret_values: BTreeMap<String, SecretValueReference>,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub resource: Resource,
    /// Dependencies keyed by resource ID.
    pub dependencies: BTreeMap<String, RendererDependency>,
}

/// Renders one kind of application resource.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// IDs of the resources `resource` connects to.
    async fn get_dependency_ids(&self, resource: &Resource) -> Result<Vec<ResourceId>, RenderError>;

    async fn render(&self, options: RenderOptions) -> Result<RendererOutput, RenderError>;
}
