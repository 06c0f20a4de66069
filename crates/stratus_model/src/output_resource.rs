//! Output resources: the concrete infrastructure objects a resource renders to.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GraphError;
use crate::graph::{self, DependencyItem};
use crate::identity::ResourceIdentity;
use crate::kinds::ResourceType;

/// A dependency on another output resource of the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub local_id: String,
}

impl Dependency {
    pub fn new(local_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
        }
    }
}

/// Provisioning state of a resource or output resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProvisioningState {
    #[default]
    Accepted,
    Provisioning,
    Updating,
    Deleting,
    Succeeded,
    Failed,
    Canceled,
}

impl ProvisioningState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Provisioning => "Provisioning",
            Self::Updating => "Updating",
            Self::Deleting => "Deleting",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health of a deployed output resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthState {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
    /// The output resource is not health-monitored.
    NotApplicable,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Healthy => "Healthy",
            Self::Unhealthy => "Unhealthy",
            Self::NotApplicable => "NotApplicable",
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputResourceStatus {
    #[serde(default)]
    pub provisioning_state: ProvisioningState,
    #[serde(default)]
    pub health_state: HealthState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One concrete infrastructure object owned by a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputResource {
    /// Unique within the owning resource.
    pub local_id: String,
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ResourceIdentity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    /// Raw rendered or deployed representation. Never persisted.
    #[serde(skip)]
    pub resource: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub persisted_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub status: OutputResourceStatus,
}

impl OutputResource {
    pub fn new(local_id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            local_id: local_id.into(),
            resource_type,
            identity: None,
            dependencies: Vec::new(),
            resource: None,
            persisted_properties: BTreeMap::new(),
            status: OutputResourceStatus::default(),
        }
    }

    pub fn with_dependency(mut self, local_id: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::new(local_id));
        self
    }

    pub fn with_identity(mut self, identity: ResourceIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_resource(mut self, resource: Value) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Local IDs this output resource depends on.
    ///
    /// # Errors
    ///
    /// Fails when any dependency has an empty local ID.
    pub fn get_dependencies(&self) -> Result<Vec<String>, GraphError> {
        self.dependencies
            .iter()
            .map(|d| {
                if d.local_id.is_empty() {
                    Err(GraphError::EmptyDependency {
                        key: self.local_id.clone(),
                    })
                } else {
                    Ok(d.local_id.clone())
                }
            })
            .collect()
    }

    /// Whether the output resource carries a usable platform identity.
    pub fn has_identity(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| !i.is_empty())
    }

    /// Copy suitable for persistence: the raw representation is dropped.
    pub fn for_persistence(&self) -> Self {
        Self {
            resource: None,
            ..self.clone()
        }
    }
}

impl DependencyItem for OutputResource {
    fn key(&self) -> &str {
        &self.local_id
    }

    fn dependencies(&self) -> Result<Vec<String>, GraphError> {
        self.get_dependencies()
    }
}

/// Order output resources for deployment.
pub fn order_output_resources(
    resources: &[OutputResource],
) -> Result<Vec<OutputResource>, GraphError> {
    graph::order(resources)
}

/// Output resources of `before` that no longer exist in `after`.
///
/// An entry is stale when its local ID is absent from `after`, or when none
/// of the `after` entries with the same local ID has the same kind and
/// provider. Identity and properties are not compared. The result keeps the
/// order of `before`.
pub fn gc_output_resources(
    after: &[OutputResource],
    before: &[OutputResource],
) -> Vec<OutputResource> {
    let mut current: HashMap<&str, Vec<&ResourceType>> = HashMap::new();
    for resource in after {
        current
            .entry(resource.local_id.as_str())
            .or_default()
            .push(&resource.resource_type);
    }

    before
        .iter()
        .filter(|old| match current.get(old.local_id.as_str()) {
            None => true,
            Some(types) => !types.iter().any(|t| **t == old.resource_type),
        })
        .cloned()
        .collect()
}
