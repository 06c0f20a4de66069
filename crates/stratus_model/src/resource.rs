//! Persisted application resources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::ResourceId;
use crate::output_resource::{OutputResource, ProvisioningState};
use crate::secret::SecretValueReference;

/// Deployment status of a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default)]
    pub provisioning_state: ProvisioningState,
    /// Output resources in deployment order.
    #[serde(default)]
    pub output_resources: Vec<OutputResource>,
    /// Stale output resources awaiting deletion by a reconcile pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_deletion: Vec<OutputResource>,
}

/// An application resource as stored between deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default)]
    pub application_name: String,
    pub resource_name: String,
    #[serde(default)]
    pub definition: Map<String, Value>,
    #[serde(default)]
    pub computed_values: BTreeMap<String, Value>,
    #[serde(default)]
    pub secret_values: BTreeMap<String, SecretValueReference>,
    #[serde(default)]
    pub status: ResourceStatus,
    #[serde(default)]
    pub provisioning_state: ProvisioningState,
}

impl Resource {
    /// Build a resource for `id`, deriving scope, type and name from it.
    pub fn new(
        id: ResourceId,
        application_name: impl Into<String>,
        definition: Map<String, Value>,
    ) -> Self {
        Self {
            resource_type: id.resource_type().unwrap_or_default(),
            subscription_id: id.subscription_id().unwrap_or_default().to_string(),
            resource_group: id.resource_group().unwrap_or_default().to_string(),
            resource_name: id.name().unwrap_or_default().to_string(),
            application_name: application_name.into(),
            definition,
            computed_values: BTreeMap::new(),
            secret_values: BTreeMap::new(),
            status: ResourceStatus::default(),
            provisioning_state: ProvisioningState::Accepted,
            id,
        }
    }

    /// Find a deployed output resource by local ID.
    pub fn output_resource(&self, local_id: &str) -> Option<&OutputResource> {
        self.status
            .output_resources
            .iter()
            .find(|r| r.local_id == local_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{OutputResourceKind, ResourceType};

    #[test]
    fn test_new_derives_fields_from_id() {
        let id = ResourceId::parse(
            "/subscriptions/sub-1/resourceGroups/rg-1/providers/Applications.Core/containers/web",
        )
        .unwrap();
        let resource = Resource::new(id, "shop", Map::new());

        assert_eq!(resource.resource_type, "Applications.Core/containers");
        assert_eq!(resource.subscription_id, "sub-1");
        assert_eq!(resource.resource_group, "rg-1");
        assert_eq!(resource.resource_name, "web");
        assert_eq!(resource.application_name, "shop");
    }

    #[test]
    fn test_output_resource_lookup() {
        let id = ResourceId::parse(
            "/subscriptions/sub-1/resourceGroups/rg-1/providers/Applications.Core/containers/web",
        )
        .unwrap();
        let mut resource = Resource::new(id, "shop", Map::new());
        resource.status.output_resources.push(OutputResource::new(
            "Deployment",
            ResourceType::kubernetes(OutputResourceKind::Deployment),
        ));

        assert!(resource.output_resource("Deployment").is_some());
        assert!(resource.output_resource("Service").is_none());
    }
}
