//! Resource kinds, output resource kinds and providers.
//!
//! Every dispatch axis of the engine has exactly one enum here:
//!
//! - [`ResourceKind`]: application resource types, keyed to renderers
//! - [`OutputResourceKind`]: concrete infrastructure objects, keyed to handlers
//! - [`Provider`]: the platform an output resource lives on
//!
//! All of them serialize as plain strings so persisted state stays readable.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Platforms an output resource can be deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Azure,
    Aws,
    Kubernetes,
    Radius,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Azure => "azure",
            Provider::Aws => "aws",
            Provider::Kubernetes => "kubernetes",
            Provider::Radius => "radius",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "azure" => Some(Provider::Azure),
            "aws" => Some(Provider::Aws),
            "kubernetes" => Some(Provider::Kubernetes),
            "radius" => Some(Provider::Radius),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Provider::Azure,
            Provider::Aws,
            Provider::Kubernetes,
            Provider::Radius,
        ]
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Provider {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Provider::from_str(value).ok_or_else(|| ModelError::UnknownProvider(value.to_string()))
    }
}

/// Kinds of concrete infrastructure objects produced by renderers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputResourceKind {
    Deployment,
    Service,
    Secret,
    ServiceAccount,
    KubernetesRole,
    KubernetesRoleBinding,
    KubernetesHttpRoute,
    SecretProviderClass,
    Gateway,
    AzureUserAssignedManagedIdentity,
    AzureRoleAssignment,
    AzureFederatedIdentity,
    AzurePodIdentity,
    AzureKeyVault,
    AzureCosmosDbAccount,
    AzureRedisCache,
    DaprComponent,
    RadiusResource,
    Custom(String),
}

impl OutputResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::Secret => "Secret",
            Self::ServiceAccount => "ServiceAccount",
            Self::KubernetesRole => "KubernetesRole",
            Self::KubernetesRoleBinding => "KubernetesRoleBinding",
            Self::KubernetesHttpRoute => "KubernetesHTTPRoute",
            Self::SecretProviderClass => "SecretProviderClass",
            Self::Gateway => "Gateway",
            Self::AzureUserAssignedManagedIdentity => "azure.userassignedmanagedidentity",
            Self::AzureRoleAssignment => "azure.roleassignment",
            Self::AzureFederatedIdentity => "azure.federatedidentity",
            Self::AzurePodIdentity => "azure.aadpodidentity",
            Self::AzureKeyVault => "azure.keyvault",
            Self::AzureCosmosDbAccount => "azure.cosmosdb.account",
            Self::AzureRedisCache => "azure.redis",
            Self::DaprComponent => "dapr.io.Component",
            Self::RadiusResource => "radius.resource",
            Self::Custom(s) => s.as_str(),
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Deployment" => Self::Deployment,
            "Service" => Self::Service,
            "Secret" => Self::Secret,
            "ServiceAccount" => Self::ServiceAccount,
            "KubernetesRole" => Self::KubernetesRole,
            "KubernetesRoleBinding" => Self::KubernetesRoleBinding,
            "KubernetesHTTPRoute" => Self::KubernetesHttpRoute,
            "SecretProviderClass" => Self::SecretProviderClass,
            "Gateway" => Self::Gateway,
            "azure.userassignedmanagedidentity" => Self::AzureUserAssignedManagedIdentity,
            "azure.roleassignment" => Self::AzureRoleAssignment,
            "azure.federatedidentity" => Self::AzureFederatedIdentity,
            "azure.aadpodidentity" => Self::AzurePodIdentity,
            "azure.keyvault" => Self::AzureKeyVault,
            "azure.cosmosdb.account" => Self::AzureCosmosDbAccount,
            "azure.redis" => Self::AzureRedisCache,
            "dapr.io.Component" => Self::DaprComponent,
            "radius.resource" => Self::RadiusResource,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for OutputResourceKind {
    fn from(value: String) -> Self {
        Self::from_str(&value)
    }
}

impl From<OutputResourceKind> for String {
    fn from(value: OutputResourceKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for OutputResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The dispatch key of an output resource: what it is and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceType {
    #[serde(rename = "type")]
    pub kind: OutputResourceKind,
    pub provider: Provider,
}

impl ResourceType {
    pub fn new(kind: OutputResourceKind, provider: Provider) -> Self {
        Self { kind, provider }
    }

    pub fn kubernetes(kind: OutputResourceKind) -> Self {
        Self::new(kind, Provider::Kubernetes)
    }

    pub fn azure(kind: OutputResourceKind) -> Self {
        Self::new(kind, Provider::Azure)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Provider: {}, Type: {}", self.provider, self.kind)
    }
}

/// Application resource types, each rendered by one renderer.
///
/// Matching is case-insensitive on the fully qualified type name, the way
/// resource IDs compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Application,
    Environment,
    Container,
    Gateway,
    HttpRoute,
    Volume,
    SecretStore,
    Extender,
    MongoDatabase,
    RedisCache,
    SqlDatabase,
    RabbitMqQueue,
    DaprStateStore,
    DaprSecretStore,
    DaprPubSubBroker,
    Custom(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Application => "Applications.Core/applications",
            Self::Environment => "Applications.Core/environments",
            Self::Container => "Applications.Core/containers",
            Self::Gateway => "Applications.Core/gateways",
            Self::HttpRoute => "Applications.Core/httpRoutes",
            Self::Volume => "Applications.Core/volumes",
            Self::SecretStore => "Applications.Core/secretStores",
            Self::Extender => "Applications.Core/extenders",
            Self::MongoDatabase => "Applications.Datastores/mongoDatabases",
            Self::RedisCache => "Applications.Datastores/redisCaches",
            Self::SqlDatabase => "Applications.Datastores/sqlDatabases",
            Self::RabbitMqQueue => "Applications.Messaging/rabbitMQQueues",
            Self::DaprStateStore => "Applications.Dapr/stateStores",
            Self::DaprSecretStore => "Applications.Dapr/secretStores",
            Self::DaprPubSubBroker => "Applications.Dapr/pubSubBrokers",
            Self::Custom(s) => s.as_str(),
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "applications.core/applications" => Self::Application,
            "applications.core/environments" => Self::Environment,
            "applications.core/containers" => Self::Container,
            "applications.core/gateways" => Self::Gateway,
            "applications.core/httproutes" => Self::HttpRoute,
            "applications.core/volumes" => Self::Volume,
            "applications.core/secretstores" => Self::SecretStore,
            "applications.core/extenders" => Self::Extender,
            "applications.datastores/mongodatabases" => Self::MongoDatabase,
            "applications.datastores/rediscaches" => Self::RedisCache,
            "applications.datastores/sqldatabases" => Self::SqlDatabase,
            "applications.messaging/rabbitmqqueues" => Self::RabbitMqQueue,
            "applications.dapr/statestores" => Self::DaprStateStore,
            "applications.dapr/secretstores" => Self::DaprSecretStore,
            "applications.dapr/pubsubbrokers" => Self::DaprPubSubBroker,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for ResourceKind {
    fn from(value: String) -> Self {
        Self::from_str(&value)
    }
}

impl From<ResourceKind> for String {
    fn from(value: ResourceKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip() {
        for provider in Provider::all() {
            assert_eq!(Provider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(Provider::from_str("KUBERNETES"), Some(Provider::Kubernetes));
        assert!(Provider::try_from("gcp").is_err());
    }

    #[test]
    fn test_output_kind_custom_fallback() {
        let kind = OutputResourceKind::from_str("example.com/Widget");
        assert_eq!(kind, OutputResourceKind::Custom("example.com/Widget".to_string()));
        assert_eq!(kind.as_str(), "example.com/Widget");
    }

    #[test]
    fn test_resource_type_serializes_as_strings() {
        let rt = ResourceType::azure(OutputResourceKind::AzureRoleAssignment);
        let json = serde_json::to_value(&rt).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "azure.roleassignment", "provider": "azure"})
        );

        let parsed: ResourceType = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, rt);
    }

    #[test]
    fn test_resource_kind_is_case_insensitive() {
        assert_eq!(
            ResourceKind::from_str("applications.core/CONTAINERS"),
            ResourceKind::Container
        );
        assert_eq!(
            ResourceKind::from_str("Example.Custom/widgets"),
            ResourceKind::Custom("example.custom/widgets".to_string())
        );
    }
}
