//! Platform identities of deployed output resources.

use serde::{Deserialize, Serialize};

/// An ARM resource: resource ID plus the API version used to address it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmIdentity {
    pub id: String,
    pub api_version: String,
}

/// A Kubernetes object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesIdentity {
    pub kind: String,
    pub api_version: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// A resource addressed by a UCP-style ID (AWS and Radius resources).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UcpIdentity {
    pub id: String,
}

/// Where a deployed output resource lives on its platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceIdentity {
    Arm(ArmIdentity),
    Kubernetes(KubernetesIdentity),
    Ucp(UcpIdentity),
}

impl ResourceIdentity {
    pub fn arm(id: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self::Arm(ArmIdentity {
            id: id.into(),
            api_version: api_version.into(),
        })
    }

    pub fn kubernetes(
        kind: impl Into<String>,
        api_version: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::Kubernetes(KubernetesIdentity {
            kind: kind.into(),
            api_version: api_version.into(),
            name: name.into(),
            namespace: namespace.into(),
        })
    }

    pub fn ucp(id: impl Into<String>) -> Self {
        Self::Ucp(UcpIdentity { id: id.into() })
    }

    /// An identity that does not point at anything.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Arm(arm) => arm.id.is_empty(),
            Self::Kubernetes(k8s) => k8s.kind.is_empty() || k8s.name.is_empty(),
            Self::Ucp(ucp) => ucp.id.is_empty(),
        }
    }

    /// Compare two identities ignoring the API version.
    pub fn is_same_resource(&self, other: &ResourceIdentity) -> bool {
        match (self, other) {
            (Self::Arm(a), Self::Arm(b)) => a.id.eq_ignore_ascii_case(&b.id),
            (Self::Kubernetes(a), Self::Kubernetes(b)) => {
                a.kind == b.kind && a.namespace == b.namespace && a.name == b.name
            }
            (Self::Ucp(a), Self::Ucp(b)) => a.id.eq_ignore_ascii_case(&b.id),
            _ => false,
        }
    }

    /// A UCP-style ID for the identity.
    pub fn id(&self) -> String {
        match self {
            Self::Arm(arm) => arm.id.clone(),
            Self::Ucp(ucp) => ucp.id.clone(),
            Self::Kubernetes(k8s) => {
                let group = match k8s.api_version.rsplit_once('/') {
                    Some((group, _)) if !group.is_empty() => group,
                    _ => "core",
                };
                if k8s.namespace.is_empty() {
                    format!(
                        "/planes/kubernetes/local/providers/{}/{}/{}",
                        group, k8s.kind, k8s.name
                    )
                } else {
                    format!(
                        "/planes/kubernetes/local/namespaces/{}/providers/{}/{}/{}",
                        k8s.namespace, group, k8s.kind, k8s.name
                    )
                }
            }
        }
    }
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
