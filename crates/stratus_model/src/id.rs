//! Resource identifiers.
//!
//! A resource ID is a path of scope pairs followed by an optional provider
//! section:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}[/{type}/{name}]*
//! /planes/{plane type}/{plane name}/resourceGroups/{rg}/providers/...
//! ```
//!
//! A leading `planes` segment marks a UCP-qualified ID; the plane itself is
//! the first scope pair.
//!
//! Operation IDs are resource IDs with one more type segment appended
//! (for example `.../containers/web/operationResults/{uuid}`), so
//! [`ResourceId::truncate`] recovers the resource an operation acts on.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

const PLANES_SEGMENT: &str = "planes";
const PROVIDERS_SEGMENT: &str = "providers";
const SUBSCRIPTIONS_SEGMENT: &str = "subscriptions";
const RESOURCE_GROUPS_SEGMENT: &str = "resourcegroups";

/// A `{kind}/{name}` pair in the scope portion of an ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeSegment {
    pub kind: String,
    pub name: String,
}

/// A `{type}/{name}` pair in the provider portion of an ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSegment {
    pub kind: String,
    pub name: String,
}

/// A parsed resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    id: String,
    ucp_qualified: bool,
    scopes: Vec<ScopeSegment>,
    namespace: Option<String>,
    types: Vec<TypeSegment>,
}

impl ResourceId {
    /// Parse a resource ID.
    pub fn parse(id: &str) -> ModelResult<Self> {
        let invalid = |reason: &str| ModelError::InvalidResourceId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = id.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(invalid("must contain at least one segment"));
        }

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("contains an empty segment"));
        }

        let ucp_qualified = segments[0].eq_ignore_ascii_case(PLANES_SEGMENT);
        let mut scopes = Vec::new();
        let mut index = usize::from(ucp_qualified);
        while index < segments.len() && !segments[index].eq_ignore_ascii_case(PROVIDERS_SEGMENT) {
            let Some(name) = segments.get(index + 1) else {
                return Err(invalid("scope segment is missing a name"));
            };
            scopes.push(ScopeSegment {
                kind: segments[index].to_string(),
                name: name.to_string(),
            });
            index += 2;
        }

        let mut namespace = None;
        let mut types = Vec::new();
        if index < segments.len() {
            let Some(ns) = segments.get(index + 1) else {
                return Err(invalid("'providers' must be followed by a namespace"));
            };
            namespace = Some(ns.to_string());
            index += 2;

            if index >= segments.len() {
                return Err(invalid("namespace must be followed by a resource type"));
            }
            while index < segments.len() {
                let Some(name) = segments.get(index + 1) else {
                    return Err(invalid("resource type segment is missing a name"));
                };
                types.push(TypeSegment {
                    kind: segments[index].to_string(),
                    name: name.to_string(),
                });
                index += 2;
            }
        }

        Ok(Self::from_parts(ucp_qualified, scopes, namespace, types))
    }

    fn from_parts(
        ucp_qualified: bool,
        scopes: Vec<ScopeSegment>,
        namespace: Option<String>,
        types: Vec<TypeSegment>,
    ) -> Self {
        let mut id = String::new();
        if ucp_qualified {
            id.push('/');
            id.push_str(PLANES_SEGMENT);
        }
        for scope in &scopes {
            id.push('/');
            id.push_str(&scope.kind);
            id.push('/');
            id.push_str(&scope.name);
        }
        if let Some(ns) = &namespace {
            id.push_str("/providers/");
            id.push_str(ns);
            for segment in &types {
                id.push('/');
                id.push_str(&segment.kind);
                id.push('/');
                id.push_str(&segment.name);
            }
        }
        Self {
            id,
            ucp_qualified,
            scopes,
            namespace,
            types,
        }
    }

    /// The normalized string form of the ID.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Whether the ID starts with `/planes`.
    pub fn is_ucp_qualified(&self) -> bool {
        self.ucp_qualified
    }

    /// Scope pairs; for a UCP-qualified ID the first pair is the plane.
    pub fn scopes(&self) -> &[ScopeSegment] {
        &self.scopes
    }

    pub fn types(&self) -> &[TypeSegment] {
        &self.types
    }

    pub fn provider_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the ID names a resource (rather than a bare scope).
    pub fn is_resource(&self) -> bool {
        !self.types.is_empty()
    }

    fn find_scope(&self, kind: &str) -> Option<&str> {
        self.scopes
            .iter()
            .find(|s| s.kind.eq_ignore_ascii_case(kind))
            .map(|s| s.name.as_str())
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.find_scope(SUBSCRIPTIONS_SEGMENT)
    }

    pub fn resource_group(&self) -> Option<&str> {
        self.find_scope(RESOURCE_GROUPS_SEGMENT)
    }

    /// The name of the last type segment.
    pub fn name(&self) -> Option<&str> {
        self.types.last().map(|t| t.name.as_str())
    }

    /// The fully qualified type, e.g. `Applications.Core/containers`.
    pub fn resource_type(&self) -> Option<String> {
        let ns = self.namespace.as_ref()?;
        if self.types.is_empty() {
            return None;
        }
        let mut qualified = ns.clone();
        for segment in &self.types {
            qualified.push('/');
            qualified.push_str(&segment.kind);
        }
        Some(qualified)
    }

    /// Drop the trailing type segment.
    ///
    /// An ID with a single type segment is returned unchanged.
    pub fn truncate(&self) -> ResourceId {
        if self.types.len() <= 1 {
            return self.clone();
        }
        let mut types = self.types.clone();
        types.pop();
        Self::from_parts(
            self.ucp_qualified,
            self.scopes.clone(),
            self.namespace.clone(),
            types,
        )
    }

    /// Append a child type segment.
    pub fn append(
        &self,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> ModelResult<ResourceId> {
        if self.namespace.is_none() {
            return Err(ModelError::InvalidResourceId {
                id: self.id.clone(),
                reason: "cannot append a type segment to a scope id".to_string(),
            });
        }
        let mut types = self.types.clone();
        types.push(TypeSegment {
            kind: kind.into(),
            name: name.into(),
        });
        Ok(Self::from_parts(
            self.ucp_qualified,
            self.scopes.clone(),
            self.namespace.clone(),
            types,
        ))
    }

    /// Case-insensitive key, suitable for store lookups.
    pub fn storage_key(&self) -> String {
        self.id.to_lowercase()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceId> for String {
    fn from(value: ResourceId) -> Self {
        value.id
    }
}

impl Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
