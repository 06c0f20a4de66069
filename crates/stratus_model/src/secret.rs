//! References to secrets held by deployed output resources.

use serde::{Deserialize, Serialize};

use crate::kinds::ResourceType;

/// How to obtain one secret value of a resource.
///
/// Either `value` carries the secret directly, or the secret is fetched from
/// the output resource named by `local_id` using `action` and
/// `value_selector`. The fetched value is optionally post-processed by the
/// transformer registered for `transformer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretValueReference {
    #[serde(default)]
    pub local_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<ResourceType>,
}

impl SecretValueReference {
    /// A secret fetched from the output resource `local_id`.
    pub fn from_output(local_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            ..Default::default()
        }
    }

    /// A secret whose value is already known at render time.
    pub fn embedded(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.value_selector = Some(selector.into());
        self
    }

    pub fn with_transformer(mut self, transformer: ResourceType) -> Self {
        self.transformer = Some(transformer);
        self
    }
}
