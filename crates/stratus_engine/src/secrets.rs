//! Secret fetching for deployed resources.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use stratus_model::{Resource, ResourceId, SecretValueReference};

use crate::error::{EngineError, EngineResult};
use crate::handlers::SecretValueClient;
use crate::registry::ApplicationModel;
use crate::renderer::RendererDependency;

/// Resolves the secret references of a persisted resource.
#[derive(Clone)]
pub struct SecretFetcher {
    model: Arc<ApplicationModel>,
    client: Option<Arc<dyn SecretValueClient>>,
}

impl SecretFetcher {
    pub fn new(
        model: Arc<ApplicationModel>,
        client: Option<Arc<dyn SecretValueClient>>,
    ) -> Self {
        Self { model, client }
    }

    /// Fetch every secret of `resource`, stored under `id`.
    ///
    /// Either all secrets resolve or the call fails; no partial map is
    /// returned.
    pub async fn fetch_secrets(
        &self,
        id: &ResourceId,
        resource: &Resource,
    ) -> EngineResult<BTreeMap<String, Value>> {
        let mut view = RendererDependency::from_resource(resource);
        view.resource_id = id.clone();
        let mut secrets = BTreeMap::new();

        for (name, reference) in &resource.secret_values {
            let mut secret = self.fetch_secret(name, id, resource, reference).await?;

            if let Some(transformer_type) = &reference.transformer {
                let transformer = self.model.lookup_secret_transformer(transformer_type)?;
                secret = transformer.transform(&view, secret).await.map_err(|source| {
                    EngineError::SecretTransform {
                        name: name.clone(),
                        resource_id: id.to_string(),
                        source,
                    }
                })?;
            }

            secrets.insert(name.clone(), secret);
        }

        debug!("Fetched {} secret(s) of {}", secrets.len(), id);
        Ok(secrets)
    }

    async fn fetch_secret(
        &self,
        name: &str,
        id: &ResourceId,
        resource: &Resource,
        reference: &SecretValueReference,
    ) -> EngineResult<Value> {
        if let Some(value) = &reference.value {
            return Ok(Value::String(value.clone()));
        }

        let dangling = || EngineError::DanglingSecretReference {
            local_id: reference.local_id.clone(),
            resource_id: id.to_string(),
        };
        let output = resource
            .output_resource(&reference.local_id)
            .ok_or_else(dangling)?;
        let identity = output.identity.as_ref().ok_or_else(dangling)?;

        let client = self.client.as_ref().ok_or(EngineError::NoCredentials)?;
        client
            .fetch_secret(
                identity,
                reference.action.as_deref(),
                reference.value_selector.as_deref(),
            )
            .await
            .map_err(|source| EngineError::SecretFetch {
                name: name.to_string(),
                resource_id: id.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for SecretFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretFetcher")
            .field("model", &self.model)
            .field("client", &self.client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{DefaultHealthHandler, SecretValueTransformer};
    use crate::error::HandlerResult;
    use crate::mock::{RecordingHandler, StaticSecretClient};
    use crate::registry::OutputResourceModel;
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use stratus_model::{
        OutputResource, OutputResourceKind, ResourceId, ResourceIdentity, ResourceType,
    };

    struct PrefixTransformer;

    #[async_trait]
    impl SecretValueTransformer for PrefixTransformer {
        async fn transform(
            &self,
            dependency: &RendererDependency,
            value: Value,
        ) -> HandlerResult<Value> {
            let host = dependency
                .computed_values
                .get("host")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(json!(format!(
                "{}:{}",
                host,
                value.as_str().unwrap_or_default()
            )))
        }
    }

    fn redis_type() -> ResourceType {
        ResourceType::azure(OutputResourceKind::AzureRedisCache)
    }

    fn cache_id() -> ResourceId {
        ResourceId::parse(concat!(
            "/planes/radius/local/resourceGroups/default",
            "/providers/Applications.Datastores/redisCaches/cache",
        ))
        .unwrap()
    }

    fn cache() -> Resource {
        let mut resource = Resource::new(cache_id(), "shop", Map::new());
        resource.status.output_resources.push(
            OutputResource::new("Redis", redis_type())
                .with_identity(ResourceIdentity::arm(
                    "/subscriptions/s/redis/cache",
                    "2020-06-01",
                )),
        );
        resource
            .computed_values
            .insert("host".to_string(), json!("cache.redis"));
        resource
    }

    fn model(with_transformer: bool) -> Arc<ApplicationModel> {
        let mut model = ApplicationModel::new();
        let mut redis = OutputResourceModel::new(
            redis_type(),
            Arc::new(RecordingHandler::new()),
            Arc::new(DefaultHealthHandler::default()),
        );
        if with_transformer {
            redis = redis.with_secret_transformer(Arc::new(PrefixTransformer));
        }
        model.register_output_resource(redis);
        Arc::new(model)
    }

    #[tokio::test]
    async fn test_embedded_value_needs_no_client() {
        let mut resource = cache();
        resource
            .secret_values
            .insert("password".to_string(), SecretValueReference::embedded("hunter2"));

        let fetcher = SecretFetcher::new(model(false), None);
        let secrets = fetcher.fetch_secrets(&cache_id(), &resource).await.unwrap();
        assert_eq!(secrets["password"], json!("hunter2"));
    }

    #[tokio::test]
    async fn test_fetch_through_client_and_transformer() {
        let mut resource = cache();
        resource.secret_values.insert(
            "connectionString".to_string(),
            SecretValueReference::from_output("Redis")
                .with_action("listKeys")
                .with_selector("/primaryKey")
                .with_transformer(redis_type()),
        );

        let client = StaticSecretClient::new().with_secret("listKeys", "/primaryKey", json!("k3y"));
        let fetcher = SecretFetcher::new(model(true), Some(Arc::new(client.clone())));

        let secrets = fetcher.fetch_secrets(&cache_id(), &resource).await.unwrap();
        assert_eq!(secrets["connectionString"], json!("cache.redis:k3y"));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_transformer() {
        let mut resource = cache();
        resource.secret_values.insert(
            "connectionString".to_string(),
            SecretValueReference::from_output("Redis").with_transformer(redis_type()),
        );
        let client = StaticSecretClient::new().with_default(json!("k3y"));
        let fetcher = SecretFetcher::new(model(false), Some(Arc::new(client)));

        let err = fetcher.fetch_secrets(&cache_id(), &resource).await.unwrap_err();
        assert!(matches!(err, EngineError::MissingSecretTransformer(_)));
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let mut resource = cache();
        resource
            .secret_values
            .insert("key".to_string(), SecretValueReference::from_output("Redis"));

        let fetcher = SecretFetcher::new(model(false), None);
        let err = fetcher.fetch_secrets(&cache_id(), &resource).await.unwrap_err();
        assert!(matches!(err, EngineError::NoCredentials));
    }

    #[tokio::test]
    async fn test_dangling_reference_returns_no_partial_map() {
        let mut resource = cache();
        resource
            .secret_values
            .insert("a".to_string(), SecretValueReference::embedded("fine"));
        resource
            .secret_values
            .insert("b".to_string(), SecretValueReference::from_output("Missing"));

        let client = StaticSecretClient::new().with_default(json!("x"));
        let fetcher = SecretFetcher::new(model(false), Some(Arc::new(client.clone())));

        let err = fetcher.fetch_secrets(&cache_id(), &resource).await.unwrap_err();
        match err {
            EngineError::DanglingSecretReference { local_id, .. } => {
                assert_eq!(local_id, "Missing")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_errors_name_the_requested_id() {
        let mut resource = cache();
        resource.id = ResourceId::parse(concat!(
            "/planes/radius/local/resourceGroups/default",
            "/providers/Applications.Datastores/redisCaches/stale",
        ))
        .unwrap();
        resource
            .secret_values
            .insert("b".to_string(), SecretValueReference::from_output("Missing"));

        let fetcher = SecretFetcher::new(model(false), None);
        let err = fetcher.fetch_secrets(&cache_id(), &resource).await.unwrap_err();
        match err {
            EngineError::DanglingSecretReference { resource_id, .. } => {
                assert_eq!(resource_id, cache_id().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transformer_sees_requested_id() {
        struct IdTransformer;

        #[async_trait]
        impl SecretValueTransformer for IdTransformer {
            async fn transform(
                &self,
                dependency: &RendererDependency,
                _value: Value,
            ) -> HandlerResult<Value> {
                Ok(json!(dependency.resource_id.to_string()))
            }
        }

        let mut resource = cache();
        resource.id = ResourceId::parse(concat!(
            "/planes/radius/local/resourceGroups/default",
            "/providers/Applications.Datastores/redisCaches/stale",
        ))
        .unwrap();
        resource.secret_values.insert(
            "id".to_string(),
            SecretValueReference::embedded("unused").with_transformer(redis_type()),
        );

        let mut model = ApplicationModel::new();
        model.register_output_resource(
            OutputResourceModel::new(
                redis_type(),
                Arc::new(RecordingHandler::new()),
                Arc::new(DefaultHealthHandler::default()),
            )
            .with_secret_transformer(Arc::new(IdTransformer)),
        );

        let fetcher = SecretFetcher::new(Arc::new(model), None);
        let secrets = fetcher.fetch_secrets(&cache_id(), &resource).await.unwrap();
        assert_eq!(secrets["id"], json!(cache_id().to_string()));
    }
}
