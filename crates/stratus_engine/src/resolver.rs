//! Loads the resources a rendered resource depends on.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use stratus_model::ResourceId;

use crate::error::{EngineError, EngineResult};
use crate::renderer::RendererDependency;
use crate::secrets::SecretFetcher;
use crate::store::Store;

#[derive(Clone)]
pub struct DependencyResolver {
    store: Arc<dyn Store>,
    secrets: SecretFetcher,
}

impl DependencyResolver {
    pub fn new(store: Arc<dyn Store>, secrets: SecretFetcher) -> Self {
        Self { store, secrets }
    }

    /// Load every dependency, keyed by resource ID.
    ///
    /// Computed values of each dependency are merged with its secrets. Any
    /// failure fails the whole call with an error naming the dependency.
    pub async fn fetch_dependencies(
        &self,
        ids: &[ResourceId],
    ) -> EngineResult<BTreeMap<String, RendererDependency>> {
        let mut dependencies = BTreeMap::new();

        for id in ids {
            let wrap = |source: EngineError| EngineError::Dependency {
                id: id.to_string(),
                source: Box::new(source),
            };

            debug!("Fetching dependency {}", id);
            let resource = self
                .store
                .get_resource(id)
                .await
                .map_err(|e| wrap(e.into()))?;
            let secrets = self
                .secrets
                .fetch_secrets(id, &resource)
                .await
                .map_err(wrap)?;

            let mut dependency = RendererDependency::from_resource(&resource);
            dependency.resource_id = id.clone();
            dependency.computed_values.extend(secrets);

            dependencies.insert(id.to_string(), dependency);
        }

        Ok(dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::registry::ApplicationModel;
    use crate::store::MockStore;
    use serde_json::{json, Map};
    use stratus_model::{Resource, SecretValueReference};

    fn id(name: &str) -> ResourceId {
        ResourceId::parse(&format!(
            "/planes/radius/local/resourceGroups/default/providers/{}/{}",
            "Applications.Datastores/redisCaches", name
        ))
        .unwrap()
    }

    fn fetcher() -> SecretFetcher {
        SecretFetcher::new(Arc::new(ApplicationModel::new()), None)
    }

    #[tokio::test]
    async fn test_merges_computed_values_and_secrets() {
        let mut store = MockStore::new();
        store.expect_get_resource().returning(|id| {
            let mut resource = Resource::new(id.clone(), "shop", Map::new());
            resource
                .computed_values
                .insert("host".to_string(), json!("cache.redis"));
            resource
                .secret_values
                .insert("password".to_string(), SecretValueReference::embedded("p@ss"));
            Ok(resource)
        });

        let resolver = DependencyResolver::new(Arc::new(store), fetcher());
        let deps = resolver.fetch_dependencies(&[id("cache")]).await.unwrap();

        let dep = &deps[id("cache").as_str()];
        assert_eq!(dep.computed_values["host"], json!("cache.redis"));
        assert_eq!(dep.computed_values["password"], json!("p@ss"));
    }

    #[tokio::test]
    async fn test_any_failure_fails_the_call() {
        let mut store = MockStore::new();
        store.expect_get_resource().returning(|id| {
            if id.name() == Some("missing") {
                Err(StoreError::NotFound(id.to_string()))
            } else {
                Ok(Resource::new(id.clone(), "shop", Map::new()))
            }
        });

        let resolver = DependencyResolver::new(Arc::new(store), fetcher());
        let err = resolver
            .fetch_dependencies(&[id("cache"), id("missing")])
            .await
            .unwrap_err();

        match err {
            EngineError::Dependency { id, .. } => assert!(id.ends_with("redisCaches/missing")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_no_dependencies() {
        let store = MockStore::new();
        let resolver = DependencyResolver::new(Arc::new(store), fetcher());
        assert!(resolver.fetch_dependencies(&[]).await.unwrap().is_empty());
    }
}
