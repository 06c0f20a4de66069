//! Persistence contract for resources and operations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use stratus_model::{Operation, Resource, ResourceId};

use crate::error::{StoreError, StoreResult};

/// Storage used by the deployment processor.
///
/// Implementations must report a missing record as [`StoreError::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_resource(&self, id: &ResourceId) -> StoreResult<Resource>;

    /// Create or replace the persisted state of the resource at `id`.
    async fn update_resource_status(
        &self,
        id: &ResourceId,
        resource: &Resource,
    ) -> StoreResult<()>;

    async fn delete_resource(&self, id: &ResourceId) -> StoreResult<()>;

    async fn get_operation(&self, id: &str) -> StoreResult<Operation>;

    /// Replace an existing operation record.
    async fn patch_operation(&self, operation: &Operation) -> StoreResult<()>;
}

/// In-memory store. IDs are compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    resources: Arc<RwLock<HashMap<String, Resource>>>,
    operations: Arc<RwLock<HashMap<String, Operation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_resource(&self, resource: Resource) {
        self.resources
            .write()
            .insert(resource.id.storage_key(), resource);
    }

    pub fn insert_operation(&self, operation: Operation) {
        self.operations
            .write()
            .insert(operation.id.to_lowercase(), operation);
    }

    pub fn resource(&self, id: &ResourceId) -> Option<Resource> {
        self.resources.read().get(&id.storage_key()).cloned()
    }

    pub fn operation(&self, id: &str) -> Option<Operation> {
        self.operations.read().get(&id.to_lowercase()).cloned()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.read().len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_resource(&self, id: &ResourceId) -> StoreResult<Resource> {
        self.resource(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_resource_status(
        &self,
        id: &ResourceId,
        resource: &Resource,
    ) -> StoreResult<()> {
        self.resources
            .write()
            .insert(id.storage_key(), resource.clone());
        Ok(())
    }

    async fn delete_resource(&self, id: &ResourceId) -> StoreResult<()> {
        self.resources
            .write()
            .remove(&id.storage_key())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_operation(&self, id: &str) -> StoreResult<Operation> {
        self.operation(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn patch_operation(&self, operation: &Operation) -> StoreResult<()> {
        let mut operations = self.operations.write();
        match operations.get_mut(&operation.id.to_lowercase()) {
            Some(existing) => {
                *existing = operation.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(operation.id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use stratus_model::OperationStatus;

    fn resource_id() -> ResourceId {
        ResourceId::parse(concat!(
            "/planes/radius/local/resourceGroups/default",
            "/providers/Applications.Core/containers/web",
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_resource_crud() {
        let store = MemoryStore::new();
        let id = resource_id();

        let err = store.get_resource(&id).await.unwrap_err();
        assert!(err.is_not_found());

        store
            .update_resource_status(&id, &Resource::new(id.clone(), "shop", Map::new()))
            .await
            .unwrap();

        let upper = ResourceId::parse(&id.as_str().to_uppercase()).unwrap();
        assert_eq!(store.get_resource(&upper).await.unwrap().id, id);

        store.delete_resource(&id).await.unwrap();
        assert!(store.delete_resource(&id).await.unwrap_err().is_not_found());
        assert_eq!(store.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_update_stores_under_given_id() {
        let store = MemoryStore::new();
        let id = resource_id();
        let other = ResourceId::parse(concat!(
            "/planes/radius/local/resourceGroups/default",
            "/providers/Applications.Core/containers/other",
        ))
        .unwrap();

        store
            .update_resource_status(&id, &Resource::new(other.clone(), "shop", Map::new()))
            .await
            .unwrap();

        assert!(store.resource(&id).is_some());
        assert!(store.resource(&other).is_none());
    }

    #[tokio::test]
    async fn test_patch_requires_existing_operation() {
        let store = MemoryStore::new();
        let mut operation = Operation::new("op-1", "op-1", OperationStatus::Updating);

        assert!(store.patch_operation(&operation).await.unwrap_err().is_not_found());

        store.insert_operation(operation.clone());
        operation.complete(OperationStatus::Succeeded, None);
        store.patch_operation(&operation).await.unwrap();

        let stored = store.get_operation("OP-1").await.unwrap();
        assert_eq!(stored.status, OperationStatus::Succeeded);
    }
}
