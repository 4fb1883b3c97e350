//! InMemoryResourceRepository for integration tests with real lookup semantics.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::store::{InventoryResourceRepository, ResourceRepository, StoreError, WriteResult};
use crate::types::{InventoryResource, ReporterResourceId, ReporterResourceUniqueIndex, Resource};

/// A store that keeps resources in memory.
///
/// Unlike [`MockResourceRepository`](super::MockResourceRepository),
/// this store actually persists records and answers both lookup schemes
/// from them, so lifecycle sequences behave as they would against a
/// database.
///
/// - ids are assigned on create (UUIDv7)
/// - the current unique index is enforced: a second create for the same
///   reporter identity and resource type fails with
///   [`StoreError::DuplicatedKey`]
/// - `created_at`/`updated_at` are maintained
///
/// ## Example
///
/// ```rust
/// use inventory_authz::testing::InMemoryResourceRepository;
///
/// let store = InMemoryResourceRepository::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceRepository {
    resources: Arc<RwLock<BTreeMap<Uuid, Resource>>>,
}

fn matches_unique_index(resource: &Resource, index: &ReporterResourceUniqueIndex) -> bool {
    resource.reporter_id() == index.reporter_id
        && resource.reporter_type() == index.reporter_type
        && resource.local_resource_id() == index.local_resource_id
        && resource.resource_type == index.resource_type
        && index.inventory_id.is_none_or(|id| id == resource.id)
}

fn matches_reporter_resource_id(resource: &Resource, id: &ReporterResourceId) -> bool {
    resource.reporter_id() == id.reporter_id
        && resource.reporter_type() == id.reporter_type
        && resource.local_resource_id() == id.local_resource_id
        && id
            .resource_type
            .as_deref()
            .is_none_or(|t| t == resource.resource_type)
}

impl InMemoryResourceRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, bypassing the unique index.
    ///
    /// Use this to seed records that only the legacy identity can reach.
    /// A nil id is replaced with a fresh one.
    pub fn seed(&self, mut resource: Resource) -> Resource {
        if resource.id.is_nil() {
            resource.id = Uuid::now_v7();
        }
        self.resources.write().insert(resource.id, resource.clone());
        resource
    }

    /// Returns the record stored under `id`.
    pub fn get(&self, id: Uuid) -> Option<Resource> {
        self.resources.read().get(&id).cloned()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Removes every record.
    pub fn clear(&self) {
        self.resources.write().clear();
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn create(&self, resource: &Resource) -> WriteResult {
        let index = ReporterResourceUniqueIndex {
            reporter_id: resource.reporter_id().to_owned(),
            reporter_type: resource.reporter_type().to_owned(),
            local_resource_id: resource.local_resource_id().to_owned(),
            resource_type: resource.resource_type.clone(),
            inventory_id: None,
        };

        let mut resources = self.resources.write();
        if resources.values().any(|r| matches_unique_index(r, &index)) {
            return Err(StoreError::DuplicatedKey(format!(
                "reporter resource {}/{}",
                index.reporter_id, index.local_resource_id
            )));
        }

        let now = Utc::now();
        let mut created = resource.clone();
        created.id = Uuid::now_v7();
        created.created_at = Some(now);
        created.updated_at = Some(now);
        resources.insert(created.id, created.clone());

        Ok((created, Vec::new()))
    }

    async fn update(&self, resource: &Resource, id: Uuid) -> WriteResult {
        let mut resources = self.resources.write();
        let Some(existing) = resources.get_mut(&id) else {
            return Err(StoreError::NotFound);
        };

        let created_at = existing.created_at;
        *existing = resource.clone();
        existing.id = id;
        existing.created_at = created_at;
        existing.updated_at = Some(Utc::now());

        Ok((existing.clone(), Vec::new()))
    }

    async fn delete(&self, id: Uuid) -> Result<Resource, StoreError> {
        self.resources.write().remove(&id).ok_or(StoreError::NotFound)
    }

    async fn find_by_unique_index(
        &self,
        index: &ReporterResourceUniqueIndex,
    ) -> Result<Resource, StoreError> {
        self.resources
            .read()
            .values()
            .find(|r| matches_unique_index(r, index))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_reporter_resource_id(
        &self,
        id: &ReporterResourceId,
    ) -> Result<Resource, StoreError> {
        self.resources
            .read()
            .values()
            .find(|r| matches_reporter_resource_id(r, id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_workspace_id(&self, workspace_id: &str) -> Result<Vec<Resource>, StoreError> {
        Ok(self
            .resources
            .read()
            .values()
            .filter(|r| r.workspace_id == workspace_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InventoryResourceRepository for InMemoryResourceRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<InventoryResource, StoreError> {
        let resources = self.resources.read();
        let resource = resources.get(&id).ok_or(StoreError::NotFound)?;
        Ok(InventoryResource {
            id: resource.id,
            resource_type: resource.resource_type.clone(),
            workspace_id: resource.workspace_id.clone(),
            org_id: resource.org_id.clone(),
            resource_data: resource.resource_data.clone(),
            consistency_token: resource.consistency_token.clone(),
        })
    }
}
