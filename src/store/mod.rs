//! Resource store capability traits.
//!
//! The orchestrator never owns durable state. It reads and writes through
//! [`ResourceRepository`] and [`InventoryResourceRepository`], which any
//! storage engine can implement. Implementations must be safe to call
//! concurrently; the orchestrator takes no locks around them.
//!
//! A lookup miss must be reported as [`StoreError::NotFound`]. It is the only
//! store error the orchestrator recovers from; everything else surfaces as
//! [`ErrorKind::Database`](crate::ErrorKind::Database).

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{InventoryResource, ReporterResourceId, ReporterResourceUniqueIndex, Resource};

/// Errors reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No record matches the lookup key.
    #[error("record not found")]
    NotFound,

    /// A unique constraint was violated.
    #[error("duplicated key: {0}")]
    DuplicatedKey(String),

    /// Any other storage failure.
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }

    /// Returns `true` for a lookup miss.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Result of a write: the stored record plus any sibling records touched by
/// the same logical write.
pub type WriteResult = Result<(Resource, Vec<Resource>), StoreError>;

/// Reporter-resource persistence.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Inserts a new record and returns it with its assigned id.
    async fn create(&self, resource: &Resource) -> WriteResult;

    /// Replaces the record stored under `id`.
    async fn update(&self, resource: &Resource, id: Uuid) -> WriteResult;

    /// Removes the record stored under `id` and returns it.
    async fn delete(&self, id: Uuid) -> Result<Resource, StoreError>;

    /// Looks a record up through the current unique index.
    async fn find_by_unique_index(
        &self,
        index: &ReporterResourceUniqueIndex,
    ) -> Result<Resource, StoreError>;

    /// Looks a record up through the legacy reporter identity.
    async fn find_by_reporter_resource_id(
        &self,
        id: &ReporterResourceId,
    ) -> Result<Resource, StoreError>;

    /// Returns every record in a workspace. An empty workspace is `Ok(vec![])`.
    async fn find_by_workspace_id(&self, workspace_id: &str) -> Result<Vec<Resource>, StoreError>;
}

/// Read access to the aggregated inventory.
#[async_trait]
pub trait InventoryResourceRepository: Send + Sync {
    /// Returns the inventory resource with the given id.
    async fn find_by_id(&self, id: Uuid) -> Result<InventoryResource, StoreError>;
}
