//! Scripted store double.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::Responses;
use crate::store::{InventoryResourceRepository, ResourceRepository, StoreError, WriteResult};
use crate::types::{InventoryResource, ReporterResourceId, ReporterResourceUniqueIndex, Resource};

/// Store methods, for [`MockResourceRepository::times_called`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryMethod {
    /// [`ResourceRepository::create`]
    Create,
    /// [`ResourceRepository::update`]
    Update,
    /// [`ResourceRepository::delete`]
    Delete,
    /// [`ResourceRepository::find_by_unique_index`]
    FindByUniqueIndex,
    /// [`ResourceRepository::find_by_reporter_resource_id`]
    FindByReporterResourceId,
    /// [`ResourceRepository::find_by_workspace_id`]
    FindByWorkspaceId,
    /// [`InventoryResourceRepository::find_by_id`]
    FindInventoryById,
}

/// A recorded store call with its arguments.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum RepositoryCall {
    Create(Resource),
    Update { resource: Resource, id: Uuid },
    Delete(Uuid),
    FindByUniqueIndex(ReporterResourceUniqueIndex),
    FindByReporterResourceId(ReporterResourceId),
    FindByWorkspaceId(String),
    FindInventoryById(Uuid),
}

impl RepositoryCall {
    /// Returns the method this call was made to.
    pub fn method(&self) -> RepositoryMethod {
        match self {
            RepositoryCall::Create(_) => RepositoryMethod::Create,
            RepositoryCall::Update { .. } => RepositoryMethod::Update,
            RepositoryCall::Delete(_) => RepositoryMethod::Delete,
            RepositoryCall::FindByUniqueIndex(_) => RepositoryMethod::FindByUniqueIndex,
            RepositoryCall::FindByReporterResourceId(_) => {
                RepositoryMethod::FindByReporterResourceId
            }
            RepositoryCall::FindByWorkspaceId(_) => RepositoryMethod::FindByWorkspaceId,
            RepositoryCall::FindInventoryById(_) => RepositoryMethod::FindInventoryById,
        }
    }
}

#[derive(Default)]
struct State {
    create: Responses<WriteResult>,
    update: Responses<WriteResult>,
    delete: Responses<Result<Resource, StoreError>>,
    find_by_unique_index: Responses<Result<Resource, StoreError>>,
    find_by_reporter_resource_id: Responses<Result<Resource, StoreError>>,
    find_by_workspace_id: Responses<Result<Vec<Resource>, StoreError>>,
    find_inventory_by_id: Responses<Result<InventoryResource, StoreError>>,
    calls: Vec<RepositoryCall>,
}

/// A store double with scripted responses.
///
/// Each `on_*` method queues a response for one store method. Responses are
/// consumed in order and the last one repeats. A method with nothing queued
/// fails with [`StoreError::Backend`], so a test sees unexpected calls as
/// errors rather than silent successes.
///
/// Clones share state, so a test can hand one clone to the orchestrator and
/// inspect calls through another.
///
/// ## Example
///
/// ```rust
/// use inventory_authz::store::StoreError;
/// use inventory_authz::testing::{MockResourceRepository, RepositoryMethod};
///
/// let repository = MockResourceRepository::new()
///     .on_find_by_unique_index(Err(StoreError::NotFound))
///     .on_find_by_reporter_resource_id(Err(StoreError::NotFound));
///
/// assert_eq!(repository.times_called(RepositoryMethod::Create), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockResourceRepository {
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for MockResourceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockResourceRepository")
            .field("calls", &self.state.lock().calls.len())
            .finish_non_exhaustive()
    }
}

impl MockResourceRepository {
    /// Creates a mock with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a `create` response with no sibling records.
    #[must_use]
    pub fn on_create(self, result: Result<Resource, StoreError>) -> Self {
        self.state
            .lock()
            .create
            .push(result.map(|r| (r, Vec::new())));
        self
    }

    /// Queues a `create` response that also reports sibling records.
    #[must_use]
    pub fn on_create_with_siblings(self, resource: Resource, siblings: Vec<Resource>) -> Self {
        self.state.lock().create.push(Ok((resource, siblings)));
        self
    }

    /// Queues an `update` response with no sibling records.
    #[must_use]
    pub fn on_update(self, result: Result<Resource, StoreError>) -> Self {
        self.state
            .lock()
            .update
            .push(result.map(|r| (r, Vec::new())));
        self
    }

    /// Queues a `delete` response.
    #[must_use]
    pub fn on_delete(self, result: Result<Resource, StoreError>) -> Self {
        self.state.lock().delete.push(result);
        self
    }

    /// Queues a current-index lookup response.
    #[must_use]
    pub fn on_find_by_unique_index(self, result: Result<Resource, StoreError>) -> Self {
        self.state.lock().find_by_unique_index.push(result);
        self
    }

    /// Queues a legacy-identity lookup response.
    #[must_use]
    pub fn on_find_by_reporter_resource_id(self, result: Result<Resource, StoreError>) -> Self {
        self.state.lock().find_by_reporter_resource_id.push(result);
        self
    }

    /// Queues a workspace listing response.
    #[must_use]
    pub fn on_find_by_workspace_id(self, result: Result<Vec<Resource>, StoreError>) -> Self {
        self.state.lock().find_by_workspace_id.push(result);
        self
    }

    /// Queues an inventory read response.
    #[must_use]
    pub fn on_find_inventory_by_id(self, result: Result<InventoryResource, StoreError>) -> Self {
        self.state.lock().find_inventory_by_id.push(result);
        self
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.state.lock().calls.clone()
    }

    /// Returns how many times `method` was called.
    pub fn times_called(&self, method: RepositoryMethod) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.method() == method)
            .count()
    }

    /// Returns the number of calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Clears scripted responses and recorded calls.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.create.clear();
        state.update.clear();
        state.delete.clear();
        state.find_by_unique_index.clear();
        state.find_by_reporter_resource_id.clear();
        state.find_by_workspace_id.clear();
        state.find_inventory_by_id.clear();
        state.calls.clear();
    }

    fn record<T>(
        &self,
        call: RepositoryCall,
        responses: impl FnOnce(&mut State) -> Option<Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock();
        let method = call.method();
        state.calls.push(call);
        responses(&mut *state)
            .unwrap_or_else(|| Err(StoreError::backend(format!("unexpected call to {method:?}"))))
    }
}

#[async_trait]
impl ResourceRepository for MockResourceRepository {
    async fn create(&self, resource: &Resource) -> WriteResult {
        self.record(RepositoryCall::Create(resource.clone()), |s| s.create.next())
    }

    async fn update(&self, resource: &Resource, id: Uuid) -> WriteResult {
        let call = RepositoryCall::Update {
            resource: resource.clone(),
            id,
        };
        self.record(call, |s| s.update.next())
    }

    async fn delete(&self, id: Uuid) -> Result<Resource, StoreError> {
        self.record(RepositoryCall::Delete(id), |s| s.delete.next())
    }

    async fn find_by_unique_index(
        &self,
        index: &ReporterResourceUniqueIndex,
    ) -> Result<Resource, StoreError> {
        self.record(RepositoryCall::FindByUniqueIndex(index.clone()), |s| {
            s.find_by_unique_index.next()
        })
    }

    async fn find_by_reporter_resource_id(
        &self,
        id: &ReporterResourceId,
    ) -> Result<Resource, StoreError> {
        self.record(RepositoryCall::FindByReporterResourceId(id.clone()), |s| {
            s.find_by_reporter_resource_id.next()
        })
    }

    async fn find_by_workspace_id(&self, workspace_id: &str) -> Result<Vec<Resource>, StoreError> {
        self.record(
            RepositoryCall::FindByWorkspaceId(workspace_id.to_owned()),
            |s| s.find_by_workspace_id.next(),
        )
    }
}

#[async_trait]
impl InventoryResourceRepository for MockResourceRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<InventoryResource, StoreError> {
        self.record(RepositoryCall::FindInventoryById(id), |s| {
            s.find_inventory_by_id.next()
        })
    }
}
