//! Authorization backend capability.
//!
//! [`Authorizer`] is the orchestrator's only view of the relation/tuple
//! store. Errors returned by an implementation reach the caller unchanged,
//! so implementations choose the [`ErrorKind`](crate::ErrorKind) callers
//! will see.
//!
//! [`RelationsClient`] (feature `rest`) implements it against the relations
//! service HTTP gateway. [`MockAuthorizer`](crate::testing::MockAuthorizer)
//! implements it for tests.

mod health;
#[cfg(feature = "rest")]
mod rest;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

pub use health::{HealthResponse, HealthStatus};
#[cfg(feature = "rest")]
#[cfg_attr(docsrs, doc(cfg(feature = "rest")))]
pub use rest::{RelationsClient, RelationsClientBuilder};

use crate::Error;
use crate::types::{
    CreateTuplesRequest, CreateTuplesResponse, Decision, DeleteTuplesRequest,
    DeleteTuplesResponse, LookupResourcesRequest, LookupResourcesResponse, Resource,
    SubjectReference,
};

/// Server-streamed lookup results, drained element by element.
pub type LookupResourcesStream =
    Pin<Box<dyn Stream<Item = Result<LookupResourcesResponse, Error>> + Send>>;

/// Permission checks and tuple writes against a relation/tuple store.
///
/// Every call is made at most once per logical operation; implementations
/// should not retry internally.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Read-consistency check: may be answered from a cached snapshot.
    async fn check(
        &self,
        namespace: &str,
        permission: &str,
        resource: &Resource,
        subject: &SubjectReference,
    ) -> Result<Decision, Error>;

    /// Write-consistency check: reflects every write acknowledged so far.
    async fn check_for_update(
        &self,
        namespace: &str,
        permission: &str,
        resource: &Resource,
        subject: &SubjectReference,
    ) -> Result<Decision, Error>;

    /// Writes relation tuples.
    async fn create_tuples(
        &self,
        request: CreateTuplesRequest,
    ) -> Result<CreateTuplesResponse, Error>;

    /// Deletes the tuples matched by a filter.
    async fn delete_tuples(
        &self,
        request: DeleteTuplesRequest,
    ) -> Result<DeleteTuplesResponse, Error>;

    /// Links a resource to its workspace.
    ///
    /// `namespace` and `name` form the resource's object type.
    async fn set_workspace(
        &self,
        local_resource_id: &str,
        workspace_id: &str,
        namespace: &str,
        name: &str,
        upsert: bool,
    ) -> Result<CreateTuplesResponse, Error>;

    /// Removes every workspace link of a resource.
    async fn unset_workspace(
        &self,
        namespace: &str,
        local_resource_id: &str,
        resource_type: &str,
    ) -> Result<DeleteTuplesResponse, Error>;

    /// Streams the resources a subject can reach through a relation.
    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> Result<LookupResourcesStream, Error>;

    /// Probes backend readiness.
    async fn health(&self) -> Result<HealthResponse, Error>;
}
