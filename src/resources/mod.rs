//! The inventory/authorization orchestrator.
//!
//! [`Resources`] coordinates a [`ResourceRepository`] with an optional
//! [`Authorizer`]:
//!
//! - lifecycle: [`create`](Resources::create), [`update`](Resources::update),
//!   [`delete`](Resources::delete)
//! - permissions: [`check`](Resources::check),
//!   [`check_for_update`](Resources::check_for_update)
//! - listing: [`list_resources_in_workspace`](Resources::list_resources_in_workspace)
//! - passthrough: [`lookup_resources`](Resources::lookup_resources)
//!
//! Every operation resolves identities through the same two-scheme lookup:
//! the current unique index first, then the legacy reporter identity. Only a
//! "not found" moves on to the next scheme.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use inventory_authz::prelude::*;
//!
//! let resources = Resources::new(
//!     Arc::new(repository),
//!     Arc::new(inventory),
//!     Some(Arc::new(relations_client)),
//!     ResourcesConfig::for_namespace("notifications"),
//! );
//!
//! let created = resources.create(resource).await?;
//! let allowed = resources
//!     .check("integration_view", "notifications", &subject, &created)
//!     .await?;
//! ```

mod identity;
mod lifecycle;
mod listing;
mod permission;

use std::sync::Arc;

use uuid::Uuid;

pub use listing::{ResultStream, WorkspaceListing};

use crate::authz::{Authorizer, LookupResourcesStream};
use crate::config::ResourcesConfig;
use crate::store::{InventoryResourceRepository, ResourceRepository};
use crate::types::{InventoryResource, LookupResourcesRequest, Resource, ResourceKey};
use crate::{Error, Result};

/// Orchestrates inventory writes, tuple writes and permission checks.
///
/// `Resources` holds no mutable state; clones share the same collaborators.
#[derive(Clone)]
pub struct Resources {
    repository: Arc<dyn ResourceRepository>,
    inventory: Arc<dyn InventoryResourceRepository>,
    authorizer: Option<Arc<dyn Authorizer>>,
    config: ResourcesConfig,
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("namespace", &self.config.namespace)
            .field("disable_persistence", &self.config.disable_persistence)
            .field("authorization_enabled", &self.authorizer.is_some())
            .finish_non_exhaustive()
    }
}

impl Resources {
    /// Creates an orchestrator.
    ///
    /// Passing `None` for `authorizer` disables the authorization
    /// integration: lifecycle operations skip tuple writes, and operations
    /// that need a decision fail with
    /// [`ErrorKind::Configuration`](crate::ErrorKind::Configuration).
    pub fn new(
        repository: Arc<dyn ResourceRepository>,
        inventory: Arc<dyn InventoryResourceRepository>,
        authorizer: Option<Arc<dyn Authorizer>>,
        config: ResourcesConfig,
    ) -> Self {
        Self {
            repository,
            inventory,
            authorizer,
            config,
        }
    }

    /// Returns the namespace used for workspace tuples.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Returns `true` if create, update and delete bypass the store.
    #[inline]
    pub fn is_persistence_disabled(&self) -> bool {
        self.config.disable_persistence
    }

    /// Returns `true` if an authorizer is configured.
    #[inline]
    pub fn is_authorization_enabled(&self) -> bool {
        self.authorizer.is_some()
    }

    fn require_authorizer(&self) -> Result<&Arc<dyn Authorizer>> {
        self.authorizer
            .as_ref()
            .ok_or_else(|| Error::configuration("authorization integration is disabled"))
    }

    /// Returns the stored resource for an identity.
    ///
    /// Fails with [`ErrorKind::ResourceNotFound`](crate::ErrorKind::ResourceNotFound)
    /// when neither lookup scheme knows it.
    pub async fn find_resource(&self, key: impl Into<ResourceKey>) -> Result<Resource> {
        self.resolve(&key.into())
            .await?
            .ok_or_else(Error::resource_not_found)
    }

    /// Reads an aggregated inventory resource by id.
    pub async fn find_inventory_resource(&self, id: Uuid) -> Result<InventoryResource> {
        match self.inventory.find_by_id(id).await {
            Ok(resource) => Ok(resource),
            Err(e) if e.is_not_found() => Err(Error::resource_not_found()),
            Err(e) => Err(Error::database(e)),
        }
    }

    /// Streams the resources a subject can reach, straight from the authorizer.
    ///
    /// The stream and any error are returned exactly as the authorizer
    /// produced them.
    pub async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> Result<LookupResourcesStream> {
        self.require_authorizer()?.lookup_resources(request).await
    }
}
