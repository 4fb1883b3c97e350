//! Prelude module for convenient imports.
//!
//! ```rust
//! use inventory_authz::prelude::*;
//! ```
//!
//! This provides access to:
//! - The orchestrator and its configuration
//! - Error types
//! - Store and authorizer capability traits
//! - Common data types

#[cfg(feature = "rest")]
pub use crate::authz::RelationsClient;
pub use crate::{
    authz::{Authorizer, HealthResponse, HealthStatus, LookupResourcesStream},
    config::{ResourcesConfig, TlsConfig},
    error::{Error, ErrorKind, Result},
    resources::{Resources, ResultStream, WorkspaceListing},
    store::{InventoryResourceRepository, ResourceRepository, StoreError},
    types::{
        Allowed, ConsistencyToken, Decision, InventoryResource, Label, LookupResourcesRequest,
        LookupResourcesResponse, ObjectReference, ObjectType, Reporter, ReporterResourceId,
        ReporterResourceUniqueIndex, Resource, ResourceKey, ResourceReporter, SubjectReference,
    },
};
