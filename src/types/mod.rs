//! Core types for inventory orchestration.
//!
//! - [`Resource`]: an inventory record and its reporter descriptor
//! - [`ResourceKey`]: identity across the current and legacy lookup schemes
//! - [`ConsistencyToken`]: snapshot token issued by the authorization backend
//! - [`Decision`]: tri-state check outcome plus its snapshot
//! - relation wire types ([`Relationship`], [`ObjectReference`], ...)

mod consistency;
mod decision;
mod identity;
mod relationship;
mod resource;

pub use consistency::ConsistencyToken;
pub use decision::{Allowed, Decision};
pub use identity::{ReporterResourceId, ReporterResourceUniqueIndex, ResourceKey};
pub use relationship::{
    CreateTuplesRequest, CreateTuplesResponse, DeleteTuplesRequest, DeleteTuplesResponse,
    LookupResourcesRequest, LookupResourcesResponse, ObjectReference, ObjectType,
    RelationTupleFilter, Relationship, SubjectFilter, SubjectReference, WORKSPACE_NAMESPACE,
    WORKSPACE_RELATION, WORKSPACE_TYPE,
};
pub use resource::{InventoryResource, Label, Reporter, Resource, ResourceData, ResourceReporter};
