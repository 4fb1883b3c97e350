//! Reporter-scoped identity keys used to locate stored resources.
//!
//! Two lookup schemes coexist:
//!
//! - [`ReporterResourceUniqueIndex`]: the current unique index, keyed on
//!   reporter id, local resource id, resource type and inventory id.
//! - [`ReporterResourceId`]: the legacy reporter identity, keyed on reporter
//!   id, reporter type and local resource id, optionally scoped by type.
//!
//! [`ResourceKey`] carries both so a lookup can fall back from one scheme to
//! the other.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Reporter, Resource, ResourceReporter};

/// Legacy reporter identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct ReporterResourceId {
    /// The resource id as known to the reporter.
    #[builder(into)]
    pub local_resource_id: String,

    /// Optional resource type scope.
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource_type: Option<String>,

    /// Reporter instance id.
    #[builder(into)]
    pub reporter_id: String,

    /// Reporter type.
    #[builder(into)]
    pub reporter_type: String,
}

/// Current unique index over reporter records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct ReporterResourceUniqueIndex {
    /// Reporter instance id.
    #[builder(into)]
    pub reporter_id: String,

    /// Reporter type.
    #[builder(into)]
    pub reporter_type: String,

    /// The resource id as known to the reporter.
    #[builder(into)]
    pub local_resource_id: String,

    /// Resource type.
    #[builder(into)]
    pub resource_type: String,

    /// Inventory id, when the caller already knows it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inventory_id: Option<Uuid>,
}

/// Identity descriptor accepted by every lifecycle and permission operation.
///
/// Build one from either scheme, or from a [`Resource`]; the missing scheme
/// is derived from the fields the caller supplied.
///
/// ```rust
/// use inventory_authz::{ReporterResourceId, ResourceKey};
///
/// let key: ResourceKey = ReporterResourceId::builder()
///     .local_resource_id("cluster-a")
///     .reporter_id("acm-1")
///     .reporter_type("ACM")
///     .resource_type("k8s_cluster")
///     .build()
///     .into();
///
/// assert_eq!(key.unique_index().resource_type, "k8s_cluster");
/// assert_eq!(key.reporter_resource_id().local_resource_id, "cluster-a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    unique_index: ReporterResourceUniqueIndex,
    reporter_resource_id: ReporterResourceId,
}

impl ResourceKey {
    /// Creates a key from both schemes explicitly.
    pub fn new(
        unique_index: ReporterResourceUniqueIndex,
        reporter_resource_id: ReporterResourceId,
    ) -> Self {
        Self {
            unique_index,
            reporter_resource_id,
        }
    }

    /// Returns the current-scheme key.
    #[inline]
    pub fn unique_index(&self) -> &ReporterResourceUniqueIndex {
        &self.unique_index
    }

    /// Returns the legacy-scheme key.
    #[inline]
    pub fn reporter_resource_id(&self) -> &ReporterResourceId {
        &self.reporter_resource_id
    }

    /// Returns the reporter-local resource id.
    #[inline]
    pub fn local_resource_id(&self) -> &str {
        &self.reporter_resource_id.local_resource_id
    }

    /// Returns the resource type, if either scheme names one.
    pub fn resource_type(&self) -> Option<&str> {
        self.reporter_resource_id
            .resource_type
            .as_deref()
            .or(Some(self.unique_index.resource_type.as_str()))
            .filter(|t| !t.is_empty())
    }

    /// Builds the stand-in object for a resource the inventory does not hold.
    ///
    /// The placeholder carries only the caller's reporter identity; it has a
    /// nil id and no workspace, payload or labels.
    pub fn placeholder(&self) -> Resource {
        let id = &self.reporter_resource_id;
        Resource {
            resource_type: self.resource_type().unwrap_or_default().to_owned(),
            reporter: ResourceReporter::new(
                Reporter {
                    reporter_id: id.reporter_id.clone(),
                    reporter_type: id.reporter_type.clone(),
                    reporter_version: String::new(),
                },
                id.local_resource_id.clone(),
            ),
            ..Resource::default()
        }
    }
}

impl From<ReporterResourceId> for ResourceKey {
    fn from(id: ReporterResourceId) -> Self {
        let unique_index = ReporterResourceUniqueIndex {
            reporter_id: id.reporter_id.clone(),
            reporter_type: id.reporter_type.clone(),
            local_resource_id: id.local_resource_id.clone(),
            resource_type: id.resource_type.clone().unwrap_or_default(),
            inventory_id: None,
        };
        Self::new(unique_index, id)
    }
}

impl From<ReporterResourceUniqueIndex> for ResourceKey {
    fn from(index: ReporterResourceUniqueIndex) -> Self {
        let reporter_resource_id = ReporterResourceId {
            local_resource_id: index.local_resource_id.clone(),
            resource_type: Some(index.resource_type.clone()).filter(|t| !t.is_empty()),
            reporter_id: index.reporter_id.clone(),
            reporter_type: index.reporter_type.clone(),
        };
        Self::new(index, reporter_resource_id)
    }
}

impl From<&Resource> for ResourceKey {
    fn from(resource: &Resource) -> Self {
        let unique_index = ReporterResourceUniqueIndex {
            reporter_id: resource.reporter_id().to_owned(),
            reporter_type: resource.reporter_type().to_owned(),
            local_resource_id: resource.local_resource_id().to_owned(),
            resource_type: resource.resource_type.clone(),
            inventory_id: resource.is_persisted().then_some(resource.id),
        };
        Self::from(unique_index)
    }
}
