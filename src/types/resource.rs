//! Inventory resource records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ConsistencyToken;

/// Opaque reporter-owned payload attached to a resource.
pub type ResourceData = serde_json::Map<String, serde_json::Value>;

/// The external system that reported a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct Reporter {
    /// Instance identifier of the reporter.
    #[builder(into)]
    pub reporter_id: String,

    /// Kind of reporter (e.g. `ACM`, `HBI`).
    #[builder(into)]
    pub reporter_type: String,

    /// Version of the reporter software.
    #[builder(into, default)]
    pub reporter_version: String,
}

/// A reporter together with the reporter-local id of one resource.
///
/// This pair is the natural external key of a resource before the store
/// assigns it an [`id`](Resource::id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReporter {
    /// The reporting system.
    #[serde(flatten)]
    pub reporter: Reporter,

    /// The resource id as known to the reporter.
    pub local_resource_id: String,
}

impl ResourceReporter {
    /// Creates a reporter descriptor for the given local resource id.
    pub fn new(reporter: Reporter, local_resource_id: impl Into<String>) -> Self {
        Self {
            reporter,
            local_resource_id: local_resource_id.into(),
        }
    }
}

/// A key/value label. Duplicate keys are allowed on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Label key.
    pub key: String,
    /// Label value.
    pub value: String,
}

impl Label {
    /// Creates a new label.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A resource as held by the inventory store.
///
/// The [`id`](Resource::id) is nil until the store assigns one on creation
/// and never changes afterwards.
///
/// ```rust
/// use inventory_authz::{Label, Reporter, Resource, ResourceReporter};
///
/// let resource = Resource::builder()
///     .org_id("my-org")
///     .resource_type("k8s_cluster")
///     .workspace_id("my-workspace")
///     .reporter(ResourceReporter::new(
///         Reporter::builder()
///             .reporter_id("acm-1")
///             .reporter_type("ACM")
///             .build(),
///         "cluster-a",
///     ))
///     .labels(vec![Label::new("env", "prod"), Label::new("env", "staging")])
///     .build();
///
/// assert!(resource.id.is_nil());
/// assert_eq!(resource.local_resource_id(), "cluster-a");
/// assert_eq!(resource.labels.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Store-assigned identifier.
    #[builder(default)]
    #[serde(default)]
    pub id: Uuid,

    /// Owning organization.
    #[builder(into, default)]
    #[serde(default)]
    pub org_id: String,

    /// Reporter-owned payload, never interpreted here.
    #[builder(default)]
    #[serde(default)]
    pub resource_data: ResourceData,

    /// Resource type tag, also used as the object type name in tuples.
    #[builder(into)]
    pub resource_type: String,

    /// Workspace the resource belongs to.
    #[builder(into, default)]
    #[serde(default)]
    pub workspace_id: String,

    /// Reporter descriptor.
    #[builder(default)]
    #[serde(default)]
    pub reporter: ResourceReporter,

    /// Link into the reporter's console.
    #[builder(into, default)]
    #[serde(default)]
    pub console_href: String,

    /// Link into the reporter's API.
    #[builder(into, default)]
    #[serde(default)]
    pub api_href: String,

    /// Labels in reporter order.
    #[builder(default)]
    #[serde(default)]
    pub labels: Vec<Label>,

    /// Snapshot of the last tuple write touching this resource.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consistency_token: Option<ConsistencyToken>,

    /// Creation timestamp, set by the store.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp, set by the store.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Returns the reporter-local resource id.
    #[inline]
    pub fn local_resource_id(&self) -> &str {
        &self.reporter.local_resource_id
    }

    /// Returns the reporter instance id.
    #[inline]
    pub fn reporter_id(&self) -> &str {
        &self.reporter.reporter.reporter_id
    }

    /// Returns the reporter type.
    #[inline]
    pub fn reporter_type(&self) -> &str {
        &self.reporter.reporter.reporter_type
    }

    /// Returns `true` once the store has assigned an id.
    #[inline]
    pub fn is_persisted(&self) -> bool {
        !self.id.is_nil()
    }

    /// Sets the consistency token.
    #[must_use]
    pub fn with_consistency_token(mut self, token: ConsistencyToken) -> Self {
        self.consistency_token = Some(token);
        self
    }
}

/// Read model served by the inventory-read handle.
///
/// One inventory resource groups the reporter records describing the same
/// logical resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResource {
    /// Inventory identifier.
    pub id: Uuid,

    /// Resource type tag.
    pub resource_type: String,

    /// Workspace the resource belongs to.
    pub workspace_id: String,

    /// Owning organization.
    #[serde(default)]
    pub org_id: String,

    /// Merged reporter payloads.
    #[serde(default)]
    pub resource_data: ResourceData,

    /// Snapshot of the last tuple write touching this resource.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consistency_token: Option<ConsistencyToken>,
}
