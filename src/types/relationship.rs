//! Relation wire types exchanged with the authorization backend.
//!
//! These mirror the relations service's JSON shapes (camelCase fields). The
//! orchestrator only builds and forwards them; tuple semantics belong to the
//! backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ConsistencyToken, Resource};

/// Relation linking a resource to its workspace.
pub const WORKSPACE_RELATION: &str = "workspace";

/// Namespace of workspace subjects.
pub const WORKSPACE_NAMESPACE: &str = "rbac";

/// Type name of workspace subjects.
pub const WORKSPACE_TYPE: &str = "workspace";

/// A namespaced object type, e.g. `rbac/workspace`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectType {
    /// Type namespace.
    pub namespace: String,
    /// Type name within the namespace.
    pub name: String,
}

impl ObjectType {
    /// Creates a new object type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A typed object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectReference {
    /// The object's type.
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    /// The object's id.
    pub id: String,
}

impl ObjectReference {
    /// Creates a new object reference.
    pub fn new(object_type: ObjectType, id: impl Into<String>) -> Self {
        Self {
            object_type,
            id: id.into(),
        }
    }

    /// The check object for an inventory resource:
    /// `{type: {namespace, name: resource_type}, id: local_resource_id}`.
    pub fn for_resource(namespace: &str, resource: &Resource) -> Self {
        Self::new(
            ObjectType::new(namespace, resource.resource_type.as_str()),
            resource.local_resource_id(),
        )
    }

    /// The subject object for a workspace.
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self::new(
            ObjectType::new(WORKSPACE_NAMESPACE, WORKSPACE_TYPE),
            workspace_id,
        )
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.id)
    }
}

/// A subject, optionally narrowed to a relation of the subject object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SubjectReference {
    /// Optional subject relation, e.g. `member`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relation: Option<String>,
    /// The subject object.
    pub subject: ObjectReference,
}

impl SubjectReference {
    /// Creates a direct subject.
    pub fn new(subject: ObjectReference) -> Self {
        Self {
            relation: None,
            subject,
        }
    }

    /// Narrows the subject to one of its relations.
    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }
}

impl fmt::Display for SubjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{}#{}", self.subject, relation),
            None => write!(f, "{}", self.subject),
        }
    }
}

/// A relation tuple: `resource#relation@subject`.
///
/// ```rust
/// use inventory_authz::types::Relationship;
///
/// let tuple = Relationship::workspace("hbi", "host", "host-1", "ws-7");
/// assert_eq!(tuple.to_string(), "hbi/host:host-1#workspace@rbac/workspace:ws-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// The resource side.
    pub resource: ObjectReference,
    /// The relation name.
    pub relation: String,
    /// The subject side.
    pub subject: SubjectReference,
}

impl Relationship {
    /// Creates a new relationship.
    pub fn new(
        resource: ObjectReference,
        relation: impl Into<String>,
        subject: SubjectReference,
    ) -> Self {
        Self {
            resource,
            relation: relation.into(),
            subject,
        }
    }

    /// The workspace-membership tuple for a resource.
    pub fn workspace(
        namespace: impl Into<String>,
        name: impl Into<String>,
        local_resource_id: impl Into<String>,
        workspace_id: impl Into<String>,
    ) -> Self {
        Self::new(
            ObjectReference::new(ObjectType::new(namespace, name), local_resource_id),
            WORKSPACE_RELATION,
            SubjectReference::new(ObjectReference::workspace(workspace_id)),
        )
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.resource, self.relation, self.subject)
    }
}

/// Subject side of a [`RelationTupleFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectFilter {
    /// Subject namespace.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject_namespace: Option<String>,
    /// Subject type.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject_type: Option<String>,
    /// Subject id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject_id: Option<String>,
    /// Subject relation.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relation: Option<String>,
}

/// Selects the tuples a delete applies to. Unset fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationTupleFilter {
    /// Resource namespace.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource_namespace: Option<String>,
    /// Resource type.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource_type: Option<String>,
    /// Resource id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resource_id: Option<String>,
    /// Relation name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relation: Option<String>,
    /// Subject selector.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject_filter: Option<SubjectFilter>,
}

impl RelationTupleFilter {
    /// Matches every workspace tuple of one resource.
    pub fn workspace(
        namespace: impl Into<String>,
        local_resource_id: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            resource_namespace: Some(namespace.into()),
            resource_type: Some(resource_type.into()),
            resource_id: Some(local_resource_id.into()),
            relation: Some(WORKSPACE_RELATION.to_owned()),
            subject_filter: Some(SubjectFilter {
                subject_namespace: Some(WORKSPACE_NAMESPACE.to_owned()),
                subject_type: Some(WORKSPACE_TYPE.to_owned()),
                subject_id: None,
                relation: None,
            }),
        }
    }

    /// Flattens the filter into `filter.*` query parameters.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let subject = self.subject_filter.as_ref();
        [
            ("filter.resourceNamespace", self.resource_namespace.as_deref()),
            ("filter.resourceType", self.resource_type.as_deref()),
            ("filter.resourceId", self.resource_id.as_deref()),
            ("filter.relation", self.relation.as_deref()),
            (
                "filter.subjectFilter.subjectNamespace",
                subject.and_then(|s| s.subject_namespace.as_deref()),
            ),
            (
                "filter.subjectFilter.subjectType",
                subject.and_then(|s| s.subject_type.as_deref()),
            ),
            (
                "filter.subjectFilter.subjectId",
                subject.and_then(|s| s.subject_id.as_deref()),
            ),
            (
                "filter.subjectFilter.relation",
                subject.and_then(|s| s.relation.as_deref()),
            ),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Request body for a tuple write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateTuplesRequest {
    /// Replace existing tuples instead of failing on conflict.
    #[serde(default)]
    pub upsert: bool,
    /// Tuples to write.
    pub tuples: Vec<Relationship>,
}

/// Result of a tuple write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTuplesResponse {
    /// Snapshot that includes the write.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consistency_token: Option<ConsistencyToken>,
}

impl CreateTuplesResponse {
    /// Returns the token, treating an empty token as absent.
    pub fn token(&self) -> Option<&ConsistencyToken> {
        self.consistency_token.as_ref().filter(|t| !t.is_empty())
    }
}

/// Request for a tuple delete.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteTuplesRequest {
    /// Tuples to remove.
    pub filter: RelationTupleFilter,
}

/// Result of a tuple delete.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTuplesResponse {
    /// Snapshot that includes the delete.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consistency_token: Option<ConsistencyToken>,
}

/// "Which resources of this type can the subject act on through this relation?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResourcesRequest {
    /// Type of the resources to enumerate.
    pub resource_type: ObjectType,
    /// Relation or permission to follow.
    pub relation: String,
    /// The acting subject.
    pub subject: SubjectReference,
}

/// One element of a lookup stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResourcesResponse {
    /// A resource the subject can reach.
    pub resource: ObjectReference,
    /// Opaque continuation token, when the backend pages.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub continuation_token: Option<String>,
}
