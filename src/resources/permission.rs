//! Permission checks on single resources.

use tracing::debug;

use super::Resources;
use crate::types::{ResourceKey, SubjectReference, WORKSPACE_TYPE};
use crate::{Error, Result};

impl Resources {
    /// Asks whether `subject` holds `permission` on the resource for `key`.
    ///
    /// The authorizer is consulted even when the inventory has no record of
    /// the resource; a placeholder carrying the caller's reporter identity
    /// stands in for it. Authorizer errors are returned unchanged.
    ///
    /// Only [`Allowed::True`](crate::Allowed::True) counts as allowed.
    pub async fn check(
        &self,
        permission: &str,
        namespace: &str,
        subject: &SubjectReference,
        key: impl Into<ResourceKey>,
    ) -> Result<bool> {
        let authorizer = self.require_authorizer()?;
        let key = key.into();

        let object = match self.resolve(&key).await? {
            Some(resource) => resource,
            None => key.placeholder(),
        };

        let decision = authorizer
            .check(namespace, permission, &object, subject)
            .await?;

        debug!(
            permission,
            namespace,
            local_resource_id = key.local_resource_id(),
            decision = %decision.allowed_state(),
            "check"
        );
        Ok(decision.is_allowed())
    }

    /// Like [`check`](Self::check), but at write consistency.
    ///
    /// When the resource is stored, the consistency token returned by the
    /// authorizer is written back to it whether or not access was granted,
    /// even when that token is empty. Nothing is written for an absent
    /// resource, a workspace identity, or a failed check.
    pub async fn check_for_update(
        &self,
        permission: &str,
        namespace: &str,
        subject: &SubjectReference,
        key: impl Into<ResourceKey>,
    ) -> Result<bool> {
        let authorizer = self.require_authorizer()?;
        let key = key.into();

        let Some(mut resource) = self.resolve(&key).await? else {
            let decision = authorizer
                .check_for_update(namespace, permission, &key.placeholder(), subject)
                .await?;
            debug!(
                permission,
                namespace,
                local_resource_id = key.local_resource_id(),
                decision = %decision.allowed_state(),
                "check for update on unknown resource"
            );
            return Ok(decision.is_allowed());
        };

        let decision = authorizer
            .check_for_update(namespace, permission, &resource, subject)
            .await?;

        // Workspace identities never carry a stored token.
        if key.resource_type() == Some(WORKSPACE_TYPE) {
            return Ok(decision.is_allowed());
        }

        resource.consistency_token = decision.returned_consistency_token().cloned();
        self.repository
            .update(&resource, resource.id)
            .await
            .map_err(Error::database)?;
        debug!(
            resource_id = %resource.id,
            token = ?resource.consistency_token,
            "stored consistency token"
        );

        Ok(decision.is_allowed())
    }
}
