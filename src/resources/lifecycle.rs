//! Create, update and delete.

use tracing::{debug, info};

use super::Resources;
use crate::types::{Resource, ResourceKey};
use crate::{Error, Result};

impl Resources {
    /// Stores a resource reported for the first time.
    ///
    /// Fails with [`ErrorKind::ResourceAlreadyExists`](crate::ErrorKind::ResourceAlreadyExists)
    /// when either lookup scheme already knows the reporter identity. With
    /// authorization enabled, the resource is linked to its workspace and
    /// the returned consistency token is stored on the record.
    ///
    /// In persistence-bypass mode the input is returned untouched and the
    /// store is never called.
    pub async fn create(&self, resource: Resource) -> Result<Resource> {
        if self.config.disable_persistence {
            return Ok(resource);
        }

        if self.resolve(&ResourceKey::from(&resource)).await?.is_some() {
            return Err(Error::resource_already_exists());
        }

        self.insert(resource).await
    }

    /// Replaces the stored resource for `key`, inserting it when absent.
    ///
    /// In persistence-bypass mode the input is returned untouched and the
    /// store is never called.
    pub async fn update(&self, resource: Resource, key: impl Into<ResourceKey>) -> Result<Resource> {
        if self.config.disable_persistence {
            return Ok(resource);
        }

        let Some(existing) = self.resolve(&key.into()).await? else {
            debug!(
                local_resource_id = resource.local_resource_id(),
                "update target not found, creating it"
            );
            return self.insert(resource).await;
        };

        let (updated, siblings) = self
            .repository
            .update(&resource, existing.id)
            .await
            .map_err(Error::database)?;

        info!(
            resource_id = %updated.id,
            resource_type = %updated.resource_type,
            siblings = siblings.len(),
            "updated resource"
        );
        Ok(updated)
    }

    /// Removes the stored resource for `key`.
    ///
    /// Fails with [`ErrorKind::ResourceNotFound`](crate::ErrorKind::ResourceNotFound)
    /// when neither lookup scheme knows it. With authorization enabled, the
    /// resource's workspace link is removed before the record; if that fails
    /// the record is kept and the authorizer error is returned.
    ///
    /// In persistence-bypass mode this succeeds without calling the store.
    pub async fn delete(&self, key: impl Into<ResourceKey>) -> Result<()> {
        if self.config.disable_persistence {
            return Ok(());
        }

        let Some(existing) = self.resolve(&key.into()).await? else {
            return Err(Error::resource_not_found());
        };

        // The record must outlive its workspace link.
        if let Some(authorizer) = &self.authorizer {
            authorizer
                .unset_workspace(
                    &self.config.namespace,
                    existing.local_resource_id(),
                    &existing.resource_type,
                )
                .await?;
        }

        let deleted = match self.repository.delete(existing.id).await {
            Ok(deleted) => deleted,
            Err(e) if e.is_not_found() => return Err(Error::resource_not_found()),
            Err(e) => return Err(Error::database(e)),
        };

        info!(
            resource_id = %deleted.id,
            resource_type = %deleted.resource_type,
            "deleted resource"
        );
        Ok(())
    }

    /// Writes a new record, then links it to its workspace.
    async fn insert(&self, resource: Resource) -> Result<Resource> {
        let (mut created, siblings) = self
            .repository
            .create(&resource)
            .await
            .map_err(Error::database)?;

        info!(
            resource_id = %created.id,
            resource_type = %created.resource_type,
            siblings = siblings.len(),
            "created resource"
        );

        let Some(authorizer) = &self.authorizer else {
            return Ok(created);
        };

        let response = authorizer
            .set_workspace(
                created.local_resource_id(),
                &created.workspace_id,
                &self.config.namespace,
                &created.resource_type,
                true,
            )
            .await?;

        if let Some(token) = response.token() {
            created.consistency_token = Some(token.clone());
            self.repository
                .update(&created, created.id)
                .await
                .map_err(Error::database)?;
            debug!(resource_id = %created.id, token = %token, "stored consistency token");
        }

        Ok(created)
    }
}
