//! Two-scheme identity resolution.

use tracing::debug;

use super::Resources;
use crate::Error;
use crate::Result;
use crate::store::StoreError;
use crate::types::{Resource, ResourceKey};

/// A way of locating a stored resource from a [`ResourceKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupScheme {
    /// The current reporter-resource unique index.
    UniqueIndex,
    /// The legacy reporter identity.
    ReporterIdentity,
}

/// Schemes in the order they are tried.
const LOOKUP_ORDER: [LookupScheme; 2] = [LookupScheme::UniqueIndex, LookupScheme::ReporterIdentity];

impl Resources {
    async fn find_by(
        &self,
        scheme: LookupScheme,
        key: &ResourceKey,
    ) -> std::result::Result<Resource, StoreError> {
        match scheme {
            LookupScheme::UniqueIndex => {
                self.repository
                    .find_by_unique_index(key.unique_index())
                    .await
            }
            LookupScheme::ReporterIdentity => {
                self.repository
                    .find_by_reporter_resource_id(key.reporter_resource_id())
                    .await
            }
        }
    }

    /// Resolves an identity to its stored resource.
    ///
    /// Returns `Ok(None)` only when every scheme reported "not found". Any
    /// other store error stops the search and is returned as a database
    /// error.
    pub(super) async fn resolve(&self, key: &ResourceKey) -> Result<Option<Resource>> {
        for scheme in LOOKUP_ORDER {
            match self.find_by(scheme, key).await {
                Ok(resource) => {
                    debug!(
                        scheme = ?scheme,
                        resource_id = %resource.id,
                        local_resource_id = key.local_resource_id(),
                        "resolved resource"
                    );
                    return Ok(Some(resource));
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(Error::database(e)),
            }
        }

        debug!(
            local_resource_id = key.local_resource_id(),
            "resource not found under any lookup scheme"
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::ErrorKind;
    use crate::store::StoreError;
    use crate::testing::{MockResourceRepository, RepositoryMethod};
    use crate::types::ResourceKey;

    #[tokio::test]
    async fn test_current_index_hit_skips_legacy() {
        let found = stored(&resource("my-org", "my-resource", &[]));
        let repository =
            MockResourceRepository::new().on_find_by_unique_index(Ok(found.clone()));
        let resources = resources(&repository, None, false);

        let resolved = resources.resolve(&ResourceKey::from(key())).await.unwrap();

        assert_eq!(resolved, Some(found));
        assert_eq!(repository.times_called(RepositoryMethod::FindByUniqueIndex), 1);
        assert_eq!(
            repository.times_called(RepositoryMethod::FindByReporterResourceId),
            0
        );
    }

    #[tokio::test]
    async fn test_not_found_falls_back_to_legacy() {
        let found = stored(&resource("my-org", "my-resource", &[]));
        let repository = MockResourceRepository::new()
            .on_find_by_unique_index(Err(StoreError::NotFound))
            .on_find_by_reporter_resource_id(Ok(found.clone()));
        let resources = resources(&repository, None, false);

        let resolved = resources.resolve(&ResourceKey::from(key())).await.unwrap();

        assert_eq!(resolved, Some(found));
        assert_eq!(
            repository.times_called(RepositoryMethod::FindByReporterResourceId),
            1
        );
    }

    #[tokio::test]
    async fn test_absent_under_both_schemes() {
        let repository = MockResourceRepository::new()
            .on_find_by_unique_index(Err(StoreError::NotFound))
            .on_find_by_reporter_resource_id(Err(StoreError::NotFound));
        let resources = resources(&repository, None, false);

        let resolved = resources.resolve(&ResourceKey::from(key())).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_other_error_does_not_fall_back() {
        let repository = MockResourceRepository::new()
            .on_find_by_unique_index(Err(StoreError::backend("deadlock detected")));
        let resources = resources(&repository, None, false);

        let err = resources
            .resolve(&ResourceKey::from(key()))
            .await
            .unwrap_err();

        assert!(err.is(ErrorKind::Database));
        assert_eq!(
            repository.times_called(RepositoryMethod::FindByReporterResourceId),
            0
        );
    }

    #[tokio::test]
    async fn test_legacy_error_is_database_error() {
        let repository = MockResourceRepository::new()
            .on_find_by_unique_index(Err(StoreError::NotFound))
            .on_find_by_reporter_resource_id(Err(StoreError::DuplicatedKey("pk".into())));
        let resources = resources(&repository, None, false);

        let err = resources
            .resolve(&ResourceKey::from(key()))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Database));
    }
}
