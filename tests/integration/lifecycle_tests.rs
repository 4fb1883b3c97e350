//! Create, update and delete against the in-memory store.

use inventory_authz::testing::{AuthorizerCall, AuthorizerMethod, MockAuthorizer};
use inventory_authz::types::CreateTuplesResponse;
use inventory_authz::{ConsistencyToken, Error, ErrorKind, ResourcesConfig};

use crate::common::{NAMESPACE, TestFixture, integration, key};

/// A token handed back by the workspace link is stored and read back unchanged.
#[tokio::test]
async fn test_create_stores_workspace_token() -> anyhow::Result<()> {
    let fixture = TestFixture::new(MockAuthorizer::new().on_set_workspace(Ok(
        CreateTuplesResponse {
            consistency_token: Some(ConsistencyToken::new("zed-token-1")),
        },
    )));

    let created = fixture.resources.create(integration("int-1", "ws-1")).await?;
    assert_eq!(
        created.consistency_token,
        Some(ConsistencyToken::new("zed-token-1"))
    );

    let stored = fixture.resources.find_resource(key("int-1")).await?;
    assert_eq!(stored.id, created.id);
    assert_eq!(stored.consistency_token, created.consistency_token);

    let inventory = fixture.resources.find_inventory_resource(created.id).await?;
    assert_eq!(inventory.consistency_token, created.consistency_token);

    assert_eq!(
        fixture.authorizer.calls(),
        vec![AuthorizerCall::SetWorkspace {
            local_resource_id: "int-1".into(),
            workspace_id: "ws-1".into(),
            namespace: NAMESPACE.into(),
            name: "integration".into(),
            upsert: true,
        }]
    );
    Ok(())
}

/// Creating the same reporter identity twice is rejected.
#[tokio::test]
async fn test_create_twice_fails() {
    let fixture = TestFixture::new(MockAuthorizer::new());

    fixture
        .resources
        .create(integration("int-1", "ws-1"))
        .await
        .expect("first create should succeed");

    let err = fixture
        .resources
        .create(integration("int-1", "ws-2"))
        .await
        .expect_err("second create should fail");

    assert!(err.is(ErrorKind::ResourceAlreadyExists));
    assert_eq!(fixture.store.len(), 1);
    assert_eq!(fixture.authorizer.times_called(AuthorizerMethod::SetWorkspace), 1);
}

/// A record stored under a different resource type is still found through
/// the legacy identity when the caller gives no type.
#[tokio::test]
async fn test_legacy_record_resolves_without_type() {
    let fixture = TestFixture::new(MockAuthorizer::new());
    let mut legacy = integration("int-1", "ws-1");
    legacy.resource_type = "notifications/integration".into();
    fixture.store.seed(legacy);

    let mut untyped = key("int-1");
    untyped.resource_type = None;
    let found = fixture
        .resources
        .find_resource(untyped)
        .await
        .expect("legacy record should resolve");
    assert_eq!(found.resource_type, "notifications/integration");
}

/// Update of an unknown identity inserts it; a second update replaces it.
#[tokio::test]
async fn test_update_is_upsert() -> anyhow::Result<()> {
    let fixture = TestFixture::new(MockAuthorizer::new());

    let first = fixture
        .resources
        .update(integration("int-1", "ws-1"), key("int-1"))
        .await?;
    assert_eq!(fixture.store.len(), 1);
    assert_eq!(fixture.authorizer.times_called(AuthorizerMethod::SetWorkspace), 1);

    let second = fixture
        .resources
        .update(integration("int-1", "ws-2"), key("int-1"))
        .await?;

    assert_eq!(second.id, first.id);
    assert_eq!(second.workspace_id, "ws-2");
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(fixture.store.len(), 1);
    Ok(())
}

/// Delete removes the record and its workspace link; a second delete fails.
#[tokio::test]
async fn test_delete_then_delete_again() -> anyhow::Result<()> {
    let fixture = TestFixture::new(MockAuthorizer::new());
    let created = fixture.resources.create(integration("int-1", "ws-1")).await?;

    fixture.resources.delete(key("int-1")).await?;

    assert!(fixture.store.get(created.id).is_none());
    assert_eq!(
        fixture.authorizer.times_called(AuthorizerMethod::UnsetWorkspace),
        1
    );

    let err = fixture
        .resources
        .delete(key("int-1"))
        .await
        .expect_err("second delete should fail");
    assert!(err.is(ErrorKind::ResourceNotFound));
    Ok(())
}

/// A failed unlink keeps the record, and the retried delete finishes the job.
#[tokio::test]
async fn test_delete_retries_after_unlink_failure() -> anyhow::Result<()> {
    let fixture = TestFixture::new(MockAuthorizer::new().on_unset_workspace(Err(
        Error::new(ErrorKind::Unavailable, "relations down"),
    )));
    let created = fixture.resources.create(integration("int-1", "ws-1")).await?;

    let err = fixture
        .resources
        .delete(key("int-1"))
        .await
        .expect_err("unlink failure should surface");
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(fixture.store.get(created.id).is_some());

    fixture.authorizer.reset();
    fixture.resources.delete(key("int-1")).await?;

    assert!(fixture.store.get(created.id).is_none());
    Ok(())
}

/// With persistence disabled nothing reaches the store or the authorizer.
#[tokio::test]
async fn test_persistence_bypass() -> anyhow::Result<()> {
    let fixture = TestFixture::with_config(
        MockAuthorizer::new(),
        ResourcesConfig::builder()
            .namespace(NAMESPACE)
            .disable_persistence(true)
            .build(),
    );
    let input = integration("int-1", "ws-1");

    assert_eq!(fixture.resources.create(input.clone()).await?, input);
    assert_eq!(
        fixture.resources.update(input.clone(), key("int-1")).await?,
        input
    );
    fixture.resources.delete(key("int-1")).await?;

    assert!(fixture.store.is_empty());
    assert_eq!(fixture.authorizer.total_calls(), 0);
    Ok(())
}
