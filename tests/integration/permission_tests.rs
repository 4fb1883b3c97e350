//! Check and CheckForUpdate against the in-memory store.

use inventory_authz::testing::{AuthorizerCall, MockAuthorizer};
use inventory_authz::{ConsistencyToken, Decision, Error, ErrorKind};

use crate::common::{TestFixture, integration, key, principal};

const VIEW: &str = "notifications_integration_view";
const WRITE: &str = "notifications_integration_write";

/// A resource the inventory has never seen is still checked.
#[tokio::test]
async fn test_check_before_ingestion() {
    let fixture = TestFixture::new(MockAuthorizer::new().on_check(VIEW, Ok(Decision::allowed())));

    let allowed = fixture
        .resources
        .check(VIEW, "rbac", &principal("alice"), key("int-9"))
        .await
        .expect("check should succeed");

    assert!(allowed);
    let calls = fixture.authorizer.calls();
    assert!(matches!(
        &calls[..],
        [AuthorizerCall::Check { resource, .. }]
            if resource.local_resource_id() == "int-9" && resource.resource_type == "integration"
    ));
}

/// Authorizer failures come back with their original kind.
#[tokio::test]
async fn test_check_error_kind_preserved() {
    let fixture = TestFixture::new(MockAuthorizer::new().on_check(
        VIEW,
        Err(Error::new(ErrorKind::RateLimited, "slow down")),
    ));

    let err = fixture
        .resources
        .check(VIEW, "rbac", &principal("alice"), key("int-1"))
        .await
        .expect_err("check should fail");

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(err.is_retriable());
}

/// The write-consistency token lands on the stored record, allowed or not.
#[tokio::test]
async fn test_check_for_update_tracks_snapshot() -> anyhow::Result<()> {
    let fixture = TestFixture::new(
        MockAuthorizer::new()
            .on_check_for_update(
                VIEW,
                Ok(Decision::allowed().with_consistency_token(ConsistencyToken::new("snap-1"))),
            )
            .on_check_for_update(
                WRITE,
                Ok(Decision::denied().with_consistency_token(ConsistencyToken::new("snap-2"))),
            ),
    );
    let created = fixture.resources.create(integration("int-1", "ws-1")).await?;

    let allowed = fixture
        .resources
        .check_for_update(VIEW, "rbac", &principal("alice"), key("int-1"))
        .await?;
    assert!(allowed);
    assert_eq!(
        fixture.store.get(created.id).and_then(|r| r.consistency_token),
        Some(ConsistencyToken::new("snap-1"))
    );

    let allowed = fixture
        .resources
        .check_for_update(WRITE, "rbac", &principal("alice"), &created)
        .await?;
    assert!(!allowed);
    assert_eq!(
        fixture.store.get(created.id).and_then(|r| r.consistency_token),
        Some(ConsistencyToken::new("snap-2"))
    );
    Ok(())
}

/// Nothing is written for a resource the inventory does not hold.
#[tokio::test]
async fn test_check_for_update_unknown_resource() -> anyhow::Result<()> {
    let fixture = TestFixture::new(MockAuthorizer::new().on_check_for_update(
        VIEW,
        Ok(Decision::allowed().with_consistency_token(ConsistencyToken::new("snap-1"))),
    ));

    let allowed = fixture
        .resources
        .check_for_update(VIEW, "rbac", &principal("alice"), key("int-9"))
        .await?;

    assert!(allowed);
    assert!(fixture.store.is_empty());
    Ok(())
}
