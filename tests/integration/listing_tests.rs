//! Workspace listings against the in-memory store.

use std::time::Duration;

use futures::StreamExt;
use inventory_authz::testing::MockAuthorizer;
use inventory_authz::{Decision, Error, ErrorKind, Resource, ResourcesConfig};
use proptest::prelude::*;

use crate::common::{NAMESPACE, TestFixture, integration, principal};

const VIEW: &str = "notifications_integration_view";

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Allow,
    Deny,
    Unspecified,
    Fail,
}

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Allow),
        Just(Outcome::Deny),
        Just(Outcome::Unspecified),
        Just(Outcome::Fail),
    ]
}

/// Scripts one answer per outcome, keyed by resource type.
fn scripted(outcomes: &[Outcome]) -> MockAuthorizer {
    outcomes
        .iter()
        .enumerate()
        .fold(MockAuthorizer::new(), |authorizer, (i, outcome)| {
            let result = match outcome {
                Outcome::Allow => Ok(Decision::allowed()),
                Outcome::Deny => Ok(Decision::denied()),
                Outcome::Unspecified => Ok(Decision::default()),
                Outcome::Fail => Err(Error::new(ErrorKind::Unavailable, format!("check {i} failed"))),
            };
            authorizer.on_check_for_delayed(
                VIEW,
                format!("type-{i}"),
                Duration::from_millis((i as u64 * 7) % 5),
                result,
            )
        })
}

/// Seeds `count` resources into `ws-1`, each with its own type.
fn seed_workspace(fixture: &TestFixture, count: usize) {
    for i in 0..count {
        let mut resource: Resource = integration(&format!("int-{i}"), "ws-1");
        resource.resource_type = format!("type-{i}");
        fixture.store.seed(resource);
    }
}

/// Only resources in the requested workspace are checked.
#[tokio::test]
async fn test_listing_is_scoped_to_workspace() -> anyhow::Result<()> {
    let fixture = TestFixture::new(MockAuthorizer::new().on_check(VIEW, Ok(Decision::allowed())));
    fixture.store.seed(integration("int-1", "ws-1"));
    fixture.store.seed(integration("int-2", "ws-2"));

    let listing = fixture
        .resources
        .list_resources_in_workspace(VIEW, "rbac", &principal("alice"), "ws-1")
        .await?;

    let allowed: Vec<_> = listing.resources.collect().await;
    assert_eq!(allowed.len(), 1);
    assert_eq!(allowed[0].local_resource_id(), "int-1");
    assert!(listing.errors.drain().await.is_empty());
    Ok(())
}

/// An empty workspace yields two closed streams.
#[tokio::test]
async fn test_empty_workspace() -> anyhow::Result<()> {
    let fixture = TestFixture::new(MockAuthorizer::new());

    let (allowed, errors) = fixture
        .resources
        .list_resources_in_workspace(VIEW, "rbac", &principal("alice"), "ws-empty")
        .await?
        .collect()
        .await;

    assert!(allowed.is_empty());
    assert!(errors.is_empty());
    assert_eq!(fixture.authorizer.total_calls(), 0);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every candidate ends up allowed, failed or dropped, exactly once.
    #[test]
    fn prop_every_candidate_accounted_for(
        outcomes in prop::collection::vec(outcome(), 0..24),
        cap in prop::option::of(1usize..4),
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .unwrap();

        let config = ResourcesConfig::builder()
            .namespace(NAMESPACE)
            .maybe_max_concurrent_checks(cap)
            .build();
        let fixture = TestFixture::with_config(scripted(&outcomes), config);
        seed_workspace(&fixture, outcomes.len());

        let (allowed, errors) = runtime.block_on(async {
            fixture
                .resources
                .list_resources_in_workspace(VIEW, "rbac", &principal("alice"), "ws-1")
                .await
                .unwrap()
                .collect()
                .await
        });

        let expected_allowed = outcomes.iter().filter(|o| matches!(o, Outcome::Allow)).count();
        let expected_failed = outcomes.iter().filter(|o| matches!(o, Outcome::Fail)).count();
        prop_assert_eq!(allowed.len(), expected_allowed);
        prop_assert_eq!(errors.len(), expected_failed);
        prop_assert!(errors.iter().all(|e| e.is(ErrorKind::Unavailable)));
        if let Some(cap) = cap {
            prop_assert!(fixture.authorizer.max_in_flight() <= cap);
        }
    }
}
