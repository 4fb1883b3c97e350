//! The orchestrator driving the REST relations client against a mock server.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use inventory_authz::authz::RelationsClient;
use inventory_authz::testing::InMemoryResourceRepository;
use inventory_authz::types::{LookupResourcesRequest, ObjectType};
use inventory_authz::{ConsistencyToken, ErrorKind, Resources, ResourcesConfig};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{NAMESPACE, init_tracing, integration, key, principal};

fn orchestrator(server: &MockServer) -> (InMemoryResourceRepository, Resources) {
    init_tracing();
    let client = RelationsClient::builder()
        .base_url(server.uri())
        .expect("mock server uri should parse")
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client should build");

    let store = InMemoryResourceRepository::new();
    let resources = Resources::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Some(Arc::new(client)),
        ResourcesConfig::for_namespace(NAMESPACE),
    );
    (store, resources)
}

/// Create links the workspace over HTTP and keeps the returned token.
#[tokio::test]
async fn test_create_and_check_over_http() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/authz/v1beta1/tuples"))
        .and(body_partial_json(serde_json::json!({"upsert": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "consistencyToken": {"token": "after-link"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/authz/v1beta1/check"))
        .and(body_partial_json(serde_json::json!({
            "object": {"type": {"namespace": "rbac", "name": "integration"}, "id": "int-1"},
            "relation": "notifications_integration_view"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "allowed": "ALLOWED_TRUE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (store, resources) = orchestrator(&server);

    let created = resources.create(integration("int-1", "ws-1")).await?;
    assert_eq!(
        store.get(created.id).and_then(|r| r.consistency_token),
        Some(ConsistencyToken::new("after-link"))
    );

    let allowed = resources
        .check(
            "notifications_integration_view",
            "rbac",
            &principal("alice"),
            key("int-1"),
        )
        .await?;
    assert!(allowed);
    Ok(())
}

/// Delete removes the workspace tuple through the filter endpoint.
#[tokio::test]
async fn test_delete_unlinks_over_http() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/authz/v1beta1/tuples"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/authz/v1beta1/tuples"))
        .and(query_param("filter.resourceNamespace", NAMESPACE))
        .and(query_param("filter.resourceType", "integration"))
        .and(query_param("filter.resourceId", "int-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, resources) = orchestrator(&server);
    resources.create(integration("int-1", "ws-1")).await?;
    resources.delete(key("int-1")).await?;

    assert!(store.is_empty());
    Ok(())
}

/// HTTP failures keep the kind the client assigned.
#[tokio::test]
async fn test_backend_failure_passes_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/authz/v1beta1/checkforupdate"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(serde_json::json!({"message": "draining"})),
        )
        .mount(&server)
        .await;

    let (_, resources) = orchestrator(&server);
    let err = resources
        .check_for_update(
            "notifications_integration_write",
            "rbac",
            &principal("alice"),
            key("int-1"),
        )
        .await
        .expect_err("check for update should fail");

    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

/// Lookup streams frames straight from the server.
#[tokio::test]
async fn test_lookup_passthrough_over_http() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    let body = concat!(
        r#"{"result":{"resource":{"type":{"namespace":"notifications","name":"integration"},"id":"int-1"}}}"#,
        "\n",
        r#"{"result":{"resource":{"type":{"namespace":"notifications","name":"integration"},"id":"int-2"},"continuationToken":"c2"}}"#,
        "\n",
    );

    Mock::given(method("GET"))
        .and(path("/api/authz/v1beta1/resources"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-ndjson")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let (_, resources) = orchestrator(&server);
    let stream = resources
        .lookup_resources(LookupResourcesRequest {
            resource_type: ObjectType::new(NAMESPACE, "integration"),
            relation: "view".into(),
            subject: principal("alice"),
        })
        .await?;

    let results: Vec<_> = stream.collect().await;
    assert_eq!(results.len(), 2);
    let last = results[1].as_ref().expect("second frame should parse");
    assert_eq!(last.resource.id, "int-2");
    assert_eq!(last.continuation_token.as_deref(), Some("c2"));
    Ok(())
}
