//! Common test harness for orchestrator integration tests.

use std::sync::{Arc, Once};

use inventory_authz::authz::Authorizer;
use inventory_authz::testing::{InMemoryResourceRepository, MockAuthorizer};
use inventory_authz::types::{ObjectReference, ObjectType, SubjectReference};
use inventory_authz::{
    Label, Reporter, ReporterResourceId, Resource, ResourceReporter, Resources, ResourcesConfig,
};

/// Namespace used for workspace tuples in every fixture.
pub const NAMESPACE: &str = "notifications";

static TRACING: Once = Once::new();

/// Installs a log subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An orchestrator wired to an in-memory store and a scripted authorizer.
pub struct TestFixture {
    pub store: InMemoryResourceRepository,
    pub authorizer: MockAuthorizer,
    pub resources: Resources,
}

impl TestFixture {
    /// Creates a fixture with the default configuration.
    pub fn new(authorizer: MockAuthorizer) -> Self {
        Self::with_config(authorizer, ResourcesConfig::for_namespace(NAMESPACE))
    }

    /// Creates a fixture with a custom configuration.
    pub fn with_config(authorizer: MockAuthorizer, config: ResourcesConfig) -> Self {
        init_tracing();
        let store = InMemoryResourceRepository::new();
        let resources = Resources::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Some(Arc::new(authorizer.clone()) as Arc<dyn Authorizer>),
            config,
        );
        Self {
            store,
            authorizer,
            resources,
        }
    }
}

/// Builds an unsaved integration resource reported by `reporter_id`.
pub fn integration(local_id: &str, workspace_id: &str) -> Resource {
    Resource::builder()
        .org_id("org-1")
        .resource_type("integration")
        .workspace_id(workspace_id)
        .reporter(ResourceReporter::new(
            Reporter::builder()
                .reporter_id("reporter-1")
                .reporter_type("NOTIFICATIONS")
                .reporter_version("1.0.0")
                .build(),
            local_id,
        ))
        .labels(vec![Label::new("env", "stage")])
        .build()
}

/// Legacy identity for a resource built by [`integration`].
pub fn key(local_id: &str) -> ReporterResourceId {
    ReporterResourceId::builder()
        .local_resource_id(local_id)
        .resource_type("integration")
        .reporter_id("reporter-1")
        .reporter_type("NOTIFICATIONS")
        .build()
}

/// A principal subject.
pub fn principal(id: &str) -> SubjectReference {
    SubjectReference::new(ObjectReference::new(ObjectType::new("rbac", "principal"), id))
}
