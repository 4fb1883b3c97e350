//! Scripted authorization backend double.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Responses, Stub, stub, unstub};
use crate::authz::{Authorizer, HealthResponse, LookupResourcesStream};
use crate::types::{
    CreateTuplesRequest, CreateTuplesResponse, Decision, DeleteTuplesRequest,
    DeleteTuplesResponse, LookupResourcesRequest, LookupResourcesResponse, Resource,
    SubjectReference,
};
use crate::{Error, ErrorKind};

/// Authorizer methods, for [`MockAuthorizer::times_called`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AuthorizerMethod {
    Check,
    CheckForUpdate,
    CreateTuples,
    DeleteTuples,
    SetWorkspace,
    UnsetWorkspace,
    LookupResources,
    Health,
}

/// A recorded authorizer call with its arguments.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum AuthorizerCall {
    Check {
        namespace: String,
        permission: String,
        resource: Resource,
        subject: SubjectReference,
    },
    CheckForUpdate {
        namespace: String,
        permission: String,
        resource: Resource,
        subject: SubjectReference,
    },
    CreateTuples(CreateTuplesRequest),
    DeleteTuples(DeleteTuplesRequest),
    SetWorkspace {
        local_resource_id: String,
        workspace_id: String,
        namespace: String,
        name: String,
        upsert: bool,
    },
    UnsetWorkspace {
        namespace: String,
        local_resource_id: String,
        resource_type: String,
    },
    LookupResources(LookupResourcesRequest),
    Health,
}

impl AuthorizerCall {
    /// Returns the method this call was made to.
    pub fn method(&self) -> AuthorizerMethod {
        match self {
            AuthorizerCall::Check { .. } => AuthorizerMethod::Check,
            AuthorizerCall::CheckForUpdate { .. } => AuthorizerMethod::CheckForUpdate,
            AuthorizerCall::CreateTuples(_) => AuthorizerMethod::CreateTuples,
            AuthorizerCall::DeleteTuples(_) => AuthorizerMethod::DeleteTuples,
            AuthorizerCall::SetWorkspace { .. } => AuthorizerMethod::SetWorkspace,
            AuthorizerCall::UnsetWorkspace { .. } => AuthorizerMethod::UnsetWorkspace,
            AuthorizerCall::LookupResources(_) => AuthorizerMethod::LookupResources,
            AuthorizerCall::Health => AuthorizerMethod::Health,
        }
    }
}

#[derive(Debug, Clone)]
struct CheckRule {
    permission: String,
    resource_type: Option<String>,
    latency: Option<Duration>,
    outcome: Stub<Decision>,
}

impl CheckRule {
    fn matches(&self, permission: &str, resource: &Resource) -> bool {
        self.permission == permission
            && self
                .resource_type
                .as_deref()
                .is_none_or(|t| t == resource.resource_type)
    }
}

#[derive(Default)]
struct State {
    check_rules: Vec<CheckRule>,
    check_for_update_rules: Vec<CheckRule>,
    create_tuples: Responses<Stub<CreateTuplesResponse>>,
    delete_tuples: Responses<Stub<DeleteTuplesResponse>>,
    set_workspace: Responses<Stub<CreateTuplesResponse>>,
    unset_workspace: Responses<Stub<DeleteTuplesResponse>>,
    lookup: Option<Stub<Vec<Stub<LookupResourcesResponse>>>>,
    health: Responses<Stub<HealthResponse>>,
    calls: Vec<AuthorizerCall>,
}

/// An authorizer double with scripted decisions.
///
/// Check decisions are matched by permission and, optionally, by the
/// object's resource type; the first matching rule wins. A check with no
/// matching rule fails with [`ErrorKind::Internal`].
///
/// Tuple writes, workspace links and health succeed with empty responses
/// unless scripted otherwise. Clones share state.
///
/// ## Example
///
/// ```rust
/// use inventory_authz::testing::{AuthorizerMethod, MockAuthorizer};
/// use inventory_authz::{Decision, Error, ErrorKind};
///
/// let authorizer = MockAuthorizer::new()
///     .on_check_for("view", "host", Ok(Decision::allowed()))
///     .on_check_for("view", "cluster", Err(Error::new(ErrorKind::Unavailable, "down")))
///     .on_check("edit", Ok(Decision::denied()));
///
/// assert_eq!(authorizer.times_called(AuthorizerMethod::Check), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockAuthorizer {
    state: Arc<Mutex<State>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MockAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAuthorizer")
            .field("calls", &self.state.lock().calls.len())
            .finish_non_exhaustive()
    }
}

impl MockAuthorizer {
    /// Creates a mock with no check rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `check` calls for `permission`.
    #[must_use]
    pub fn on_check(self, permission: impl Into<String>, outcome: Result<Decision, Error>) -> Self {
        self.add_check_rule(permission.into(), None, None, outcome)
    }

    /// Answers `check` calls for `permission` on objects of `resource_type`.
    #[must_use]
    pub fn on_check_for(
        self,
        permission: impl Into<String>,
        resource_type: impl Into<String>,
        outcome: Result<Decision, Error>,
    ) -> Self {
        self.add_check_rule(permission.into(), Some(resource_type.into()), None, outcome)
    }

    /// Like [`on_check`](Self::on_check), answering after `latency`.
    #[must_use]
    pub fn on_check_delayed(
        self,
        permission: impl Into<String>,
        latency: Duration,
        outcome: Result<Decision, Error>,
    ) -> Self {
        self.add_check_rule(permission.into(), None, Some(latency), outcome)
    }

    /// Like [`on_check_for`](Self::on_check_for), answering after `latency`.
    #[must_use]
    pub fn on_check_for_delayed(
        self,
        permission: impl Into<String>,
        resource_type: impl Into<String>,
        latency: Duration,
        outcome: Result<Decision, Error>,
    ) -> Self {
        self.add_check_rule(
            permission.into(),
            Some(resource_type.into()),
            Some(latency),
            outcome,
        )
    }

    /// Answers `check_for_update` calls for `permission`.
    #[must_use]
    pub fn on_check_for_update(
        self,
        permission: impl Into<String>,
        outcome: Result<Decision, Error>,
    ) -> Self {
        self.state.lock().check_for_update_rules.push(CheckRule {
            permission: permission.into(),
            resource_type: None,
            latency: None,
            outcome: stub(outcome),
        });
        self
    }

    /// Queues a `create_tuples` response.
    #[must_use]
    pub fn on_create_tuples(self, result: Result<CreateTuplesResponse, Error>) -> Self {
        self.state.lock().create_tuples.push(stub(result));
        self
    }

    /// Queues a `delete_tuples` response.
    #[must_use]
    pub fn on_delete_tuples(self, result: Result<DeleteTuplesResponse, Error>) -> Self {
        self.state.lock().delete_tuples.push(stub(result));
        self
    }

    /// Queues a `set_workspace` response.
    #[must_use]
    pub fn on_set_workspace(self, result: Result<CreateTuplesResponse, Error>) -> Self {
        self.state.lock().set_workspace.push(stub(result));
        self
    }

    /// Queues an `unset_workspace` response.
    #[must_use]
    pub fn on_unset_workspace(self, result: Result<DeleteTuplesResponse, Error>) -> Self {
        self.state.lock().unset_workspace.push(stub(result));
        self
    }

    /// Sets the elements every `lookup_resources` stream yields.
    #[must_use]
    pub fn on_lookup_resources(self, items: Vec<Result<LookupResourcesResponse, Error>>) -> Self {
        self.state.lock().lookup = Some(Ok(items.into_iter().map(stub).collect()));
        self
    }

    /// Makes `lookup_resources` fail before any stream is opened.
    #[must_use]
    pub fn on_lookup_error(self, error: Error) -> Self {
        self.state.lock().lookup = Some(Err((error.kind(), error.message().to_owned())));
        self
    }

    /// Queues a `health` response.
    #[must_use]
    pub fn on_health(self, result: Result<HealthResponse, Error>) -> Self {
        self.state.lock().health.push(stub(result));
        self
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<AuthorizerCall> {
        self.state.lock().calls.clone()
    }

    /// Returns how many times `method` was called.
    pub fn times_called(&self, method: AuthorizerMethod) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.method() == method)
            .count()
    }

    /// Returns the number of calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Returns the requests passed to `lookup_resources`.
    pub fn lookup_requests(&self) -> Vec<LookupResourcesRequest> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                AuthorizerCall::LookupResources(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the highest number of checks that were running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Clears rules, scripted responses and recorded calls.
    pub fn reset(&self) {
        *self.state.lock() = State::default();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    fn add_check_rule(
        self,
        permission: String,
        resource_type: Option<String>,
        latency: Option<Duration>,
        outcome: Result<Decision, Error>,
    ) -> Self {
        self.state.lock().check_rules.push(CheckRule {
            permission,
            resource_type,
            latency,
            outcome: stub(outcome),
        });
        self
    }

    fn record(&self, call: AuthorizerCall) {
        self.state.lock().calls.push(call);
    }

    async fn decide(
        &self,
        rule: Option<CheckRule>,
        permission: &str,
        resource: &Resource,
    ) -> Result<Decision, Error> {
        let Some(rule) = rule else {
            return Err(Error::new(
                ErrorKind::Internal,
                format!(
                    "no check response configured for {permission} on {}",
                    resource.resource_type
                ),
            ));
        };

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(latency) = rule.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        unstub(&rule.outcome)
    }
}

#[async_trait]
impl Authorizer for MockAuthorizer {
    async fn check(
        &self,
        namespace: &str,
        permission: &str,
        resource: &Resource,
        subject: &SubjectReference,
    ) -> Result<Decision, Error> {
        let rule = {
            let mut state = self.state.lock();
            state.calls.push(AuthorizerCall::Check {
                namespace: namespace.to_owned(),
                permission: permission.to_owned(),
                resource: resource.clone(),
                subject: subject.clone(),
            });
            state
                .check_rules
                .iter()
                .find(|rule| rule.matches(permission, resource))
                .cloned()
        };
        self.decide(rule, permission, resource).await
    }

    async fn check_for_update(
        &self,
        namespace: &str,
        permission: &str,
        resource: &Resource,
        subject: &SubjectReference,
    ) -> Result<Decision, Error> {
        let rule = {
            let mut state = self.state.lock();
            state.calls.push(AuthorizerCall::CheckForUpdate {
                namespace: namespace.to_owned(),
                permission: permission.to_owned(),
                resource: resource.clone(),
                subject: subject.clone(),
            });
            state
                .check_for_update_rules
                .iter()
                .find(|rule| rule.matches(permission, resource))
                .cloned()
        };
        self.decide(rule, permission, resource).await
    }

    async fn create_tuples(
        &self,
        request: CreateTuplesRequest,
    ) -> Result<CreateTuplesResponse, Error> {
        self.record(AuthorizerCall::CreateTuples(request));
        let next = self.state.lock().create_tuples.next();
        next.map_or_else(|| Ok(CreateTuplesResponse::default()), |s| unstub(&s))
    }

    async fn delete_tuples(
        &self,
        request: DeleteTuplesRequest,
    ) -> Result<DeleteTuplesResponse, Error> {
        self.record(AuthorizerCall::DeleteTuples(request));
        let next = self.state.lock().delete_tuples.next();
        next.map_or_else(|| Ok(DeleteTuplesResponse::default()), |s| unstub(&s))
    }

    async fn set_workspace(
        &self,
        local_resource_id: &str,
        workspace_id: &str,
        namespace: &str,
        name: &str,
        upsert: bool,
    ) -> Result<CreateTuplesResponse, Error> {
        self.record(AuthorizerCall::SetWorkspace {
            local_resource_id: local_resource_id.to_owned(),
            workspace_id: workspace_id.to_owned(),
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            upsert,
        });
        let next = self.state.lock().set_workspace.next();
        next.map_or_else(|| Ok(CreateTuplesResponse::default()), |s| unstub(&s))
    }

    async fn unset_workspace(
        &self,
        namespace: &str,
        local_resource_id: &str,
        resource_type: &str,
    ) -> Result<DeleteTuplesResponse, Error> {
        self.record(AuthorizerCall::UnsetWorkspace {
            namespace: namespace.to_owned(),
            local_resource_id: local_resource_id.to_owned(),
            resource_type: resource_type.to_owned(),
        });
        let next = self.state.lock().unset_workspace.next();
        next.map_or_else(|| Ok(DeleteTuplesResponse::default()), |s| unstub(&s))
    }

    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> Result<LookupResourcesStream, Error> {
        self.record(AuthorizerCall::LookupResources(request));
        let items = match self.state.lock().lookup.clone() {
            None => Vec::new(),
            Some(Ok(items)) => items,
            Some(Err((kind, message))) => return Err(Error::new(kind, message)),
        };
        let items: Vec<_> = items.iter().map(unstub).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn health(&self) -> Result<HealthResponse, Error> {
        self.record(AuthorizerCall::Health);
        let next = self.state.lock().health.next();
        next.map_or_else(
            || Ok(HealthResponse::healthy(Duration::ZERO)),
            |s| unstub(&s),
        )
    }
}
