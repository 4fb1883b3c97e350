//! Relations service client over its HTTP/JSON gateway.
//!
//! Every call is a single request; nothing is retried here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{Authorizer, HealthResponse, LookupResourcesStream};
use crate::config::TlsConfig;
use crate::error::ErrorKind;
use crate::types::{
    CreateTuplesRequest, CreateTuplesResponse, Decision, DeleteTuplesRequest,
    DeleteTuplesResponse, LookupResourcesRequest, LookupResourcesResponse, ObjectReference,
    Relationship, Resource, SubjectReference,
};
use crate::user_agent;
use crate::Error;

const CHECK_PATH: &str = "/api/authz/v1beta1/check";
const CHECK_FOR_UPDATE_PATH: &str = "/api/authz/v1beta1/checkforupdate";
const TUPLES_PATH: &str = "/api/authz/v1beta1/tuples";
const LOOKUP_RESOURCES_PATH: &str = "/api/authz/v1beta1/resources";
const READYZ_PATH: &str = "/api/authz/readyz";

// ============================================================================
// Relations Client
// ============================================================================

/// [`Authorizer`] backed by the relations service HTTP gateway.
///
/// ## Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use inventory_authz::authz::RelationsClient;
///
/// # fn main() -> Result<(), inventory_authz::Error> {
/// let client = RelationsClient::builder()
///     .base_url("http://relations-api:8000")?
///     .timeout(Duration::from_secs(5))
///     .bearer_token("service-token")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RelationsClient {
    client: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl std::fmt::Debug for RelationsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationsClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RelationsClient {
    /// Creates a new client builder.
    pub fn builder() -> RelationsClientBuilder {
        RelationsClientBuilder::new()
    }

    fn new(
        base_url: Url,
        tls_config: &TlsConfig,
        timeout: Duration,
        bearer_token: Option<String>,
    ) -> Result<Self, Error> {
        let mut client_builder = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent::user_agent());

        if tls_config.skip_verification {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref ca_cert_file) = tls_config.ca_cert_file {
            let cert_pem = std::fs::read(ca_cert_file).map_err(|e| {
                Error::configuration(format!(
                    "Failed to read certificate {:?}: {}",
                    ca_cert_file, e
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                Error::configuration(format!("Invalid certificate {:?}: {}", ca_cert_file, e))
            })?;
            client_builder = client_builder.add_root_certificate(cert);
        }

        if let Some(ref ca_cert_pem) = tls_config.ca_cert_pem {
            let cert = reqwest::Certificate::from_pem(ca_cert_pem.as_bytes()).map_err(|e| {
                Error::configuration(format!("Invalid CA certificate PEM: {}", e))
            })?;
            client_builder = client_builder.add_root_certificate(cert);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            bearer_token,
        })
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_headers(&self, accept: &'static str) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(accept));

        if let Some(ref token) = self.bearer_token {
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|_| Error::configuration("Invalid bearer token format"))?,
            );
        }

        Ok(headers)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::configuration(format!("Invalid URL path: {}", e)))
    }

    async fn post<T, R>(&self, path: &str, body: &T) -> Result<R, Error>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path)?)
            .headers(self.build_headers("application/json")?)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        handle_response(response).await
    }

    async fn delete_request<R>(&self, url: Url) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let response = self
            .client
            .delete(url)
            .headers(self.build_headers("application/json")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        handle_response(response).await
    }

    async fn check_at(
        &self,
        path: &str,
        namespace: &str,
        permission: &str,
        resource: &Resource,
        subject: &SubjectReference,
        consistency: Option<Consistency>,
    ) -> Result<Decision, Error> {
        let body = CheckRequestBody {
            object: ObjectReference::for_resource(namespace, resource),
            relation: permission,
            subject,
            consistency,
        };
        self.post(path, &body).await
    }
}

// ============================================================================
// Relations Client Builder
// ============================================================================

/// Builder for [`RelationsClient`].
pub struct RelationsClientBuilder {
    base_url: Option<Url>,
    tls_config: TlsConfig,
    timeout: Duration,
    bearer_token: Option<String>,
}

impl RelationsClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            tls_config: TlsConfig::default(),
            timeout: Duration::from_secs(10),
            bearer_token: None,
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self, Error> {
        self.base_url = Some(
            Url::parse(url.as_ref())
                .map_err(|e| Error::configuration(format!("Invalid base URL: {}", e)))?,
        );
        Ok(self)
    }

    /// Sets the TLS configuration.
    #[must_use]
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = config;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a bearer token sent on every request.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<RelationsClient, Error> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::configuration("Base URL is required"))?;

        RelationsClient::new(base_url, &self.tls_config, self.timeout, self.bearer_token)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct Consistency {
    minimize_latency: bool,
}

#[derive(Debug, Serialize)]
struct CheckRequestBody<'a> {
    object: ObjectReference,
    relation: &'a str,
    subject: &'a SubjectReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    consistency: Option<Consistency>,
}

/// One NDJSON frame of a streamed lookup.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    result: Option<LookupResourcesResponse>,
    #[serde(default)]
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl From<RpcStatus> for Error {
    fn from(status: RpcStatus) -> Self {
        let kind = match status.code {
            3 => ErrorKind::InvalidArgument,
            4 => ErrorKind::Timeout,
            5 => ErrorKind::NotFound,
            6 => ErrorKind::Conflict,
            7 => ErrorKind::Forbidden,
            8 => ErrorKind::RateLimited,
            13 => ErrorKind::Internal,
            14 => ErrorKind::Unavailable,
            16 => ErrorKind::Unauthorized,
            _ => ErrorKind::Unknown,
        };
        Error::new(kind, status.message)
    }
}

// ============================================================================
// Authorizer Implementation
// ============================================================================

#[async_trait]
impl Authorizer for RelationsClient {
    async fn check(
        &self,
        namespace: &str,
        permission: &str,
        resource: &Resource,
        subject: &SubjectReference,
    ) -> Result<Decision, Error> {
        self.check_at(
            CHECK_PATH,
            namespace,
            permission,
            resource,
            subject,
            Some(Consistency {
                minimize_latency: true,
            }),
        )
        .await
    }

    async fn check_for_update(
        &self,
        namespace: &str,
        permission: &str,
        resource: &Resource,
        subject: &SubjectReference,
    ) -> Result<Decision, Error> {
        self.check_at(
            CHECK_FOR_UPDATE_PATH,
            namespace,
            permission,
            resource,
            subject,
            None,
        )
        .await
    }

    async fn create_tuples(
        &self,
        request: CreateTuplesRequest,
    ) -> Result<CreateTuplesResponse, Error> {
        self.post(TUPLES_PATH, &request).await
    }

    async fn delete_tuples(
        &self,
        request: DeleteTuplesRequest,
    ) -> Result<DeleteTuplesResponse, Error> {
        let mut url = self.url(TUPLES_PATH)?;
        url.query_pairs_mut()
            .extend_pairs(request.filter.query_pairs());
        self.delete_request(url).await
    }

    async fn set_workspace(
        &self,
        local_resource_id: &str,
        workspace_id: &str,
        namespace: &str,
        name: &str,
        upsert: bool,
    ) -> Result<CreateTuplesResponse, Error> {
        self.create_tuples(CreateTuplesRequest {
            upsert,
            tuples: vec![Relationship::workspace(
                namespace,
                name,
                local_resource_id,
                workspace_id,
            )],
        })
        .await
    }

    async fn unset_workspace(
        &self,
        namespace: &str,
        local_resource_id: &str,
        resource_type: &str,
    ) -> Result<DeleteTuplesResponse, Error> {
        self.delete_tuples(DeleteTuplesRequest {
            filter: crate::types::RelationTupleFilter::workspace(
                namespace,
                local_resource_id,
                resource_type,
            ),
        })
        .await
    }

    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> Result<LookupResourcesStream, Error> {
        let mut url = self.url(LOOKUP_RESOURCES_PATH)?;
        {
            let subject = &request.subject;
            let mut query = url.query_pairs_mut();
            query
                .append_pair("resourceType.namespace", &request.resource_type.namespace)
                .append_pair("resourceType.name", &request.resource_type.name)
                .append_pair("relation", &request.relation)
                .append_pair(
                    "subject.subject.type.namespace",
                    &subject.subject.object_type.namespace,
                )
                .append_pair("subject.subject.type.name", &subject.subject.object_type.name)
                .append_pair("subject.subject.id", &subject.subject.id);
            if let Some(ref relation) = subject.relation {
                query.append_pair("subject.relation", relation);
            }
        }

        let response = self
            .client
            .get(url)
            .headers(self.build_headers("application/x-ndjson")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status.as_u16(), &error_text));
        }

        Ok(Box::pin(parse_ndjson_stream(Box::pin(
            response.bytes_stream(),
        ))))
    }

    async fn health(&self) -> Result<HealthResponse, Error> {
        let started = Instant::now();
        let response = self
            .client
            .get(self.url(READYZ_PATH)?)
            .headers(self.build_headers("application/json")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let latency = started.elapsed();

        let status = response.status();
        if status.is_success() {
            Ok(HealthResponse::healthy(latency))
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok(HealthResponse::unhealthy(
                error_message(status.as_u16(), &body),
                latency,
            ))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn handle_response<R>(response: reqwest::Response) -> Result<R, Error>
where
    R: DeserializeOwned,
{
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(map_status_error(status.as_u16(), &error_text));
    }

    response.json::<R>().await.map_err(|e| {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Failed to parse response: {}", e),
        )
    })
}

/// Splits a byte stream into newline-delimited frames.
///
/// A trailing frame without a newline is still delivered at end of stream.
fn parse_ndjson_stream(
    byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin + Send + 'static,
) -> impl Stream<Item = Result<LookupResourcesResponse, Error>> + Send {
    futures::stream::unfold(
        (byte_stream, BytesMut::new(), false),
        |(mut stream, mut buffer, mut done)| async move {
            loop {
                if let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line = buffer.split_to(pos);
                    buffer.advance(1);
                    match parse_frame(&line) {
                        Some(item) => return Some((item, (stream, buffer, done))),
                        None => continue,
                    }
                }

                if done {
                    if buffer.is_empty() {
                        return None;
                    }
                    let line = buffer.split();
                    match parse_frame(&line) {
                        Some(item) => return Some((item, (stream, buffer, done))),
                        None => return None,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        buffer.clear();
                        return Some((Err(map_reqwest_error(e)), (stream, buffer, true)));
                    }
                    None => done = true,
                }
            }
        },
    )
}

/// Parses one frame; blank lines yield `None`.
fn parse_frame(line: &[u8]) -> Option<Result<LookupResourcesResponse, Error>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    let frame = match serde_json::from_slice::<StreamFrame>(line) {
        Ok(frame) => frame,
        Err(e) => {
            return Some(Err(Error::protocol(format!(
                "Malformed stream frame: {}",
                e
            ))));
        }
    };

    match (frame.result, frame.error) {
        (_, Some(status)) => Some(Err(status.into())),
        (Some(result), None) => Some(Ok(result)),
        (None, None) => Some(Err(Error::protocol("Stream frame has neither result nor error"))),
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::new(ErrorKind::Timeout, format!("Request timed out: {}", e))
    } else if e.is_connect() {
        Error::new(ErrorKind::Connection, format!("Connection failed: {}", e))
    } else if e.is_request() {
        Error::new(
            ErrorKind::InvalidArgument,
            format!("Invalid request: {}", e),
        )
    } else {
        Error::new(ErrorKind::Transport, format!("HTTP error: {}", e))
    }
}

/// Extracts a message from a gateway error body (`{"code", "message"}`).
fn error_message(status: u16, body: &str) -> String {
    if body.is_empty() {
        return format!("HTTP {}", status);
    }
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.to_owned())
}

fn map_status_error(status: u16, body: &str) -> Error {
    Error::new(
        ErrorKind::from_http_status(status),
        error_message(status, body),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_error() {
        let err = map_status_error(401, "");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "HTTP 401");

        let err = map_status_error(404, r#"{"code":5,"message":"tuple not found"}"#);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "tuple not found");

        let err = map_status_error(503, "upstream connect error");
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(err.message(), "upstream connect error");
    }

    #[test]
    fn test_parse_frame_result() {
        let line = br#"{"result":{"resource":{"type":{"namespace":"hbi","name":"host"},"id":"h1"}}}"#;
        let item = parse_frame(line).unwrap().unwrap();
        assert_eq!(item.resource.id, "h1");
        assert!(item.continuation_token.is_none());
    }

    #[test]
    fn test_parse_frame_error() {
        let line = br#"{"error":{"code":14,"message":"relations unavailable"}}"#;
        let err = parse_frame(line).unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(err.message(), "relations unavailable");
    }

    #[test]
    fn test_parse_frame_blank_and_malformed() {
        assert!(parse_frame(b"   ").is_none());
        let err = parse_frame(b"not json").unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_builder() {
        let result = RelationsClient::builder()
            .base_url("http://localhost:8000")
            .unwrap()
            .timeout(Duration::from_secs(1))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_invalid_url() {
        let result = RelationsClient::builder().base_url("not a url");
        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Configuration));
    }

    #[test]
    fn test_builder_missing_url() {
        let result = RelationsClient::builder().build();
        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Configuration));
    }
}
