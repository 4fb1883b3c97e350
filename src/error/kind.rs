//! Error kind enumeration for categorizing orchestration errors.

/// Categorization of errors returned by this crate.
///
/// This enum provides a stable interface for matching on error types. The
/// first three kinds are raised by the [`Resources`](crate::Resources)
/// orchestrator itself; every other kind originates in an
/// [`Authorizer`](crate::authz::Authorizer) implementation and is passed
/// through to the caller untouched.
///
/// ## Lifecycle Kinds
///
/// | ErrorKind               | Raised when                                      |
/// |-------------------------|--------------------------------------------------|
/// | `ResourceAlreadyExists` | Create on an identity that is already stored     |
/// | `ResourceNotFound`      | Delete or read on an identity that is not stored |
/// | `Database`              | Any store failure other than "not found"         |
///
/// ## Retriable vs Non-Retriable
///
/// The crate never retries on its own. [`ErrorKind::is_retriable`] only
/// classifies authorization-backend failures for callers that do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Create was called for a reporter identity that already exists.
    #[error("resource already exists")]
    ResourceAlreadyExists,

    /// The reporter identity is not present under any lookup scheme.
    #[error("resource not found")]
    ResourceNotFound,

    /// The resource store failed with something other than "not found".
    ///
    /// The underlying [`StoreError`](crate::store::StoreError) is available
    /// through [`std::error::Error::source`].
    #[error("database error")]
    Database,

    /// Authentication with the authorization backend failed.
    ///
    /// HTTP: 401 Unauthorized
    #[error("unauthorized")]
    Unauthorized,

    /// The caller is not permitted to use the authorization backend.
    ///
    /// HTTP: 403 Forbidden
    #[error("forbidden")]
    Forbidden,

    /// The authorization backend could not find the requested entity.
    ///
    /// This is distinct from [`ErrorKind::ResourceNotFound`], which refers to
    /// the inventory.
    ///
    /// HTTP: 404 Not Found
    #[error("not found")]
    NotFound,

    /// Invalid request argument or payload.
    ///
    /// HTTP: 400 Bad Request
    #[error("invalid argument")]
    InvalidArgument,

    /// Conflict with existing tuple state.
    ///
    /// HTTP: 409 Conflict
    #[error("conflict")]
    Conflict,

    /// Rate limit exceeded.
    ///
    /// HTTP: 429 Too Many Requests
    #[error("rate limited")]
    RateLimited,

    /// Authorization backend temporarily unavailable.
    ///
    /// HTTP: 5xx
    #[error("service unavailable")]
    Unavailable,

    /// Request timed out.
    #[error("timeout")]
    Timeout,

    /// Internal error, including a listing check task that did not finish.
    #[error("internal error")]
    Internal,

    /// Connection error (DNS, TLS handshake, network unreachable).
    #[error("connection error")]
    Connection,

    /// Protocol error (malformed stream frame, unexpected status).
    #[error("protocol error")]
    Protocol,

    /// Configuration error (invalid URL, authorization integration disabled).
    #[error("configuration error")]
    Configuration,

    /// Generic transport error for HTTP issues that fit no other kind.
    #[error("transport error")]
    Transport,

    /// Response could not be parsed.
    #[error("invalid response")]
    InvalidResponse,

    /// Unknown or unexpected error.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if this error kind is generally safe to retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use inventory_authz::ErrorKind;
    ///
    /// assert!(ErrorKind::Timeout.is_retriable());
    /// assert!(!ErrorKind::ResourceAlreadyExists.is_retriable());
    /// ```
    #[inline]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::Connection
        )
    }

    /// Returns `true` for the kinds raised by the orchestrator itself.
    #[inline]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            ErrorKind::ResourceAlreadyExists | ErrorKind::ResourceNotFound | ErrorKind::Database
        )
    }

    /// Creates an `ErrorKind` from an HTTP status code.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::InvalidArgument,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Unavailable,
            _ => ErrorKind::Transport,
        }
    }
}
