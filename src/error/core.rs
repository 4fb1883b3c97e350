//! Main error type for inventory orchestration.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use super::ErrorKind;
use crate::store::StoreError;

/// The primary error type for inventory orchestration.
///
/// `Error` carries:
/// - [`kind()`](Error::kind): Categorization for `match` statements
/// - a human-readable message
/// - an optional underlying cause, exposed through [`StdError::source`]
///
/// ## Error Hierarchy
///
/// ```text
/// Error
/// ├── kind: ErrorKind          (category for matching)
/// ├── message: Cow<str>        (human-readable description)
/// └── source: Option           (underlying cause, e.g. StoreError)
/// ```
///
/// ## Example
///
/// ```rust
/// use inventory_authz::{Error, ErrorKind};
///
/// fn describe(err: &Error) -> &'static str {
///     match err.kind() {
///         ErrorKind::ResourceAlreadyExists => "conflict",
///         ErrorKind::ResourceNotFound => "missing",
///         ErrorKind::Database => "storage failure",
///         kind if kind.is_retriable() => "transient backend failure",
///         _ => "backend failure",
///     }
/// }
///
/// assert_eq!(describe(&Error::resource_not_found()), "missing");
/// ```
#[derive(Debug)]
pub struct Error {
    /// The error category.
    kind: ErrorKind,

    /// Human-readable error message.
    message: Cow<'static, str>,

    /// The underlying error, if any.
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    ///
    /// # Example
    ///
    /// ```rust
    /// use inventory_authz::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::InvalidArgument, "workspace id cannot be empty");
    /// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    /// ```
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error from a kind with a default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::ResourceAlreadyExists => "resource already exists",
            ErrorKind::ResourceNotFound => "resource not found",
            ErrorKind::Database => "database error",
            ErrorKind::Unauthorized => "authentication failed",
            ErrorKind::Forbidden => "permission denied",
            ErrorKind::NotFound => "entity not found",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Conflict => "conflict",
            ErrorKind::RateLimited => "rate limit exceeded",
            ErrorKind::Unavailable => "service unavailable",
            ErrorKind::Timeout => "request timed out",
            ErrorKind::Internal => "internal error",
            ErrorKind::Connection => "connection failed",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Transport => "transport error",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Unknown => "unknown error",
        };
        Self::new(kind, message)
    }

    /// Returns the error kind for categorization.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message without the kind prefix.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error is of the given kind.
    ///
    /// This is the crate's equivalent of identity matching against the error
    /// taxonomy, and works the same whether the error was raised by the
    /// orchestrator or passed through from the authorization backend.
    #[inline]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Returns `true` if this error is generally safe to retry.
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    /// Sets the source error for this error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors for the lifecycle taxonomy

    /// Creates a resource-already-exists error.
    pub fn resource_already_exists() -> Self {
        Self::from_kind(ErrorKind::ResourceAlreadyExists)
    }

    /// Creates a resource-not-found error.
    pub fn resource_not_found() -> Self {
        Self::from_kind(ErrorKind::ResourceNotFound)
    }

    /// Wraps a store failure as a database error.
    ///
    /// The store error stays reachable through [`StdError::source`].
    pub fn database(source: StoreError) -> Self {
        Self::new(ErrorKind::Database, source.to_string()).with_source(source)
    }

    // Convenience constructors for backend-side errors

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::database(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::configuration(format!("invalid URL: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::InvalidResponse, format!("JSON error: {}", err)).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_new() {
        let err = Error::new(ErrorKind::InvalidArgument, "test message");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.message(), "test message");
        assert!(err.to_string().contains("test message"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_lifecycle_constructors() {
        assert!(Error::resource_already_exists().is(ErrorKind::ResourceAlreadyExists));
        assert!(Error::resource_not_found().is(ErrorKind::ResourceNotFound));
        assert!(!Error::resource_not_found().is(ErrorKind::NotFound));
    }

    #[test]
    fn test_database_keeps_store_error_as_source() {
        let err = Error::database(StoreError::DuplicatedKey("reporter_resource_pkey".into()));
        assert!(err.is(ErrorKind::Database));
        assert!(err.to_string().contains("reporter_resource_pkey"));

        let source = err.source().and_then(|s| s.downcast_ref::<StoreError>());
        assert_eq!(
            source,
            Some(&StoreError::DuplicatedKey("reporter_resource_pkey".into()))
        );
    }

    #[test]
    fn test_from_store_error() {
        let err: Error = StoreError::Backend("connection reset".into()).into();
        assert_eq!(err.kind(), ErrorKind::Database);
    }

    #[test]
    fn test_from_error_kind() {
        let err: Error = ErrorKind::Timeout.into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_retriable());
    }

    #[test]
    fn test_display_format() {
        let err = Error::unavailable("relations service down");
        assert_eq!(err.to_string(), "service unavailable: relations service down");
    }
}
