//! Error types for inventory orchestration.
//!
//! [`Error`] is the single error type returned by every operation. Match on
//! [`Error::kind`] to branch on the lifecycle taxonomy:
//!
//! - [`ErrorKind::ResourceAlreadyExists`]: create on an existing identity
//! - [`ErrorKind::ResourceNotFound`]: delete or read on a missing identity
//! - [`ErrorKind::Database`]: any store failure other than "not found"
//!
//! Errors from the authorization backend are returned as-is, with whatever
//! kind the [`Authorizer`](crate::authz::Authorizer) assigned them.
//!
//! ## Key Invariant
//!
//! A permission check returns `Ok(false)` for denied access, not `Err`.
//!
//! ```rust,ignore
//! match resources.check("view", "rbac", &subject, key).await {
//!     Ok(true) => println!("allowed"),
//!     Ok(false) => println!("denied"),
//!     Err(e) if e.is(ErrorKind::Database) => println!("inventory unavailable"),
//!     Err(e) => println!("authorization backend failed: {e}"),
//! }
//! ```

mod core;
mod kind;

pub use core::Error;
pub use kind::ErrorKind;

/// A specialized `Result` type for inventory operations.
pub type Result<T> = std::result::Result<T, Error>;
