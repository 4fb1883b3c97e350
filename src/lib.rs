//! # Inventory Authz
//!
//! Orchestration between a resource inventory store and a relationship-based
//! authorization service.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use inventory_authz::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), inventory_authz::Error> {
//!     let relations = RelationsClient::builder()
//!         .base_url("https://relations.example.com")?
//!         .bearer_token("token")
//!         .build()?;
//!
//!     let resources = Resources::new(
//!         Arc::new(my_store.clone()),
//!         Arc::new(my_store),
//!         Some(Arc::new(relations)),
//!         ResourcesConfig::for_namespace("notifications"),
//!     );
//!
//!     let created = resources.create(resource).await?;
//!     let allowed = resources
//!         .check("notifications_integration_view", "notifications", &subject, &created)
//!         .await?;
//!     println!("Allowed: {}", allowed);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **Capabilities**: the store ([`store::ResourceRepository`]) and the
//!   authorization backend ([`authz::Authorizer`]) are traits; the orchestrator
//!   owns neither.
//! - **Two lookup schemes**: identities resolve through the current unique
//!   index, then the legacy reporter identity. Only "not found" falls back.
//! - **Denial ≠ Error**: `check()` returns `Ok(false)` for denied access, not `Err`
//! - **Authorization optional**: without an authorizer, lifecycle operations
//!   skip tuple writes and permission operations fail with
//!   [`ErrorKind::Configuration`].
//!
//! ## Features
//!
//! - `rest` (default): [`authz::RelationsClient`] over the relations HTTP gateway via reqwest
//! - `rustls` (default): Use rustls for TLS
//! - `native-tls`: Use native TLS (OpenSSL on Linux, Secure Transport on macOS)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod authz;
pub mod config;
pub mod error;
pub mod resources;
pub mod store;
pub mod types;

// Testing utilities
pub mod testing;

// Prelude for convenient imports
pub mod prelude;

#[cfg(feature = "rest")]
mod user_agent;

// Re-exports at crate root
pub use config::{ResourcesConfig, TlsConfig};
pub use error::{Error, ErrorKind, Result};
pub use resources::{Resources, ResultStream, WorkspaceListing};
pub use types::{
    Allowed, ConsistencyToken, Decision, InventoryResource, Label, Reporter, ReporterResourceId,
    ReporterResourceUniqueIndex, Resource, ResourceKey, ResourceReporter,
};
