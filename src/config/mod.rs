//! Configuration types.
//!
//! - [`ResourcesConfig`]: namespace, persistence bypass and listing fan-out
//! - [`TlsConfig`]: TLS settings for the relations service connection

mod resources;
mod tls;

pub use resources::ResourcesConfig;
pub use tls::TlsConfig;
