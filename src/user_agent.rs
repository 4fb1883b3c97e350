//! User-Agent header sent with every relations service request.

use std::sync::OnceLock;

/// Crate name used in the User-Agent string.
const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

/// Crate version from Cargo.toml.
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

static USER_AGENT: OnceLock<String> = OnceLock::new();

/// Returns the User-Agent string, computed once.
///
/// Format: `inventory-authz/0.1.0 (rust/1.92; linux/x86_64)`
pub(crate) fn user_agent() -> &'static str {
    USER_AGENT.get_or_init(|| {
        format!(
            "{}/{} ({}; {}/{})",
            CRATE_NAME,
            CRATE_VERSION,
            rust_version(),
            os_name(),
            std::env::consts::ARCH,
        )
    })
}

fn rust_version() -> &'static str {
    concat!("rust/", env!("CARGO_PKG_RUST_VERSION"))
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}
