//! Orchestrator configuration.

/// Construction-time settings for [`Resources`](crate::Resources).
///
/// The configuration is fixed once the orchestrator is built; there is no
/// way to toggle persistence at runtime.
///
/// ## Example
///
/// ```rust
/// use inventory_authz::ResourcesConfig;
///
/// // Authorization-only deployment: no inventory writes.
/// let config = ResourcesConfig::builder()
///     .namespace("notifications")
///     .disable_persistence(true)
///     .build();
///
/// assert!(config.disable_persistence);
/// assert_eq!(config.max_concurrent_checks, None);
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct ResourcesConfig {
    /// Reporter type used as the tuple and check namespace.
    #[builder(into, default)]
    pub namespace: String,

    /// Skip every store call in create, update and delete.
    ///
    /// Checks and workspace listings still read the store.
    #[builder(default = false)]
    pub disable_persistence: bool,

    /// Upper bound on concurrent checks during a workspace listing.
    ///
    /// `None` runs one check per candidate at once.
    pub max_concurrent_checks: Option<usize>,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ResourcesConfig {
    /// Creates a configuration for the given namespace with defaults otherwise.
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        Self::builder().namespace(namespace).build()
    }
}
