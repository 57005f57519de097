use async_trait::async_trait;

use crate::env::EnvSnapshot;
use crate::error::Result;
use crate::store::SecretStore;

/// Builds a [`SecretStore`] on demand.
///
/// Resolution only calls `connect()` when at least one reference is present,
/// so implementations may do expensive work here (credential lookups,
/// client setup) without penalizing environments that hold no references.
#[async_trait]
pub trait SecretStoreConnector: Send + Sync {
    /// Human-readable name for this connector implementation.
    fn name(&self) -> &str;

    /// Create a store client. Backend settings are read from `env`, the
    /// captured startup environment, rather than from the live process
    /// environment.
    async fn connect(&self, env: &EnvSnapshot) -> Result<Box<dyn SecretStore>>;
}
