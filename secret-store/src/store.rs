use async_trait::async_trait;

use crate::error::Result;
use crate::value::SecretValue;

/// A backend that can look up secrets by identifier.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Human-readable backend name (e.g. "aws-secrets-manager").
    fn name(&self) -> &str;

    /// Fetch the current value of the secret identified by `name`.
    ///
    /// Not-found, permission and transport failures are all errors; the
    /// caller decides whether they are fatal.
    async fn get_secret(&self, name: &str) -> Result<SecretValue>;
}
