use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use secret_store::{EnvSnapshot, SecretStore, SecretStoreConnector};
use tracing::info;

use crate::client::SecretsManagerClient;
use crate::config::AwsSettings;

/// Connector for AWS Secrets Manager.
///
/// Holds no state: overrides are read from the environment snapshot when
/// `connect()` is called and the rest comes from the SDK's default chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsSecretsManager;

impl AwsSecretsManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretStoreConnector for AwsSecretsManager {
    fn name(&self) -> &str {
        "aws-secrets-manager"
    }

    async fn connect(&self, env: &EnvSnapshot) -> secret_store::Result<Box<dyn SecretStore>> {
        let settings = AwsSettings::from_env(env)?;
        let sdk_config = settings.load().await?;

        info!(
            region = %sdk_config.region().map(|r| r.as_ref()).unwrap_or_default(),
            endpoint = settings.endpoint.as_deref().unwrap_or("default"),
            static_credentials = settings.credentials.is_some(),
            "secrets manager client initialized"
        );

        let client = Client::new(&sdk_config);
        Ok(Box::new(SecretsManagerClient::new(client)))
    }
}
