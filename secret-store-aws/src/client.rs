use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use secret_store::{SecretStore, SecretValue};
use tracing::debug;

use crate::error::{AwsError, AwsResult};

/// Thin wrapper over the SDK client exposing `GetSecretValue` as a
/// [`SecretValue`].
#[derive(Debug, Clone)]
pub struct SecretsManagerClient {
    client: Client,
}

impl SecretsManagerClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get_secret_value(&self, secret_id: &str) -> AwsResult<SecretValue> {
        debug!(secret_id, "GetSecretValue");
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await?;

        if let Some(text) = output.secret_string() {
            return Ok(SecretValue::Text(text.to_string()));
        }
        match output.secret_binary() {
            Some(blob) => Ok(SecretValue::Binary(blob.as_ref().to_vec())),
            None => Err(AwsError::InvalidResponse(
                "response has neither SecretString nor SecretBinary".into(),
            )),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerClient {
    fn name(&self) -> &str {
        "aws-secrets-manager"
    }

    async fn get_secret(&self, name: &str) -> secret_store::Result<SecretValue> {
        self.get_secret_value(name).await.map_err(Into::into)
    }
}
