use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::config::Credentials;
use secret_store::EnvSnapshot;
use tracing::debug;
use url::Url;

use crate::error::{AwsError, AwsResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Overrides taken from the captured environment. Anything left unset here
/// is resolved by the SDK's default chain (shared config and credentials
/// files, web identity, container and instance metadata).
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// `AWS_ENDPOINT_URL_SECRETS_MANAGER`, then `AWS_ENDPOINT_URL`.
    pub endpoint: Option<String>,
    /// Static keys, only when both the key id and secret are present.
    pub credentials: Option<Credentials>,
}

impl AwsSettings {
    pub fn from_env(env: &EnvSnapshot) -> AwsResult<Self> {
        let region = env
            .get_non_empty("AWS_REGION")
            .or_else(|| env.get_non_empty("AWS_DEFAULT_REGION"))
            .map(str::to_string);

        let endpoint = env
            .get_non_empty("AWS_ENDPOINT_URL_SECRETS_MANAGER")
            .or_else(|| env.get_non_empty("AWS_ENDPOINT_URL"))
            .map(validate_endpoint)
            .transpose()?;

        let credentials = match (
            env.get_non_empty("AWS_ACCESS_KEY_ID"),
            env.get_non_empty("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(key_id), Some(secret)) => Some(Credentials::new(
                key_id,
                secret,
                env.get_non_empty("AWS_SESSION_TOKEN").map(str::to_string),
                None,
                "environment",
            )),
            _ => None,
        };

        Ok(Self {
            region,
            profile: env.get_non_empty("AWS_PROFILE").map(str::to_string),
            endpoint,
            credentials,
        })
    }

    /// Build the SDK configuration. Fails only when no region can be found
    /// anywhere; credentials are resolved lazily on the first request.
    pub async fn load(&self) -> AwsResult<SdkConfig> {
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .operation_timeout(OPERATION_TIMEOUT)
            .build();
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeouts);

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(credentials) = &self.credentials {
            debug!("using static credentials from the environment");
            loader = loader.credentials_provider(credentials.clone());
        }

        let config = loader.load().await;
        if config.region().is_none() {
            return Err(AwsError::MissingRegion);
        }
        Ok(config)
    }
}

fn validate_endpoint(raw: &str) -> AwsResult<String> {
    let url = Url::parse(raw).map_err(|e| AwsError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(AwsError::InvalidEndpoint {
            url: raw.to_string(),
            reason: "missing host".into(),
        });
    }
    Ok(raw.to_string())
}
