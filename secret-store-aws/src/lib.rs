//! AWS Secrets Manager backend for `secret-store`.
//!
//! Built on `aws-config` and `aws-sdk-secretsmanager`. Region, profile,
//! endpoint and static keys found in the environment snapshot handed to
//! [`AwsSecretsManager::connect`](secret_store::SecretStoreConnector::connect)
//! override the SDK's default provider chains.

mod client;
mod config;
mod connector;
mod error;

pub use client::SecretsManagerClient;
pub use config::AwsSettings;
pub use connector::AwsSecretsManager;
pub use error::{AwsError, AwsResult};
