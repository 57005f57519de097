use std::fmt::Debug;

use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use secret_store::SecretError;

#[derive(Debug, thiserror::Error)]
pub enum AwsError {
    #[error("missing AWS region: set AWS_REGION, AWS_DEFAULT_REGION or a profile region")]
    MissingRegion,

    #[error("invalid endpoint url {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The request never produced a service response: credentials could not
    /// be resolved, the connection failed or the call timed out.
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

pub type AwsResult<T> = Result<T, AwsError>;

impl<R> From<SdkError<GetSecretValueError, R>> for AwsError
where
    R: Debug + 'static,
{
    fn from(e: SdkError<GetSecretValueError, R>) -> Self {
        match e.as_service_error() {
            Some(service) => AwsError::Service {
                code: service.code().unwrap_or("Unknown").to_string(),
                message: service
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(service).to_string()),
            },
            None => AwsError::Request(DisplayErrorContext(&e).to_string()),
        }
    }
}

impl From<AwsError> for SecretError {
    fn from(e: AwsError) -> Self {
        let message = e.to_string();
        match &e {
            AwsError::Service { code, .. } if code == "ResourceNotFoundException" => {
                SecretError::NotFound(message)
            }
            AwsError::Service { code, .. }
                if code == "AccessDeniedException" || code == "UnrecognizedClientException" =>
            {
                SecretError::AccessDenied(message)
            }
            AwsError::MissingRegion | AwsError::InvalidEndpoint { .. } => {
                SecretError::StoreUnavailable(message)
            }
            AwsError::Service { .. } | AwsError::Request(_) | AwsError::InvalidResponse(_) => {
                SecretError::Backend(message)
            }
        }
    }
}
