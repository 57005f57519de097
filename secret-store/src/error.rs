#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("malformed secret reference: expected 5 ':'-separated fields, found {fields}")]
    MalformedReference { fields: usize },

    #[error("secret store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("access denied to secret: {0}")]
    AccessDenied(String),

    #[error("secret store request failed: {0}")]
    Backend(String),

    #[error("secret {name} is not valid UTF-8")]
    InvalidEncoding { name: String },

    #[error("failed to resolve {var} (secret {name}): {source}")]
    Resolve {
        var: String,
        name: String,
        #[source]
        source: Box<SecretError>,
    },
}

pub type Result<T> = std::result::Result<T, SecretError>;
