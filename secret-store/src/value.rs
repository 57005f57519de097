use crate::error::{Result, SecretError};

/// A secret payload as returned by a store.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretValue {
    Text(String),
    Binary(Vec<u8>),
}

impl SecretValue {
    /// Convert into an environment-safe string. Binary payloads must be UTF-8.
    pub fn into_text(self, name: &str) -> Result<String> {
        match self {
            SecretValue::Text(text) => Ok(text),
            SecretValue::Binary(bytes) => {
                String::from_utf8(bytes).map_err(|_| SecretError::InvalidEncoding {
                    name: name.to_string(),
                })
            }
        }
    }
}

// Never print secret material.
impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretValue::Text(text) => write!(f, "Text(<{} bytes>)", text.len()),
            SecretValue::Binary(bytes) => write!(f, "Binary(<{} bytes>)", bytes.len()),
        }
    }
}
