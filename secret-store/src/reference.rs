//! Secret references stored in environment variable values.
//!
//! A reference has the shape `aws:sm:<format>:<action>:<name>`. The value is
//! split on `:` into at most five fields, so the name keeps any colons it
//! contains (ARNs, for instance).

use std::fmt;

use crate::error::{Result, SecretError};

const SEPARATOR: char = ':';
const FIELD_COUNT: usize = 5;

/// Prefix that marks an environment value as a secret reference.
pub const REFERENCE_PREFIX: &str = "aws:sm:";

/// Returns `true` when `value` should be treated as a secret reference.
pub fn is_reference(value: &str) -> bool {
    value.starts_with(REFERENCE_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub provider: String,
    pub service: String,
    /// Format hint. Empty in most references.
    pub format: String,
    /// Action hint. Empty in most references.
    pub action: String,
    /// Backend-specific secret identifier.
    pub name: String,
}

impl SecretReference {
    pub fn parse(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.splitn(FIELD_COUNT, SEPARATOR).collect();
        match fields.as_slice() {
            [provider, service, format, action, name] => Ok(Self {
                provider: (*provider).to_string(),
                service: (*service).to_string(),
                format: (*format).to_string(),
                action: (*action).to_string(),
                name: (*name).to_string(),
            }),
            other => Err(SecretError::MalformedReference {
                fields: other.len(),
            }),
        }
    }
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.provider, self.service, self.format, self.action, self.name
        )
    }
}
