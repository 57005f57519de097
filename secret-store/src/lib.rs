//! Secret references in environment variables, and the store contract used
//! to resolve them.

mod connector;
mod env;
mod error;
mod reference;
mod resolver;
mod store;
mod value;

pub use connector::SecretStoreConnector;
pub use env::EnvSnapshot;
pub use error::{Result, SecretError};
pub use reference::{REFERENCE_PREFIX, SecretReference, is_reference};
pub use resolver::{ResolveReport, resolve_secrets};
pub use store::SecretStore;
pub use value::SecretValue;
