//! Rewrites secret references in an [`EnvSnapshot`] with their values.

use tracing::{debug, warn};

use crate::connector::SecretStoreConnector;
use crate::env::EnvSnapshot;
use crate::error::{Result, SecretError};
use crate::reference::{REFERENCE_PREFIX, SecretReference, is_reference};

/// Outcome counters for one resolution pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveReport {
    /// Variables whose value was replaced by a secret.
    pub resolved: usize,
    /// Variables left untouched because their reference was malformed.
    pub malformed: usize,
}

/// Resolve every secret reference in `env`, in place.
///
/// The connector is only invoked when at least one value carries the
/// reference prefix. Malformed references are logged and left as-is. Any
/// store failure aborts the pass: the returned error names the variable and
/// the secret that could not be resolved.
pub async fn resolve_secrets(
    env: &mut EnvSnapshot,
    connector: &dyn SecretStoreConnector,
) -> Result<ResolveReport> {
    let candidates: Vec<(String, String)> = env
        .iter()
        .filter(|(_, value)| is_reference(value))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let mut report = ResolveReport::default();
    if candidates.is_empty() {
        debug!(
            prefix = REFERENCE_PREFIX,
            "no secret references found, skipping secret store setup"
        );
        return Ok(report);
    }

    debug!(
        connector = connector.name(),
        count = candidates.len(),
        "connecting to secret store"
    );
    let store = connector.connect(env).await?;

    for (var, value) in candidates {
        let reference = match SecretReference::parse(&value) {
            Ok(reference) => reference,
            Err(e) => {
                warn!(env_var = %var, error = %e, "ignoring env var with malformed secret reference");
                report.malformed += 1;
                continue;
            }
        };

        debug!(
            env_var = %var,
            provider = %reference.provider,
            service = %reference.service,
            format = %reference.format,
            action = %reference.action,
            name = %reference.name,
            "retrieving secret for env var"
        );

        let secret = match store.get_secret(&reference.name).await {
            Ok(value) => value.into_text(&reference.name),
            Err(e) => Err(e),
        }
        .map_err(|e| SecretError::Resolve {
            var: var.clone(),
            name: reference.name.clone(),
            source: Box::new(e),
        })?;

        env.set(var.as_str(), secret);
        debug!(env_var = %var, store = store.name(), "set env var with secret value");
        report.resolved += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::store::SecretStore;
    use crate::value::SecretValue;

    struct MapStore {
        secrets: HashMap<String, SecretValue>,
        lookups: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SecretStore for MapStore {
        fn name(&self) -> &str {
            "map"
        }

        async fn get_secret(&self, name: &str) -> Result<SecretValue> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.secrets
                .get(name)
                .cloned()
                .ok_or_else(|| SecretError::NotFound(name.to_string()))
        }
    }

    #[derive(Default)]
    struct MapConnector {
        secrets: HashMap<String, SecretValue>,
        connects: Arc<AtomicUsize>,
        lookups: Arc<AtomicUsize>,
        fail_connect: bool,
    }

    impl MapConnector {
        fn with(secrets: &[(&str, SecretValue)]) -> Self {
            Self {
                secrets: secrets
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl SecretStoreConnector for MapConnector {
        fn name(&self) -> &str {
            "map"
        }

        async fn connect(&self, _env: &EnvSnapshot) -> Result<Box<dyn SecretStore>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect {
                return Err(SecretError::StoreUnavailable("no credentials".into()));
            }
            Ok(Box::new(MapStore {
                secrets: self.secrets.clone(),
                lookups: self.lookups.clone(),
            }))
        }
    }

    fn snapshot(vars: &[(&str, &str)]) -> EnvSnapshot {
        vars.iter().copied().collect()
    }

    #[tokio::test]
    async fn no_references_means_no_connect() {
        let connector = MapConnector::default();
        let mut env = snapshot(&[("PATH", "/usr/bin"), ("HOME", "/root")]);
        let before = env.clone();

        let report = resolve_secrets(&mut env, &connector).await.unwrap();

        assert_eq!(report, ResolveReport::default());
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
        assert_eq!(env, before);
    }

    #[tokio::test]
    async fn resolves_reference_and_leaves_others_unchanged() {
        let connector =
            MapConnector::with(&[("test/hello", SecretValue::Text("world".into()))]);
        let mut env = snapshot(&[
            ("SOME_SECRET", "aws:sm:::test/hello"),
            ("PLAIN", "aws:s3:::not-a-secret"),
            ("EMPTY", ""),
        ]);

        let report = resolve_secrets(&mut env, &connector).await.unwrap();

        assert_eq!(report.resolved, 1);
        assert_eq!(env.get("SOME_SECRET"), Some("world"));
        assert_eq!(env.get("PLAIN"), Some("aws:s3:::not-a-secret"));
        assert_eq!(env.get("EMPTY"), Some(""));
    }

    #[tokio::test]
    async fn connects_once_for_many_references() {
        let connector = MapConnector::with(&[
            ("a", SecretValue::Text("1".into())),
            ("b", SecretValue::Binary(b"2".to_vec())),
        ]);
        let mut env = snapshot(&[("A", "aws:sm:::a"), ("B", "aws:sm:json:get:b")]);

        let report = resolve_secrets(&mut env, &connector).await.unwrap();

        assert_eq!(report.resolved, 2);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
        assert_eq!(connector.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("B"), Some("2"));
    }

    #[tokio::test]
    async fn malformed_reference_is_kept_verbatim() {
        let connector = MapConnector::with(&[("ok", SecretValue::Text("v".into()))]);
        let mut env = snapshot(&[("BROKEN", "aws:sm:ok"), ("GOOD", "aws:sm:::ok")]);

        let report = resolve_secrets(&mut env, &connector).await.unwrap();

        assert_eq!(report, ResolveReport { resolved: 1, malformed: 1 });
        assert_eq!(env.get("BROKEN"), Some("aws:sm:ok"));
        assert_eq!(env.get("GOOD"), Some("v"));
    }

    #[tokio::test]
    async fn missing_secret_is_fatal() {
        let connector = MapConnector::default();
        let mut env = snapshot(&[("DB_PASSWORD", "aws:sm:::prod/db")]);

        let err = resolve_secrets(&mut env, &connector).await.unwrap_err();

        match err {
            SecretError::Resolve { var, name, source } => {
                assert_eq!(var, "DB_PASSWORD");
                assert_eq!(name, "prod/db");
                assert!(matches!(*source, SecretError::NotFound(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(env.get("DB_PASSWORD"), Some("aws:sm:::prod/db"));
    }

    #[tokio::test]
    async fn connect_failure_is_fatal() {
        let connector = MapConnector {
            fail_connect: true,
            ..MapConnector::default()
        };
        let mut env = snapshot(&[("X", "aws:sm:::x")]);

        let err = resolve_secrets(&mut env, &connector).await.unwrap_err();
        assert!(matches!(err, SecretError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn invalid_utf8_binary_secret_is_fatal() {
        let connector = MapConnector::with(&[("bin", SecretValue::Binary(vec![0xc3, 0x28]))]);
        let mut env = snapshot(&[("BIN", "aws:sm:::bin")]);

        let err = resolve_secrets(&mut env, &connector).await.unwrap_err();
        assert!(matches!(
            err,
            SecretError::Resolve { ref source, .. } if matches!(**source, SecretError::InvalidEncoding { .. })
        ));
    }
}
