#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::unreachable
)]

//! Supervisor phases against a fake secret store. Every supervisor runs a
//! reaper that waits on any child of this process, so tests are serialized.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use ctx_init::lifecycle::{EXIT_FAILURE, EXIT_SUCCESS};
use ctx_init::{Config, LogConfig, LogOutput, Supervisor};
use secret_store::{
    EnvSnapshot, Result, SecretError, SecretStore, SecretStoreConnector, SecretValue,
};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::level_filters::LevelFilter;

static SERIAL: Mutex<()> = Mutex::const_new(());

#[derive(Default)]
struct FakeStore {
    secrets: HashMap<String, String>,
}

#[async_trait]
impl SecretStore for FakeStore {
    fn name(&self) -> &str {
        "fake"
    }

    async fn get_secret(&self, name: &str) -> Result<SecretValue> {
        self.secrets
            .get(name)
            .map(|v| SecretValue::Text(v.clone()))
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

#[derive(Default)]
struct FakeConnector {
    secrets: HashMap<String, String>,
}

#[async_trait]
impl SecretStoreConnector for FakeConnector {
    fn name(&self) -> &str {
        "fake"
    }

    async fn connect(&self, _env: &EnvSnapshot) -> Result<Box<dyn SecretStore>> {
        Ok(Box::new(FakeStore {
            secrets: self.secrets.clone(),
        }))
    }
}

struct Scratch {
    dir: TempDir,
}

impl Scratch {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Shell command line that records it ran, then exits with `code`.
    fn marker(&self, name: &str, code: i32) -> String {
        format!("sh -c \"touch {} && exit {code}\"", self.path(name).display())
    }

    fn ran(&self, name: &str) -> bool {
        self.path(name).exists()
    }
}

fn config(pre: Option<String>, post: Option<String>, command: &[&str]) -> Config {
    Config {
        pre_start: pre,
        post_stop: post,
        command: command.iter().map(|s| s.to_string()).collect(),
        log: LogConfig {
            level: LevelFilter::WARN,
            output: LogOutput::Plain,
        },
    }
}

fn base_env() -> EnvSnapshot {
    [("PATH", "/usr/local/bin:/usr/bin:/bin")].into_iter().collect()
}

async fn supervise(config: &Config, env: EnvSnapshot, connector: &FakeConnector) -> i32 {
    Supervisor::new(config, env, connector)
        .with_reap_interval(Duration::from_millis(20))
        .run()
        .await
}

#[tokio::test]
async fn all_phases_succeed() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let main = format!("touch {}", scratch.path("main").display());
    let config = config(
        Some(scratch.marker("pre", 0)),
        Some(scratch.marker("post", 0)),
        &["sh", "-c", &main],
    );

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_SUCCESS);
    assert!(scratch.ran("pre"));
    assert!(scratch.ran("main"));
    assert!(scratch.ran("post"));
}

#[tokio::test]
async fn failing_pre_start_skips_main_and_post() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let main = format!("touch {}", scratch.path("main").display());
    let config = config(
        Some(scratch.marker("pre", 2)),
        Some(scratch.marker("post", 0)),
        &["sh", "-c", &main],
    );

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(scratch.ran("pre"));
    assert!(!scratch.ran("main"));
    assert!(!scratch.ran("post"));
}

#[tokio::test]
async fn unlaunchable_pre_start_is_fatal() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let main = format!("touch {}", scratch.path("main").display());
    let config = config(
        Some("/nonexistent/ctx-init-hook".into()),
        None,
        &["sh", "-c", &main],
    );

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(!scratch.ran("main"));
}

#[tokio::test]
async fn failing_main_still_runs_post_stop() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let config = config(
        None,
        Some(scratch.marker("post", 0)),
        &["sh", "-c", "exit 3"],
    );

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(scratch.ran("post"));
}

#[tokio::test]
async fn unlaunchable_main_still_runs_post_stop() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let config = config(
        None,
        Some(scratch.marker("post", 0)),
        &["/nonexistent/ctx-init-main"],
    );

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(scratch.ran("post"));
}

#[tokio::test]
async fn main_killed_by_sigterm_is_suppressed() {
    let _serial = SERIAL.lock().await;
    let config = config(None, None, &["sh", "-c", "kill -TERM $$"]);

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_SUCCESS);
}

#[tokio::test]
async fn main_killed_by_other_signal_fails() {
    let _serial = SERIAL.lock().await;
    let config = config(None, None, &["sh", "-c", "kill -USR2 $$"]);

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_FAILURE);
}

#[tokio::test]
async fn failing_post_stop_overrides_exit_code() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let config = config(None, Some(scratch.marker("post", 4)), &["true"]);

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(scratch.ran("post"));
}

#[tokio::test]
async fn blank_hooks_are_skipped() {
    let _serial = SERIAL.lock().await;
    let config = config(Some("   ".into()), Some(String::new()), &["true"]);

    let code = supervise(&config, base_env(), &FakeConnector::default()).await;

    assert_eq!(code, EXIT_SUCCESS);
}

#[tokio::test]
async fn resolved_secrets_reach_every_command() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let pre_out = scratch.path("pre-secret");
    let main_out = scratch.path("main-secret");
    let pre = format!(
        "sh -c \"printf %s \\\"$DB_PASSWORD\\\" > {}\"",
        pre_out.display()
    );
    let main = format!("printf %s \"$DB_PASSWORD\" > {}", main_out.display());
    let config = config(Some(pre), None, &["sh", "-c", &main]);

    let mut env = base_env();
    env.set("DB_PASSWORD", "aws:sm:::prod/db");
    env.set("PLAIN", "untouched");
    let connector = FakeConnector {
        secrets: HashMap::from([("prod/db".to_string(), "hunter2".to_string())]),
    };

    let code = supervise(&config, env, &connector).await;

    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(std::fs::read_to_string(pre_out).unwrap(), "hunter2");
    assert_eq!(std::fs::read_to_string(main_out).unwrap(), "hunter2");
}

#[tokio::test]
async fn unresolvable_secret_runs_nothing() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let main = format!("touch {}", scratch.path("main").display());
    let config = config(
        Some(scratch.marker("pre", 0)),
        Some(scratch.marker("post", 0)),
        &["sh", "-c", &main],
    );
    let mut env = base_env();
    env.set("API_KEY", "aws:sm:::missing/key");

    let code = supervise(&config, env, &FakeConnector::default()).await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(!scratch.ran("pre"));
    assert!(!scratch.ran("main"));
    assert!(!scratch.ran("post"));
}

#[tokio::test]
async fn malformed_reference_is_passed_through() {
    let _serial = SERIAL.lock().await;
    let scratch = Scratch::new();
    let out = scratch.path("value");
    let main = format!("printf %s \"$TOKEN\" > {}", out.display());
    let config = config(None, None, &["sh", "-c", &main]);
    let mut env = base_env();
    env.set("TOKEN", "aws:sm:broken");

    let code = supervise(&config, env, &FakeConnector::default()).await;

    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(std::fs::read_to_string(out).unwrap(), "aws:sm:broken");
}
