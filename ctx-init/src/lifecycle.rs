//! The supervisor's state machine:
//! `Resolving -> PreStart -> Main -> PostStop -> Draining -> Done`.
//!
//! Each phase turns its outcome into a log line and, on failure, an exit
//! code. No error escapes [`Supervisor::run`].

use std::fmt;
use std::time::Duration;

use secret_store::{EnvSnapshot, SecretStoreConnector, resolve_secrets};
use tracing::{debug, error, info};

use crate::args::split_command_line;
use crate::config::Config;
use crate::error::InitError;
use crate::reaper::{ChildRegistry, REAP_INTERVAL, ZombieReaper};
use crate::runner::{Forwarding, ProcessRunner};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolving,
    PreStart,
    Main,
    PostStop,
    Draining,
    Done,
}

/// The two optional commands around the main one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    PreStart,
    PostStop,
}

impl Hook {
    fn command(self, config: &Config) -> Option<&str> {
        match self {
            Hook::PreStart => config.pre_start.as_deref(),
            Hook::PostStop => config.post_stop.as_deref(),
        }
    }

    fn next(self) -> Phase {
        match self {
            Hook::PreStart => Phase::Main,
            Hook::PostStop => Phase::Draining,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hook::PreStart => "pre-start",
            Hook::PostStop => "post-stop",
        })
    }
}

pub struct Supervisor<'a> {
    config: &'a Config,
    connector: &'a dyn SecretStoreConnector,
    env: EnvSnapshot,
    registry: ChildRegistry,
    reaper: Option<ZombieReaper>,
    reap_interval: Duration,
    exit_code: i32,
}

impl<'a> Supervisor<'a> {
    pub fn new(
        config: &'a Config,
        env: EnvSnapshot,
        connector: &'a dyn SecretStoreConnector,
    ) -> Self {
        Self {
            config,
            connector,
            env,
            registry: ChildRegistry::new(),
            reaper: None,
            reap_interval: REAP_INTERVAL,
            exit_code: EXIT_SUCCESS,
        }
    }

    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Drive every phase to completion and return the process exit code.
    pub async fn run(mut self) -> i32 {
        let mut phase = Phase::Resolving;
        while phase != Phase::Done {
            debug!(phase = ?phase, "entering phase");
            phase = self.step(phase).await;
        }
        debug!(exit_code = self.exit_code, "supervisor done");
        self.exit_code
    }

    async fn step(&mut self, phase: Phase) -> Phase {
        match phase {
            Phase::Resolving => self.resolve().await,
            Phase::PreStart => self.run_hook(Hook::PreStart).await,
            Phase::Main => self.run_main().await,
            Phase::PostStop => self.run_hook(Hook::PostStop).await,
            Phase::Draining => {
                self.drain().await;
                Phase::Done
            }
            Phase::Done => Phase::Done,
        }
    }

    async fn resolve(&mut self) -> Phase {
        match resolve_secrets(&mut self.env, self.connector)
            .await
            .map_err(InitError::Secret)
        {
            Ok(report) => {
                debug!(
                    resolved = report.resolved,
                    malformed = report.malformed,
                    "secret resolution complete"
                );
                self.reaper = Some(ZombieReaper::spawn_with_interval(
                    self.registry.clone(),
                    self.reap_interval,
                ));
                Phase::PreStart
            }
            Err(e) => {
                error!(error = %e, "startup aborted");
                self.exit_code = EXIT_FAILURE;
                Phase::Done
            }
        }
    }

    async fn run_hook(&mut self, hook: Hook) -> Phase {
        let Some(line) = hook.command(self.config) else {
            debug!("no {hook} command defined, skipping");
            return hook.next();
        };
        let args = split_command_line(line);
        if args.is_empty() {
            debug!(command = line, "{hook} command is blank, skipping");
            return hook.next();
        }

        info!(command = line, "{hook} command launched");
        let result = ProcessRunner::new(&self.env, &self.registry)
            .run(&args, Forwarding::Disabled)
            .await;

        match result {
            Ok(termination) if termination.success() => {
                info!(command = line, "{hook} command exited");
                hook.next()
            }
            Ok(termination) => {
                error!(command = line, status = %termination, "{hook} command failed");
                self.exit_code = EXIT_FAILURE;
                Phase::Draining
            }
            Err(e) => {
                error!(command = line, error = %e, "{hook} command failed");
                self.exit_code = EXIT_FAILURE;
                Phase::Draining
            }
        }
    }

    async fn run_main(&mut self) -> Phase {
        let command = &self.config.command;
        info!(command = ?command, "main command launched");
        let result = ProcessRunner::new(&self.env, &self.registry)
            .run(command, Forwarding::Enabled)
            .await;

        match result {
            Ok(termination) if termination.is_suppressed() => {
                info!(status = %termination, "main command exited");
            }
            Ok(termination) => {
                error!(status = %termination, "main command failed");
                self.exit_code = EXIT_FAILURE;
            }
            Err(e) => {
                error!(error = %e, "main command failed");
                self.exit_code = EXIT_FAILURE;
            }
        }
        Phase::PostStop
    }

    async fn drain(&mut self) {
        if let Some(reaper) = self.reaper.take() {
            let reaped = reaper.stop().await;
            debug!(reaped, "zombie reaper stopped");
        }
    }
}
