//! Launch one command and wait for it.

use std::process::Stdio;

use nix::unistd::Pid;
use secret_store::EnvSnapshot;
use tokio::process::Command;
use tracing::debug;

use crate::error::{InitError, InitResult, LaunchError};
use crate::forward::SignalForwarder;
use crate::reaper::ChildRegistry;
use crate::termination::Termination;

/// Whether signals received while the command runs are relayed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarding {
    Enabled,
    Disabled,
}

/// Runs commands with the resolved environment, in their own process group,
/// sharing the supervisor's stdio.
pub struct ProcessRunner<'a> {
    env: &'a EnvSnapshot,
    registry: &'a ChildRegistry,
}

impl<'a> ProcessRunner<'a> {
    pub fn new(env: &'a EnvSnapshot, registry: &'a ChildRegistry) -> Self {
        Self { env, registry }
    }

    /// Run `args` to completion. An empty argument list is a no-op success.
    ///
    /// The snapshot is applied over the inherited environment, so resolved
    /// secrets replace their references and variables the snapshot could not
    /// hold (non-UTF-8) pass through untouched. The child leads a new process
    /// group whose id equals its pid.
    pub async fn run(&self, args: &[String], forwarding: Forwarding) -> InitResult<Termination> {
        let Some((program, rest)) = args.split_first() else {
            return Ok(Termination::Exited(0));
        };

        let mut command = Command::new(program);
        command
            .args(rest)
            .envs(self.env.iter())
            .process_group(0)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut forwarder = match forwarding {
            Forwarding::Enabled => Some(SignalForwarder::listen()),
            Forwarding::Disabled => None,
        };

        let (mut child, ownership) = self
            .registry
            .spawn_owned(|| command.spawn())
            .map_err(|source| LaunchError {
                command: program.clone(),
                source,
            })?;
        let pid: Pid = ownership.pid();
        debug!(pid = %pid, command = %program, "process started");

        let status = match forwarder.as_mut() {
            Some(forwarder) => forwarder.forward_until(pid, child.wait()).await,
            None => child.wait().await,
        }
        .map_err(|source| InitError::Wait {
            command: program.clone(),
            source,
        })?;
        drop(ownership);

        let termination = Termination::from_status(status);
        debug!(pid = %pid, command = %program, status = %termination, "process finished");
        Ok(termination)
    }
}
