//! Zombie reaping for PID 1.
//!
//! As init we inherit every orphan in the namespace and must collect their
//! exit status, or they stay zombies. Children that a runner is waiting on
//! directly are tracked in a [`ChildRegistry`] and never touched here.

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::wait::{Id, WaitPidFlag, WaitStatus, waitid, waitpid};
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, trace, warn};

/// Pause between polls when there is nothing to reap.
pub const REAP_INTERVAL: Duration = Duration::from_secs(1);

/// Pids of children whose exit status belongs to a runner, not the reaper.
#[derive(Debug, Clone, Default)]
pub struct ChildRegistry {
    owned: Arc<Mutex<HashSet<Pid>>>,
}

impl ChildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Pid>> {
        self.owned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_owned(&self, pid: Pid) -> bool {
        self.lock().contains(&pid)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Spawn a child and register it in one step.
    ///
    /// The registry lock is held across the spawn, so the reaper cannot see
    /// the child exit before it is registered.
    pub fn spawn_owned(
        &self,
        spawn: impl FnOnce() -> io::Result<Child>,
    ) -> io::Result<(Child, Ownership)> {
        let mut owned = self.lock();
        let child = spawn()?;
        let pid = child
            .id()
            .and_then(|id| i32::try_from(id).ok())
            .map(Pid::from_raw)
            .ok_or_else(|| io::Error::other("spawned child has no pid"))?;
        owned.insert(pid);
        drop(owned);

        Ok((
            child,
            Ownership {
                registry: self.clone(),
                pid,
            },
        ))
    }
}

/// Registration of one owned child. Dropping it hands the pid back to the
/// reaper; drop it only once the child has been waited on.
#[derive(Debug)]
pub struct Ownership {
    registry: ChildRegistry,
    pid: Pid,
}

impl Ownership {
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl Drop for Ownership {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.pid);
    }
}

/// Reap a single exited child that nobody else owns.
///
/// Peeks with `WNOWAIT` first so an owned child is left untouched for its
/// runner. Returns the reaped pid, or `None` when nothing was reapable.
pub fn reap_orphan(registry: &ChildRegistry) -> Option<Pid> {
    let owned = registry.lock();

    let peeked = waitid(
        Id::All,
        WaitPidFlag::WEXITED | WaitPidFlag::WNOHANG | WaitPidFlag::WNOWAIT,
    );
    let pid = match peeked {
        Ok(status) => status.pid()?,
        // ECHILD: no children at all
        Err(Errno::ECHILD) => return None,
        Err(e) => {
            debug!(error = %e, "waitid failed");
            return None;
        }
    };

    if owned.contains(&pid) {
        trace!(pid = %pid, "exited child is owned by a runner, leaving it");
        return None;
    }

    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => None,
        Ok(status) => {
            debug!(pid = %pid, status = ?status, "reaped orphaned process");
            Some(pid)
        }
        Err(e) => {
            debug!(pid = %pid, error = %e, "waitpid failed");
            None
        }
    }
}

/// Background reaping loop, alive for the whole supervisor run.
pub struct ZombieReaper {
    shutdown: CancellationToken,
    handle: JoinHandle<usize>,
}

impl ZombieReaper {
    pub fn spawn(registry: ChildRegistry) -> Self {
        Self::spawn_with_interval(registry, REAP_INTERVAL)
    }

    pub fn spawn_with_interval(registry: ChildRegistry, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let handle =
            tokio::spawn(reap_loop(registry, shutdown.clone(), interval).in_current_span());
        debug!(interval_ms = interval.as_millis() as u64, "zombie reaper started");
        Self { shutdown, handle }
    }

    /// Ask the loop to stop and wait until it has. Returns how many
    /// orphans were reaped over the reaper's lifetime.
    pub async fn stop(self) -> usize {
        self.shutdown.cancel();
        match self.handle.await {
            Ok(reaped) => reaped,
            Err(e) => {
                warn!(error = %e, "zombie reaper task failed");
                0
            }
        }
    }
}

/// Reap as long as there is something to reap; otherwise sleep for
/// `interval`. Cancellation is checked before every pause and also cuts the
/// pause short, after which one more drain pass runs.
async fn reap_loop(
    registry: ChildRegistry,
    shutdown: CancellationToken,
    interval: Duration,
) -> usize {
    let mut reaped = 0;
    loop {
        if reap_orphan(&registry).is_some() {
            reaped += 1;
            continue;
        }

        if shutdown.is_cancelled() {
            debug!(reaped, "zombie reaper stopping");
            return reaped;
        }

        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
