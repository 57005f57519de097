//! Relay signals received by the supervisor to the main command's process
//! group.

use std::borrow::Cow;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::stream::{self, BoxStream, SelectAll, StreamExt};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};

/// Whether signal number `signo` is relayed to the process group.
///
/// Everything is, except `SIGCHLD`, which drives reaping, and the signals
/// tokio will not install a handler for: `SIGKILL` and `SIGSTOP` cannot be
/// caught, and `SIGILL`, `SIGFPE` and `SIGSEGV` only make sense to the thread
/// that faulted.
pub fn is_forwardable(signo: i32) -> bool {
    !matches!(
        signo,
        libc::SIGCHLD
            | libc::SIGKILL
            | libc::SIGSTOP
            | libc::SIGILL
            | libc::SIGFPE
            | libc::SIGSEGV
    ) && (is_standard(signo) || is_realtime(signo))
}

fn is_standard(signo: i32) -> bool {
    Signal::try_from(signo).is_ok()
}

fn is_realtime(signo: i32) -> bool {
    (libc::SIGRTMIN()..=libc::SIGRTMAX()).contains(&signo)
}

/// Standard signals first, then `SIGRTMIN..=SIGRTMAX`.
pub fn forwardable_signals() -> impl Iterator<Item = i32> {
    Signal::iterator()
        .map(|s| s as i32)
        .chain(libc::SIGRTMIN()..=libc::SIGRTMAX())
        .filter(|n| is_forwardable(*n))
}

/// `SIGTERM`, or `SIGRTMIN+3` for real-time signals.
pub fn signal_name(signo: i32) -> Cow<'static, str> {
    match Signal::try_from(signo) {
        Ok(sig) => Cow::Borrowed(sig.as_str()),
        Err(_) if is_realtime(signo) => {
            Cow::Owned(format!("SIGRTMIN+{}", signo - libc::SIGRTMIN()))
        }
        Err(_) => Cow::Owned(format!("signal {signo}")),
    }
}

/// Listener for every forwardable signal, merged into one stream.
///
/// Must be created before the child is spawned so nothing sent in between is
/// lost. Once a handler is installed for a signal it stays installed for the
/// life of the process; after the listener is dropped those signals are
/// swallowed.
pub struct SignalForwarder {
    incoming: SelectAll<BoxStream<'static, i32>>,
}

impl SignalForwarder {
    pub fn listen() -> Self {
        let streams = forwardable_signals().filter_map(|signo| {
            match signal(SignalKind::from_raw(signo)) {
                Ok(listener) => Some(
                    stream::unfold(listener, move |mut listener| async move {
                        listener.recv().await.map(|()| (signo, listener))
                    })
                    .boxed(),
                ),
                Err(e) => {
                    debug!(signal = %signal_name(signo), error = %e, "cannot listen for signal");
                    None
                }
            }
        });
        Self {
            incoming: stream::select_all(streams),
        }
    }

    /// Relay incoming signals to `pgid` until `exit` completes, then flush
    /// whatever arrived in the meantime.
    pub async fn forward_until<F>(&mut self, pgid: Pid, exit: F) -> F::Output
    where
        F: Future,
    {
        tokio::pin!(exit);
        let output = loop {
            tokio::select! {
                output = &mut exit => break output,
                Some(signo) = self.incoming.next() => forward(pgid, signo),
            }
        };
        self.drain(pgid).await;
        output
    }

    async fn drain(&mut self, pgid: Pid) {
        // let the signal driver dispatch anything already delivered
        tokio::task::yield_now().await;
        while let Some(Some(signo)) = self.incoming.next().now_or_never() {
            forward(pgid, signo);
        }
    }
}

/// Send `signo` to every process in group `pgid`. A group that no longer
/// exists is not an error.
///
/// Raw numbers go through `kill(2)` because `nix::sys::signal::Signal` has
/// no real-time variants.
pub fn forward(pgid: Pid, signo: i32) {
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    let rc = unsafe { libc::kill(-pgid.as_raw(), signo) };
    let name = signal_name(signo);
    match Errno::result(rc) {
        Ok(_) => info!(signal = %name, pgid = %pgid, "forwarded signal"),
        Err(Errno::ESRCH) => debug!(signal = %name, pgid = %pgid, "process group already gone"),
        Err(e) => warn!(signal = %name, pgid = %pgid, error = %e, "failed to forward signal"),
    }
}
