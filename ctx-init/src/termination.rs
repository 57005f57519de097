//! How a child process ended.

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::signal::Signal;

use crate::forward::signal_name;

/// Termination of a child: either a normal exit with a code, or death by a
/// signal. Raw signal numbers are kept so that real-time signals, which have
/// no [`Signal`] variant, are still represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
}

impl Termination {
    pub fn from_status(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => Termination::Exited(code),
            (None, Some(signal)) => Termination::Signaled(signal),
            // Stopped or continued: wait() without WUNTRACED never reports
            // these, so treat one as a generic failure rather than invent a code.
            (None, None) => Termination::Exited(1),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, Termination::Exited(0))
    }

    pub fn signal(&self) -> Option<Signal> {
        match self {
            Termination::Exited(_) => None,
            Termination::Signaled(raw) => Signal::try_from(*raw).ok(),
        }
    }

    /// Whether a main-command termination counts as an expected shutdown.
    ///
    /// A zero exit, or death by SIGINT, SIGTERM or SIGKILL, is suppressed.
    /// Any other exit code or signal is a failure.
    pub fn is_suppressed(&self) -> bool {
        match self {
            Termination::Exited(code) => *code == 0,
            Termination::Signaled(_) => matches!(
                self.signal(),
                Some(Signal::SIGINT | Signal::SIGTERM | Signal::SIGKILL)
            ),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.signal()) {
            (Termination::Exited(code), _) => write!(f, "exit status {code}"),
            (Termination::Signaled(_), Some(signal)) => write!(f, "signal: {}", signal.as_str()),
            (Termination::Signaled(raw), None) => write!(f, "signal: {}", signal_name(*raw)),
        }
    }
}
