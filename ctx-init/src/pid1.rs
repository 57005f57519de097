//! Init-process role outside of the reaping loop itself.
//!
//! Orphans are re-parented to PID 1. When ctx-init runs as some other pid
//! (for example under a debugger or a wrapper), it asks the kernel to make it
//! a child subreaper so orphans of its subtree still end up with it.

use nix::sys::prctl;
use tracing::{debug, warn};

/// Whether this process is the namespace's init.
pub fn is_init() -> bool {
    std::process::id() == 1
}

/// Make sure orphaned descendants are re-parented to this process.
pub fn claim_orphans() {
    if is_init() {
        debug!("running as PID 1");
        return;
    }

    match prctl::set_child_subreaper(true) {
        Ok(()) => debug!(
            pid = std::process::id(),
            "not PID 1, registered as child subreaper"
        ),
        Err(e) => warn!(
            pid = std::process::id(),
            error = %e,
            "not PID 1 and could not become child subreaper, orphans go to the real init"
        ),
    }
}
