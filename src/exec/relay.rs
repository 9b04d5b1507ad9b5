//! Signal relay
//!
//! Process-wide handlers that forward termination signals to whichever
//! child is currently being waited on, and turn the wall-clock alarm into
//! a two-stage kill.

use crate::config::types::{EvalError, Result};
use log::debug;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicI32, Ordering};

/// Pid of the child currently being waited on, 0 when there is none.
/// Signal delivery is process-global, so this state is too; everything
/// else goes through [`SignalRelay`].
static CURRENT_CHILD: AtomicI32 = AtomicI32::new(0);

/// Pid the alarm handler has already sent SIGTERM to.
static TERM_SENT_TO: AtomicI32 = AtomicI32::new(0);

/// Seconds between the alarm's SIGTERM and the follow-up SIGKILL.
const KILL_GRACE_SECS: libc::c_uint = 2;

/// Handle proving the relay handlers are installed. [`Limiter`] takes one
/// by reference so no child can be launched without the relay in place.
///
/// [`Limiter`]: crate::exec::limiter::Limiter
pub struct SignalRelay {
    _install: (),
}

impl SignalRelay {
    /// Install the SIGINT, SIGTERM and SIGALRM handlers. Installing twice
    /// is harmless. The handlers are registered without SA_RESTART so a
    /// pending wait returns EINTR once the signal has been relayed.
    pub fn install() -> Result<Self> {
        let relay = SigAction::new(
            SigHandler::Handler(relay_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        let alarm = SigAction::new(
            SigHandler::Handler(alarm_expired),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe {
            signal::sigaction(Signal::SIGINT, &relay).map_err(install_error)?;
            signal::sigaction(Signal::SIGTERM, &relay).map_err(install_error)?;
            signal::sigaction(Signal::SIGALRM, &alarm).map_err(install_error)?;
        }
        debug!("signal relay installed for SIGINT, SIGTERM, SIGALRM");
        Ok(Self { _install: () })
    }

    /// Publish `child` as the relay target until the guard drops.
    /// Tracking a new child clears any first-stage alarm state left by the
    /// previous one, so a stale alarm can never escalate a fresh child.
    pub fn track(&self, child: Pid) -> ChildGuard {
        TERM_SENT_TO.store(0, Ordering::SeqCst);
        CURRENT_CHILD.store(child.as_raw(), Ordering::SeqCst);
        ChildGuard { _private: () }
    }

    #[cfg(test)]
    pub(crate) fn tracked_child() -> i32 {
        CURRENT_CHILD.load(Ordering::SeqCst)
    }
}

fn install_error(err: nix::errno::Errno) -> EvalError {
    EvalError::Internal(format!("sigaction failed: {err}"))
}

/// Clears the relay target when a trial's wait concludes.
pub struct ChildGuard {
    _private: (),
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        CURRENT_CHILD.store(0, Ordering::SeqCst);
        TERM_SENT_TO.store(0, Ordering::SeqCst);
    }
}

/// SIGINT/SIGTERM: pass the signal on to the running child, then restore
/// the default disposition so a second occurrence terminates the harness
/// itself. With no child running, the signal takes its default effect
/// immediately.
///
/// Async-signal-safe: atomics and raw syscalls only.
extern "C" fn relay_signal(sig: libc::c_int) {
    let child = CURRENT_CHILD.load(Ordering::SeqCst);
    if child > 0 {
        unsafe {
            libc::kill(child, sig);
        }
    }
    unsafe {
        libc::signal(sig, libc::SIG_DFL);
        if child <= 0 {
            libc::raise(sig);
        }
    }
}

/// SIGALRM: the wall-clock cap expired. The first expiry for a child sends
/// SIGTERM and re-arms a short grace alarm; the second expiry for the same
/// child sends SIGKILL. An alarm that fires with no child tracked is stale
/// and does nothing.
///
/// Async-signal-safe: atomics and raw syscalls only.
extern "C" fn alarm_expired(_sig: libc::c_int) {
    let child = CURRENT_CHILD.load(Ordering::SeqCst);
    if child <= 0 {
        return;
    }
    if TERM_SENT_TO.swap(child, Ordering::SeqCst) == child {
        unsafe {
            libc::kill(child, libc::SIGKILL);
        }
    } else {
        unsafe {
            libc::kill(child, libc::SIGTERM);
            libc::alarm(KILL_GRACE_SECS);
        }
    }
}
