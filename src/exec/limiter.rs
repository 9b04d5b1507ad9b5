//! Bounded execution
//!
//! Runs one launch to completion under a CPU cap (applied in the child) and
//! a wall-clock cap (a one-shot alarm in the parent), and turns the reap
//! data into an [`ExecutionResult`].

use crate::config::types::{EvalError, ExecutionResult, Result};
use crate::exec::launcher::{self, LaunchSpec};
use crate::exec::relay::SignalRelay;
use nix::unistd::alarm;
use std::mem::MaybeUninit;
use std::time::Duration;

/// Per-trial resource caps. Zero on either axis means unlimited.
#[derive(Clone, Copy, Debug, Default)]
pub struct Limits {
    pub cpu_secs: u64,
    pub wall_secs: u64,
}

/// Runs launches under [`Limits`], measuring each one.
pub struct Limiter<'r> {
    relay: &'r SignalRelay,
    limits: Limits,
}

impl<'r> Limiter<'r> {
    pub fn new(relay: &'r SignalRelay, limits: Limits) -> Self {
        Self { relay, limits }
    }

    /// Run one trial to completion.
    ///
    /// A normal exit yields the measured result whatever the exit code.
    /// Death by signal, including a wall-clock kill, is
    /// [`EvalError::Signaled`]. The wall timestamp is taken before the fork
    /// and after the reap, so it covers the child's whole lifetime.
    pub fn run(&self, spec: &LaunchSpec) -> Result<ExecutionResult> {
        let before = timestamp();
        let child = launcher::spawn(spec, self.limits.cpu_secs)?;
        let _guard = self.relay.track(child);
        if self.limits.wall_secs > 0 {
            let secs = self.limits.wall_secs.min(u32::MAX as u64) as u32;
            let _ = alarm::set(secs);
        }
        let outcome = wait_with_usage(child);
        let _ = alarm::cancel();
        let after = timestamp();
        let (status, usage) = outcome?;

        if libc::WIFEXITED(status) {
            Ok(ExecutionResult {
                user_time: cpu_duration(usage.ru_utime),
                system_time: cpu_duration(usage.ru_stime),
                wall_time: timeval_delta(before, after),
                exit_code: libc::WEXITSTATUS(status),
            })
        } else if libc::WIFSIGNALED(status) {
            Err(EvalError::Signaled {
                signal: libc::WTERMSIG(status),
            })
        } else {
            Err(EvalError::Internal(format!(
                "unexpected wait status {status:#x}"
            )))
        }
    }
}

/// wait4 wrapper that keeps the rusage. The relay's handlers run without
/// SA_RESTART, so an EINTR here just means a signal was relayed; wait again.
fn wait_with_usage(child: nix::unistd::Pid) -> Result<(libc::c_int, libc::rusage)> {
    let mut status: libc::c_int = 0;
    let mut usage = MaybeUninit::<libc::rusage>::zeroed();
    loop {
        let rc = unsafe { libc::wait4(child.as_raw(), &mut status, 0, usage.as_mut_ptr()) };
        if rc == child.as_raw() {
            return Ok((status, unsafe { usage.assume_init() }));
        }
        let err = std::io::Error::last_os_error();
        if rc == -1 && err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(EvalError::Internal(format!(
            "wait4 on pid {child} failed: {err}"
        )));
    }
}

fn timestamp() -> libc::timeval {
    let mut tv = libc::timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    unsafe {
        libc::gettimeofday(&mut tv, std::ptr::null_mut());
    }
    tv
}

/// Elapsed time between two wall timestamps, borrowing from the seconds
/// when the microseconds go negative.
fn timeval_delta(before: libc::timeval, after: libc::timeval) -> Duration {
    let mut sec = after.tv_sec - before.tv_sec;
    let usec = if before.tv_usec > after.tv_usec {
        sec -= 1;
        1_000_000 + after.tv_usec - before.tv_usec
    } else {
        after.tv_usec - before.tv_usec
    };
    if sec < 0 {
        // gettimeofday is not monotonic; a stepped clock reads as zero
        return Duration::ZERO;
    }
    Duration::new(sec as u64, usec as u32 * 1000)
}

fn cpu_duration(tv: libc::timeval) -> Duration {
    Duration::new(tv.tv_sec.max(0) as u64, tv.tv_usec.max(0) as u32 * 1000)
}
