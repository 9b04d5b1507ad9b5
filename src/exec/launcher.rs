//! Process launching
//!
//! Fork, redirect stdio, apply the CPU cap, exec. A close-on-exec pipe
//! carries the failure stage and errno back to the parent, so `spawn`
//! only returns a pid once the exec has actually happened.

use crate::config::types::{EvalError, Result};
use log::warn;
use nix::fcntl::OFlag;
use nix::sys::wait::waitpid;
use nix::unistd::{close, fork, pipe2, ForkResult, Pid};
use std::ffi::CString;
use std::fs::File;
use std::io::Read;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::path::PathBuf;

/// Pre-exec failure stages reported over the status pipe.
const STAGE_RLIMIT: u8 = b'r';
const STAGE_EXEC: u8 = b'x';

/// Where one of the child's standard streams should point.
#[derive(Clone, Debug)]
pub enum Redirect {
    /// Leave the harness's own stream in place
    Inherit,
    /// Open the named file for reading
    ReadPath(PathBuf),
    /// Create or truncate the named file for writing
    WritePath(PathBuf),
}

/// Everything needed to start one child process.
#[derive(Clone, Debug)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stdin: Redirect,
    pub stdout: Redirect,
    pub stderr: Redirect,
}

impl LaunchSpec {
    /// A spec with all three streams inherited.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            stdin: Redirect::Inherit,
            stdout: Redirect::Inherit,
            stderr: Redirect::Inherit,
        }
    }
}

/// Fork and exec one child under the given spec.
///
/// `cpu_limit_secs` becomes RLIMIT_CPU (soft and hard) in the child before
/// the exec; zero leaves the limit untouched. A redirect target that cannot
/// be opened degrades to the inherited stream with a warning. Returns the
/// child's pid once the exec is underway; if the exec or the rlimit fails,
/// the child is reaped here and the failure comes back as an error.
pub fn spawn(spec: &LaunchSpec, cpu_limit_secs: u64) -> Result<Pid> {
    let program = cstring(spec.program.as_os_str().as_bytes())?;
    let mut argv = vec![program.clone()];
    for arg in &spec.args {
        argv.push(cstring(arg.as_bytes())?);
    }
    // argv pointers are prepared before the fork; the child allocates nothing
    let mut argv_ptrs: Vec<*const libc::c_char> = argv.iter().map(|a| a.as_ptr()).collect();
    argv_ptrs.push(std::ptr::null());

    let stdin_file = open_redirect(&spec.stdin, "stdin");
    let stdout_file = open_redirect(&spec.stdout, "stdout");
    let stderr_file = open_redirect(&spec.stderr, "stderr");
    let stdio = [
        stdin_file.as_ref().map(|f| f.as_raw_fd()),
        stdout_file.as_ref().map(|f| f.as_raw_fd()),
        stderr_file.as_ref().map(|f| f.as_raw_fd()),
    ];

    let (status_read, status_write) = pipe2(OFlag::O_CLOEXEC)
        .map_err(|e| EvalError::Launch(format!("pipe failed: {e}")))?;

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let _ = close(status_read);
            exec_child(
                program.as_ptr(),
                argv_ptrs.as_ptr(),
                stdio,
                cpu_limit_secs,
                status_write,
            )
        }
        Ok(ForkResult::Parent { child }) => {
            let _ = close(status_write);
            // The child holds its own copies; the parent's are done.
            drop(stdin_file);
            drop(stdout_file);
            drop(stderr_file);
            await_exec(child, status_read)
        }
        Err(err) => {
            let _ = close(status_read);
            let _ = close(status_write);
            Err(EvalError::Launch(format!("fork failed: {err}")))
        }
    }
}

fn cstring(bytes: &[u8]) -> Result<CString> {
    CString::new(bytes).map_err(|_| EvalError::Config("command contains NUL byte".to_string()))
}

/// Open a redirect target in the parent, before the fork. `None` means the
/// stream stays inherited, either by request or because the open failed.
fn open_redirect(target: &Redirect, stream: &str) -> Option<File> {
    let (path, opened) = match target {
        Redirect::Inherit => return None,
        Redirect::ReadPath(path) => (path, File::open(path)),
        Redirect::WritePath(path) => (path, File::create(path)),
    };
    match opened {
        Ok(file) => Some(file),
        Err(err) => {
            warn!(
                "could not open {} for {} redirection: {}; stream left inherited",
                path.display(),
                stream,
                err
            );
            None
        }
    }
}

/// Post-fork path. Only async-signal-safe calls from here to the exec:
/// raw syscalls on prepared data, no allocation, no locks.
fn exec_child(
    program: *const libc::c_char,
    argv: *const *const libc::c_char,
    stdio: [Option<RawFd>; 3],
    cpu_limit_secs: u64,
    status_fd: RawFd,
) -> ! {
    unsafe {
        if let Some(fd) = stdio[0] {
            libc::dup2(fd, libc::STDIN_FILENO);
        }
        if let Some(fd) = stdio[1] {
            libc::dup2(fd, libc::STDOUT_FILENO);
        }
        if let Some(fd) = stdio[2] {
            libc::dup2(fd, libc::STDERR_FILENO);
        }

        if cpu_limit_secs > 0 {
            let limit = libc::rlimit {
                rlim_cur: cpu_limit_secs as libc::rlim_t,
                rlim_max: cpu_limit_secs as libc::rlim_t,
            };
            if libc::setrlimit(libc::RLIMIT_CPU, &limit) != 0 {
                report_and_exit(status_fd, STAGE_RLIMIT);
            }
        }

        libc::execv(program, argv);
    }
    // Still here: the exec itself failed.
    report_and_exit(status_fd, STAGE_EXEC)
}

fn report_and_exit(status_fd: RawFd, stage: u8) -> ! {
    let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
    let mut buf = [0u8; 5];
    buf[0] = stage;
    buf[1..].copy_from_slice(&errno.to_ne_bytes());
    unsafe {
        let _ = libc::write(status_fd, buf.as_ptr() as *const libc::c_void, buf.len());
        libc::_exit(127);
    }
}

/// Wait for the status pipe to resolve the launch. EOF with no bytes means
/// close-on-exec fired and the child is running; a stage report means the
/// child never made it, in which case it is reaped before returning.
fn await_exec(child: Pid, status_read: RawFd) -> Result<Pid> {
    let mut report = Vec::new();
    let mut pipe = unsafe { File::from_raw_fd(status_read) };
    if let Err(err) = pipe.read_to_end(&mut report) {
        let _ = waitpid(child, None);
        return Err(EvalError::Launch(format!(
            "could not read launch status: {err}"
        )));
    }
    if report.is_empty() {
        return Ok(child);
    }

    let _ = waitpid(child, None);
    let errno = if report.len() >= 5 {
        i32::from_ne_bytes([report[1], report[2], report[3], report[4]])
    } else {
        0
    };
    let cause = std::io::Error::from_raw_os_error(errno);
    match report[0] {
        STAGE_RLIMIT => Err(EvalError::LimitSetup(cause.to_string())),
        _ => Err(EvalError::Launch(format!(
            "failed to execute process: {cause}"
        ))),
    }
}
