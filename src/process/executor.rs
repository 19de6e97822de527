use std::collections::HashSet;
use std::ffi::CString;
use std::io::{self, Write};
use std::ptr;

use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, fork, setpgid, ForkResult, Pid};
use tracing::{debug, warn};

use super::ProcessError;

const EXEC_FAILED: &[u8] = b"Failed to perform command\n";
const EXEC_FAILED_STATUS: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Foreground,
    Background,
}

impl Mode {
    /// Strips a final `&` word and reports the mode it selects.
    pub fn split<'a, 'b>(args: &'a [&'b str]) -> (&'a [&'b str], Mode) {
        match args.split_last() {
            Some((&"&", rest)) => (rest, Mode::Background),
            _ => (args, Mode::Foreground),
        }
    }
}

/// How a launch ended from the shell's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// Foreground child terminated and was reaped.
    Completed(WaitStatus),
    /// Foreground child stopped; it stays pending until a sweep reaps it.
    Stopped(Pid),
    /// Background child left running.
    Detached(Pid),
}

/// Launches external programs and keeps track of children the shell has
/// not yet seen terminate.
#[derive(Debug, Default)]
pub struct ProcessExecutor {
    pending: HashSet<Pid>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, pid: Pid) -> bool {
        self.pending.contains(&pid)
    }

    pub fn spawn_process(&mut self, args: &[&str], mode: Mode) -> Result<Launch, ProcessError> {
        let argv = args
            .iter()
            .map(|arg| {
                CString::new(*arg).map_err(|_| ProcessError::InvalidArgument(arg.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let program = argv.first().ok_or(ProcessError::EmptyCommand)?;
        let mut argv_ptrs: Vec<*const libc::c_char> = argv.iter().map(|arg| arg.as_ptr()).collect();
        argv_ptrs.push(ptr::null());

        // Anything still buffered would be written twice once the child
        // flushes its copy.
        let _ = io::stdout().flush();

        // SAFETY: argv is fully built before the fork, so the child only
        // makes async-signal-safe calls before exec or _exit.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                if mode == Mode::Background {
                    let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
                }
                // The Rust runtime ignores SIGPIPE, and an ignored
                // disposition survives exec.
                let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };
                unsafe { libc::execvp(program.as_ptr(), argv_ptrs.as_ptr()) };
                let _ = unistd::write(libc::STDOUT_FILENO, EXEC_FAILED);
                unsafe { libc::_exit(EXEC_FAILED_STATUS) }
            }
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = child.as_raw(), ?mode, program = args[0], "spawned child");
                match mode {
                    Mode::Foreground => self.wait_foreground(child),
                    Mode::Background => {
                        self.pending.insert(child);
                        Ok(Launch::Detached(child))
                    }
                }
            }
            Err(e) => Err(ProcessError::Fork(e)),
        }
    }

    fn wait_foreground(&mut self, child: Pid) -> Result<Launch, ProcessError> {
        loop {
            match waitpid(child, Some(WaitPidFlag::WUNTRACED)) {
                Ok(WaitStatus::Stopped(pid, signal)) => {
                    debug!(pid = pid.as_raw(), ?signal, "foreground child stopped");
                    self.pending.insert(pid);
                    return Ok(Launch::Stopped(pid));
                }
                Ok(status) => {
                    debug!(?status, "foreground child finished");
                    return Ok(Launch::Completed(status));
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ProcessError::Wait(e)),
            }
        }
    }

    /// Collects every child that has already terminated without blocking.
    /// Returns how many were collected; finding none is not an error.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    if let Some(pid) = status.pid() {
                        let tracked = self.pending.remove(&pid);
                        debug!(pid = pid.as_raw(), ?status, tracked, "reaped child");
                    }
                    reaped += 1;
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    warn!("reap sweep failed: {}", e);
                    break;
                }
            }
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_split_background_marker() {
        let args = ["sleep", "5", "&"];
        let (rest, mode) = Mode::split(&args);
        assert_eq!(rest, &["sleep", "5"]);
        assert_eq!(mode, Mode::Background);

        let args = ["sleep", "5&"];
        let (rest, mode) = Mode::split(&args);
        assert_eq!(rest, &["sleep", "5&"]);
        assert_eq!(mode, Mode::Foreground);

        let args = ["&"];
        let (rest, mode) = Mode::split(&args);
        assert!(rest.is_empty());
        assert_eq!(mode, Mode::Background);
    }

    #[test]
    fn test_empty_command() {
        let mut executor = ProcessExecutor::new();
        assert!(matches!(
            executor.spawn_process(&[], Mode::Foreground),
            Err(ProcessError::EmptyCommand)
        ));
    }

    #[test]
    fn test_nul_byte_argument() {
        let mut executor = ProcessExecutor::new();
        let result = executor.spawn_process(&["echo", "a\0b"], Mode::Foreground);
        assert!(matches!(result, Err(ProcessError::InvalidArgument(_))));
        assert!(!result.unwrap_err().is_fatal());
    }

    #[test]
    #[serial]
    fn test_foreground_waits_for_exit() {
        let mut executor = ProcessExecutor::new();
        let launch = executor.spawn_process(&["sh", "-c", "exit 3"], Mode::Foreground);
        match launch {
            Ok(Launch::Completed(WaitStatus::Exited(_, code))) => assert_eq!(code, 3),
            other => panic!("unexpected launch result: {:?}", other),
        }
        assert_eq!(executor.pending(), 0);
    }

    #[test]
    #[serial]
    fn test_child_gets_default_sigpipe() {
        let mut executor = ProcessExecutor::new();
        let launch = executor.spawn_process(&["sh", "-c", "kill -s PIPE $$; exit 0"], Mode::Foreground);
        match launch {
            Ok(Launch::Completed(WaitStatus::Signaled(_, signal, _))) => {
                assert_eq!(signal, Signal::SIGPIPE)
            }
            other => panic!("child survived SIGPIPE: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_background_child_leads_its_own_group() {
        let mut executor = ProcessExecutor::new();
        let pid = match executor.spawn_process(&["sleep", "1"], Mode::Background) {
            Ok(Launch::Detached(pid)) => pid,
            other => panic!("unexpected launch result: {:?}", other),
        };
        // The child may not have called setpgid yet.
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut group = unistd::getpgid(Some(pid)).unwrap();
        while group != pid && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
            group = unistd::getpgid(Some(pid)).unwrap();
        }
        assert_eq!(group, pid);
        assert_ne!(group, unistd::getpgrp());

        while executor.is_pending(pid) && Instant::now() < deadline + Duration::from_secs(5) {
            executor.reap();
            thread::sleep(Duration::from_millis(50));
        }
    }

    #[test]
    #[serial]
    fn test_missing_program_reported_by_child() {
        let mut executor = ProcessExecutor::new();
        let launch = executor.spawn_process(&["definitely-not-a-real-program-xyz"], Mode::Foreground);
        match launch {
            Ok(Launch::Completed(WaitStatus::Exited(_, code))) => {
                assert_eq!(code, EXEC_FAILED_STATUS)
            }
            other => panic!("unexpected launch result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_background_does_not_block_and_is_reaped() {
        let mut executor = ProcessExecutor::new();
        let start = Instant::now();
        let pid = match executor.spawn_process(&["sleep", "1"], Mode::Background) {
            Ok(Launch::Detached(pid)) => pid,
            other => panic!("unexpected launch result: {:?}", other),
        };
        assert!(start.elapsed() < Duration::from_millis(900));
        assert!(executor.is_pending(pid));

        let deadline = Instant::now() + Duration::from_secs(10);
        while executor.is_pending(pid) && Instant::now() < deadline {
            executor.reap();
            thread::sleep(Duration::from_millis(50));
        }
        assert!(!executor.is_pending(pid));
    }

    #[test]
    #[serial]
    fn test_reap_without_children_is_noop() {
        let mut executor = ProcessExecutor::new();
        executor.reap();
        assert_eq!(executor.reap(), 0);
        assert_eq!(executor.pending(), 0);
    }
}
