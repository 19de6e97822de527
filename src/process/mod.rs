use std::fmt;

use nix::errno::Errno;

pub mod executor;
pub mod signal;

pub use executor::{Launch, Mode, ProcessExecutor};
pub use signal::InterruptListener;

#[derive(Debug)]
pub enum ProcessError {
    /// No new process could be created at all.
    Fork(Errno),
    Wait(Errno),
    EmptyCommand,
    InvalidArgument(String),
    SignalError(String),
}

impl ProcessError {
    /// Whether the shell must terminate rather than report and carry on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProcessError::Fork(_) | ProcessError::SignalError(_))
    }
}

impl From<std::io::Error> for ProcessError {
    fn from(e: std::io::Error) -> Self {
        ProcessError::SignalError(e.to_string())
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Fork(e) => write!(f, "Failed to create child process: {}", e),
            ProcessError::Wait(e) => write!(f, "Failed to wait for child process: {}", e),
            ProcessError::EmptyCommand => write!(f, "Failed to perform command"),
            ProcessError::InvalidArgument(arg) => {
                write!(f, "Failed to perform command: invalid argument {:?}", arg)
            }
            ProcessError::SignalError(msg) => write!(f, "Signal error: {}", msg),
        }
    }
}

impl std::error::Error for ProcessError {}
