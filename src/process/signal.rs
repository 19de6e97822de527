use std::io::{self, ErrorKind, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use signal_hook::consts::SIGINT;
use signal_hook::low_level::pipe;
use tracing::debug;

use crate::process::ProcessError;

/// Receiving end of the SIGINT notification socket.
///
/// The handler registered by [`InterruptListener::install`] only writes one
/// byte to the socket. Everything the interrupt triggers (the history
/// listing) runs on the main loop once it notices the byte, so the handler
/// never observes a history that is half way through an update.
#[derive(Debug)]
pub struct InterruptListener {
    receiver: UnixStream,
}

impl InterruptListener {
    /// Installs the handler for the rest of the process lifetime.
    pub fn install() -> Result<Self, ProcessError> {
        let (receiver, sender) = UnixStream::pair()?;
        receiver.set_nonblocking(true)?;
        sender.set_nonblocking(true)?;
        pipe::register(SIGINT, sender)
            .map_err(|e| ProcessError::SignalError(format!("Failed to install SIGINT handler: {}", e)))?;
        debug!("SIGINT handler installed");
        Ok(Self { receiver })
    }

    /// Drains queued notifications; `true` if at least one interrupt arrived
    /// since the last call.
    pub fn take_pending(&self) -> bool {
        let mut received = false;
        let mut buf = [0u8; 32];
        loop {
            match (&self.receiver).read(&mut buf) {
                Ok(0) => break,
                Ok(_) => received = true,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        received
    }

    /// Blocks until a notification is queued, leaving it in place for
    /// whoever drains it.
    pub fn wait(&self) -> Result<(), Errno> {
        let mut fds = [PollFd::new(self.receiver.as_raw_fd(), PollFlags::POLLIN)];
        loop {
            match poll(&mut fds, -1) {
                Ok(_) => return Ok(()),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// A second handle on the same socket. Draining through either handle
    /// consumes the notification for both.
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            receiver: self.receiver.try_clone()?,
        })
    }

    pub fn raw_fd(&self) -> RawFd {
        self.receiver.as_raw_fd()
    }
}
