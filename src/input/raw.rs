use std::io::{self, Write};
use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::unistd;

use super::{InputError, LineReader, ReadOutcome};

const CHUNK: usize = 1024;

/// Line reader over a raw file descriptor, for pipes and dumb terminals.
///
/// Waits on the input and on the interrupt socket at the same time, so an
/// interrupt wakes the reader even though the handler itself never touches
/// shell state.
pub struct RawReader {
    input: RawFd,
    interrupt: Option<RawFd>,
    line_limit: usize,
    pending: Vec<u8>,
    at_eof: bool,
}

impl RawReader {
    pub fn new(input: RawFd, line_limit: usize) -> Self {
        Self {
            input,
            interrupt: None,
            line_limit,
            pending: Vec::with_capacity(CHUNK),
            at_eof: false,
        }
    }

    pub fn with_interrupt(mut self, fd: RawFd) -> Self {
        self.interrupt = Some(fd);
        self
    }

    fn take_buffered_line(&mut self) -> Result<Option<String>, InputError> {
        match self.pending.iter().position(|&b| b == b'\n') {
            Some(end) => {
                let rest = self.pending.split_off(end + 1);
                let mut line = std::mem::replace(&mut self.pending, rest);
                line.pop();
                self.finish_line(line).map(Some)
            }
            None if self.pending.len() > self.line_limit => {
                Err(InputError::LineTooLong(self.line_limit))
            }
            None if self.at_eof && !self.pending.is_empty() => {
                let line = std::mem::take(&mut self.pending);
                self.finish_line(line).map(Some)
            }
            None => Ok(None),
        }
    }

    fn finish_line(&self, line: Vec<u8>) -> Result<String, InputError> {
        if line.len() > self.line_limit {
            return Err(InputError::LineTooLong(self.line_limit));
        }
        String::from_utf8(line).map_err(|_| InputError::InvalidUtf8)
    }

    /// Blocks until input or an interrupt is ready. Returns `true` for an
    /// interrupt.
    fn wait_ready(&self) -> Result<bool, InputError> {
        let mut fds = vec![PollFd::new(self.input, PollFlags::POLLIN)];
        if let Some(fd) = self.interrupt {
            fds.push(PollFd::new(fd, PollFlags::POLLIN));
        }
        loop {
            match poll(&mut fds, -1) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let interrupted = fds
            .get(1)
            .and_then(|fd| fd.revents())
            .is_some_and(|events| events.contains(PollFlags::POLLIN));
        Ok(interrupted)
    }

    fn fill(&mut self) -> Result<(), InputError> {
        let mut chunk = [0u8; CHUNK];
        loop {
            match unistd::read(self.input, &mut chunk) {
                Ok(0) => {
                    self.at_eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl LineReader for RawReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, InputError> {
        if !prompt.is_empty() {
            let mut stdout = io::stdout().lock();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
        }
        loop {
            if let Some(line) = self.take_buffered_line()? {
                return Ok(ReadOutcome::Line(line));
            }
            if self.at_eof {
                return Ok(ReadOutcome::Eof);
            }
            if self.wait_ready()? {
                return Ok(ReadOutcome::Interrupted);
            }
            self.fill()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{close, pipe, write};

    fn feed(bytes: &[u8]) -> RawFd {
        let (read_end, write_end) = pipe().unwrap();
        write(write_end, bytes).unwrap();
        close(write_end).unwrap();
        read_end
    }

    #[test]
    fn test_lines_arriving_together_are_split() {
        let fd = feed(b"pwd\ncd /tmp\n\nhistory");
        let mut reader = RawReader::new(fd, 1023);
        assert_eq!(reader.read_line("").unwrap(), ReadOutcome::Line("pwd".into()));
        assert_eq!(
            reader.read_line("").unwrap(),
            ReadOutcome::Line("cd /tmp".into())
        );
        assert_eq!(reader.read_line("").unwrap(), ReadOutcome::Line("".into()));
        assert_eq!(
            reader.read_line("").unwrap(),
            ReadOutcome::Line("history".into())
        );
        assert_eq!(reader.read_line("").unwrap(), ReadOutcome::Eof);
        close(fd).unwrap();
    }

    #[test]
    fn test_overlong_line_is_an_error() {
        let mut input = vec![b'x'; 40];
        input.push(b'\n');
        let fd = feed(&input);
        let mut reader = RawReader::new(fd, 16);
        assert!(matches!(
            reader.read_line(""),
            Err(InputError::LineTooLong(16))
        ));
        close(fd).unwrap();
    }

    #[test]
    fn test_line_at_limit_is_accepted() {
        let fd = feed(b"0123456789abcdef\n");
        let mut reader = RawReader::new(fd, 16);
        assert_eq!(
            reader.read_line("").unwrap(),
            ReadOutcome::Line("0123456789abcdef".into())
        );
        close(fd).unwrap();
    }

    #[test]
    fn test_invalid_utf8_line_is_rejected_alone() {
        let fd = feed(b"echo \xff\xfe\npwd\n");
        let mut reader = RawReader::new(fd, 1023);
        assert!(matches!(reader.read_line(""), Err(InputError::InvalidUtf8)));
        assert_eq!(reader.read_line("").unwrap(), ReadOutcome::Line("pwd".into()));
        assert_eq!(reader.read_line("").unwrap(), ReadOutcome::Eof);
        close(fd).unwrap();
    }

    #[test]
    fn test_interrupt_wakes_blocked_reader() {
        let (input_read, input_write) = pipe().unwrap();
        let (signal_read, signal_write) = pipe().unwrap();
        write(signal_write, b"x").unwrap();

        let mut reader = RawReader::new(input_read, 1023).with_interrupt(signal_read);
        assert_eq!(reader.read_line("").unwrap(), ReadOutcome::Interrupted);

        for fd in [input_read, input_write, signal_read, signal_write] {
            close(fd).unwrap();
        }
    }
}
