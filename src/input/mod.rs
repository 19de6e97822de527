mod editor;
pub mod history;
mod raw;
mod tokenizer;

use std::fmt;

pub use editor::EditorReader;
pub use history::{History, RecallError, RecallRef, HISTORY_DEPTH};
pub use raw::RawReader;
pub use tokenizer::Tokenizer;

/// What a single blocking read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// An interrupt arrived before a full line did.
    Interrupted,
    Eof,
}

pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, InputError>;

    /// History listing to show if an interrupt arrives while the next
    /// `read_line` is blocked. Readers that report `Interrupted` instead
    /// ignore it.
    fn stage_listing(&mut self, _listing: String) {}
}

#[derive(Debug)]
pub enum InputError {
    Readline(rustyline::error::ReadlineError),
    Io(std::io::Error),
    LineTooLong(usize),
    /// The line was dropped; reading can carry on with the next one.
    InvalidUtf8,
}

impl InputError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InputError::InvalidUtf8)
    }
}

impl From<rustyline::error::ReadlineError> for InputError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        InputError::Readline(err)
    }
}

impl From<std::io::Error> for InputError {
    fn from(err: std::io::Error) -> Self {
        InputError::Io(err)
    }
}

impl From<nix::errno::Errno> for InputError {
    fn from(err: nix::errno::Errno) -> Self {
        InputError::Io(err.into())
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Readline(e) => write!(f, "Unable to read command: {}", e),
            InputError::Io(e) => write!(f, "Unable to read command: {}", e),
            InputError::LineTooLong(limit) => {
                write!(f, "Unable to read command: line exceeds {} bytes", limit)
            }
            InputError::InvalidUtf8 => write!(f, "Unable to read command: input is not valid UTF-8"),
        }
    }
}

impl std::error::Error for InputError {}
