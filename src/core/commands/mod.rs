use std::io::Write;

mod cd;
mod exit;
mod history;
mod pwd;

pub use cd::CdCommand;
pub use exit::ExitCommand;
pub use history::HistoryCommand;
pub use pwd::PwdCommand;

use crate::input::{History, RecallError};
use crate::process::ProcessError;

/// Recoverable failures; each one ends as a fixed message to the user.
#[derive(Debug)]
pub enum CommandError {
    CurrentDir(std::io::Error),
    ChangeDir(String, std::io::Error),
    MissingPath,
    Recall(RecallError),
    Launch(ProcessError),
    IoError(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::CurrentDir(_) => write!(f, "Failed to retrieve current directory"),
            CommandError::ChangeDir(..) => write!(f, "Failed to change current directory"),
            CommandError::MissingPath => {
                write!(f, "Failed to change current directory: missing path")
            }
            CommandError::Recall(err) => write!(f, "{}", err),
            CommandError::Launch(err) => write!(f, "{}", err),
            CommandError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::IoError(err)
    }
}

impl From<RecallError> for CommandError {
    fn from(err: RecallError) -> Self {
        CommandError::Recall(err)
    }
}

impl From<ProcessError> for CommandError {
    fn from(err: ProcessError) -> Self {
        CommandError::Launch(err)
    }
}

/// What the main loop does once a built-in returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Shell state a built-in may read or change.
pub struct Context<'a> {
    /// The accepted line, verbatim.
    pub line: &'a str,
    pub history: &'a mut History,
    pub out: &'a mut dyn Write,
}

pub trait Command {
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<Flow, CommandError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit(ExitCommand),
    Pwd(PwdCommand),
    Cd(CdCommand),
    History(HistoryCommand),
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit(ExitCommand)),
            "pwd" => Some(Builtin::Pwd(PwdCommand)),
            "cd" => Some(Builtin::Cd(CdCommand)),
            "history" => Some(Builtin::History(HistoryCommand)),
            _ => None,
        }
    }

    /// `history` appends its own line before listing, so the usual append
    /// after execution must be skipped for it.
    pub fn records_itself(&self) -> bool {
        matches!(self, Builtin::History(_))
    }
}

impl Command for Builtin {
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<Flow, CommandError> {
        match self {
            Builtin::Exit(cmd) => cmd.execute(args, ctx),
            Builtin::Pwd(cmd) => cmd.execute(args, ctx),
            Builtin::Cd(cmd) => cmd.execute(args, ctx),
            Builtin::History(cmd) => cmd.execute(args, ctx),
        }
    }
}
