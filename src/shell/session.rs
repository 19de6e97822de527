use std::fmt;
use std::io::{self, Write};

use tracing::debug;

use crate::config::ShellConfig;
use crate::core::commands::{Builtin, Command, CommandError, Context, Flow};
use crate::error::ShellError;
use crate::highlight::Painter;
use crate::input::{History, RecallError, RecallRef, Tokenizer};
use crate::process::{Launch, Mode, ProcessExecutor};

/// Result of running one line through the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// A history reference resolved; the main loop feeds this text back in
    /// as if it had just been typed.
    Recall(String),
    Exit,
}

/// Everything one accepted line can touch: history, children and the
/// output stream.
#[derive(Debug)]
pub struct Session<W: Write> {
    history: History,
    executor: ProcessExecutor,
    tokenizer: Tokenizer,
    painter: Painter,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn new(config: &ShellConfig, out: W) -> Self {
        Self {
            history: History::new(config.history_depth),
            executor: ProcessExecutor::new(),
            tokenizer: Tokenizer::for_line_limit(config.line_limit),
            painter: Painter::plain(),
            out,
        }
    }

    pub fn with_painter(mut self, painter: Painter) -> Self {
        self.painter = painter;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn executor(&self) -> &ProcessExecutor {
        &self.executor
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Classifies and runs `line`, then records it unless it recorded
    /// itself, failed to resolve, or was a recall.
    pub fn execute_line(&mut self, line: &str) -> Result<Step, ShellError> {
        let tokens = self.tokenizer.tokenize(line);
        let Some(&first) = tokens.first() else {
            return Ok(Step::Continue);
        };

        if let Some(builtin) = Builtin::lookup(first) {
            self.run_builtin(builtin, line, &tokens[1..])
        } else if RecallRef::is_recall(first) {
            self.recall(first)
        } else {
            self.run_external(line, &tokens)
        }
    }

    fn run_builtin(&mut self, builtin: Builtin, line: &str, args: &[&str]) -> Result<Step, ShellError> {
        let mut ctx = Context {
            line,
            history: &mut self.history,
            out: &mut self.out,
        };
        let flow = match builtin.execute(args, &mut ctx) {
            Ok(flow) => flow,
            Err(e) => {
                self.report(&e)?;
                Flow::Continue
            }
        };
        if flow == Flow::Exit {
            return Ok(Step::Exit);
        }
        if !builtin.records_itself() {
            self.history.record(line);
        }
        Ok(Step::Continue)
    }

    fn recall(&mut self, token: &str) -> Result<Step, ShellError> {
        let resolved = if self.history.is_empty() {
            Err(RecallError::NoHistory)
        } else {
            RecallRef::parse(token).and_then(|reference| self.history.resolve(reference))
        };

        match resolved {
            Ok(command) => {
                let command = command.to_owned();
                writeln!(self.out, "{}", self.painter.recalled(&command))?;
                self.out.flush()?;
                Ok(Step::Recall(command))
            }
            Err(e) => {
                debug!(token, "history reference rejected");
                self.report(&CommandError::from(e))?;
                Ok(Step::Continue)
            }
        }
    }

    fn run_external(&mut self, line: &str, tokens: &[&str]) -> Result<Step, ShellError> {
        let (args, mode) = Mode::split(tokens);
        self.out.flush()?;
        match self.executor.spawn_process(args, mode) {
            Ok(Launch::Detached(pid)) => debug!(pid = pid.as_raw(), "running in background"),
            Ok(Launch::Stopped(pid)) => debug!(pid = pid.as_raw(), "foreground child stopped"),
            Ok(Launch::Completed(_)) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => self.report(&CommandError::from(e))?,
        }
        self.history.record(line);
        Ok(Step::Continue)
    }

    /// Prints a recoverable failure and carries on.
    pub fn report(&mut self, err: &dyn fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{}", self.painter.error(&err.to_string()))?;
        self.out.flush()
    }

    /// Interrupt response: a newline, then the history listing.
    pub fn show_history(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.history.display(&mut self.out)
    }

    /// The listing `history` would print now, without recording anything.
    pub fn history_listing(&self) -> io::Result<String> {
        let mut listing = Vec::new();
        self.history.display(&mut listing)?;
        String::from_utf8(listing).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn reap(&mut self) -> usize {
        self.executor.reap()
    }
}
