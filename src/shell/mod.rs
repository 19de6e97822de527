use std::env;
use std::io::{self, Stdout};

use tracing::{debug, error, info, warn};

mod session;

pub use session::{Session, Step};

use crate::{
    config::ShellConfig,
    error::ShellError,
    highlight::Painter,
    input::{EditorReader, LineReader, RawReader, ReadOutcome},
    process::InterruptListener,
};

pub struct Shell {
    pub(crate) config: ShellConfig,
    pub(crate) session: Session<Stdout>,
    pub(crate) reader: Box<dyn LineReader>,
    pub(crate) interrupts: InterruptListener,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Result<Self, ShellError> {
        // Installed before anything can block, and never removed.
        let interrupts = InterruptListener::install()?;

        let reader = Self::open_reader(&config, &interrupts)?;

        let session = Session::new(&config, io::stdout()).with_painter(Painter::detect());
        info!(
            history_depth = config.history_depth,
            line_editing = config.use_editor(),
            "shell started"
        );

        Ok(Shell {
            config,
            session,
            reader,
            interrupts,
        })
    }

    fn open_reader(
        config: &ShellConfig,
        interrupts: &InterruptListener,
    ) -> Result<Box<dyn LineReader>, ShellError> {
        if config.use_editor() {
            match EditorReader::new(config.line_limit)?.with_interrupt(interrupts.try_clone()?) {
                Ok(editor) => return Ok(Box::new(editor)),
                Err(e) => warn!("line editing unavailable, reading raw input: {}", e),
            }
        }
        Ok(Box::new(
            RawReader::new(libc::STDIN_FILENO, config.line_limit).with_interrupt(interrupts.raw_fd()),
        ))
    }

    /// Runs until `exit` or end of input. Returns an error only for the
    /// fatal cases: unreadable input or a failed process creation.
    pub fn run(&mut self) -> Result<(), ShellError> {
        let mut recalled: Option<String> = None;

        loop {
            let line = match recalled.take() {
                Some(line) => line,
                None => match self.acquire_line() {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("end of input");
                        return Ok(());
                    }
                    Err(e) => return Err(self.fatal(e)),
                },
            };

            let step = self.session.execute_line(&line);
            self.session.reap();

            match step {
                Ok(Step::Continue) => {}
                Ok(Step::Recall(text)) => recalled = Some(text),
                Ok(Step::Exit) => return Ok(()),
                Err(e) => return Err(self.fatal(e)),
            }
        }
    }

    /// Reads the next typed line, answering interrupts while waiting.
    fn acquire_line(&mut self) -> Result<Option<String>, ShellError> {
        loop {
            if self.interrupts.take_pending() {
                self.service_interrupt()?;
            }

            let prompt = self.prompt();
            self.reader.stage_listing(self.session.history_listing()?);
            match self.reader.read_line(&prompt) {
                Ok(ReadOutcome::Line(line)) => {
                    // An interrupt that raced the end of the read is still
                    // answered before the new line runs.
                    if self.interrupts.take_pending() {
                        self.service_interrupt()?;
                    }
                    return Ok(Some(line));
                }
                Ok(ReadOutcome::Interrupted) => {
                    self.interrupts.take_pending();
                    self.service_interrupt()?;
                }
                Ok(ReadOutcome::Eof) => return Ok(None),
                Err(e) if e.is_recoverable() => {
                    warn!("{}", e);
                    self.session.report(&e)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn service_interrupt(&mut self) -> Result<(), ShellError> {
        debug!("interrupt received, listing history");
        self.session.show_history()?;
        Ok(())
    }

    fn prompt(&self) -> String {
        if self.config.quiet {
            return String::new();
        }
        match env::current_dir() {
            Ok(cwd) => format!("{}> ", cwd.display()),
            Err(_) => "Failed to retrieve current directory> ".to_string(),
        }
    }

    fn fatal(&self, err: ShellError) -> ShellError {
        error!("{}", err);
        err
    }
}
