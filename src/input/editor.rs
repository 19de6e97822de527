use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use tracing::{debug, warn};

use super::{InputError, LineReader, ReadOutcome};
use crate::process::InterruptListener;

/// Terminal line reader backed by rustyline.
///
/// Accepted lines are fed into rustyline's own in-memory list so arrow keys
/// work; that list is separate from the numbered shell history and is never
/// written to disk.
pub struct EditorReader {
    editor: DefaultEditor,
    line_limit: usize,
    listing: String,
    staged: Option<Arc<Staged>>,
}

/// Text the interrupt watcher may print. It is `Some` only while `readline`
/// is blocked, which is also the only time the history cannot change.
#[derive(Default)]
struct Staged {
    text: Mutex<Option<String>>,
    reading: Condvar,
}

impl Staged {
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.text.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, text: Option<String>) {
        *self.lock() = text;
        self.reading.notify_all();
    }
}

impl EditorReader {
    pub fn new(line_limit: usize) -> Result<Self, InputError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            line_limit,
            listing: String::new(),
            staged: None,
        })
    }

    /// Answers interrupts that arrive while `readline` is blocked.
    ///
    /// rustyline restarts its read on EINTR, so the notification socket is
    /// watched from a separate thread which prints the staged listing above
    /// the prompt. Outside `readline` nothing is staged and the watcher leaves
    /// the notification to the main loop.
    pub fn with_interrupt(mut self, listener: InterruptListener) -> Result<Self, InputError> {
        let printer = self.editor.create_external_printer()?;
        let staged = Arc::new(Staged::default());
        let shared = Arc::clone(&staged);
        thread::Builder::new()
            .name("interrupt-watch".to_string())
            .spawn(move || watch_interrupts(printer, &listener, &shared))?;
        self.staged = Some(staged);
        Ok(self)
    }
}

fn watch_interrupts<P: ExternalPrinter>(mut printer: P, listener: &InterruptListener, staged: &Staged) {
    loop {
        if let Err(e) = listener.wait() {
            warn!("interrupt watcher stopped: {}", e);
            return;
        }
        let text = {
            let mut text = staged.lock();
            while text.is_none() {
                text = staged
                    .reading
                    .wait(text)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            // The main loop drains before each read; nothing left means it
            // already answered this one.
            if !listener.take_pending() {
                continue;
            }
            text.clone()
        };
        if let Some(text) = text {
            debug!("interrupt received at the editor prompt, listing history");
            if let Err(e) = printer.print(text) {
                warn!("couldn't print history listing: {}", e);
                return;
            }
        }
    }
}

impl LineReader for EditorReader {
    fn stage_listing(&mut self, listing: String) {
        self.listing = listing;
    }

    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, InputError> {
        if let Some(staged) = &self.staged {
            staged.set(Some(format!("{}\n{}", prompt, self.listing)));
        }
        let result = self.editor.readline(prompt);
        if let Some(staged) = &self.staged {
            staged.set(None);
        }

        match result {
            Ok(line) => {
                if line.len() > self.line_limit {
                    return Err(InputError::LineTooLong(self.line_limit));
                }
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        warn!("couldn't add line to editor history: {}", e);
                    }
                }
                Ok(ReadOutcome::Line(line))
            }
            // Raw mode swallows the keypress, so Ctrl-C arrives here instead
            // of as a signal.
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use signal_hook::consts::SIGINT;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::time::Duration;

    struct ChannelPrinter(Sender<String>);

    impl ExternalPrinter for ChannelPrinter {
        fn print(&mut self, msg: String) -> rustyline::Result<()> {
            let _ = self.0.send(msg);
            Ok(())
        }
    }

    fn spawn_watcher() -> (InterruptListener, Arc<Staged>, Receiver<String>) {
        let listener = InterruptListener::install().unwrap();
        listener.take_pending();
        let watcher = listener.try_clone().unwrap();
        let staged = Arc::new(Staged::default());
        let shared = Arc::clone(&staged);
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || watch_interrupts(ChannelPrinter(sender), &watcher, &shared));
        (listener, staged, receiver)
    }

    #[test]
    #[serial]
    fn test_interrupt_while_reading_prints_staged_listing() {
        let (listener, staged, printed) = spawn_watcher();
        staged.set(Some("/tmp> \n1\tpwd\n".to_string()));

        signal_hook::low_level::raise(SIGINT).unwrap();
        let text = printed.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(text, "/tmp> \n1\tpwd\n");
        assert!(!listener.take_pending());
    }

    #[test]
    #[serial]
    fn test_interrupt_outside_read_is_left_for_main_loop() {
        let (listener, staged, printed) = spawn_watcher();
        staged.set(None);

        signal_hook::low_level::raise(SIGINT).unwrap();
        assert!(printed.recv_timeout(Duration::from_millis(300)).is_err());
        assert!(listener.take_pending());

        // Staging afterwards does not replay an interrupt already answered.
        staged.set(Some("1\tpwd\n".to_string()));
        assert!(printed.recv_timeout(Duration::from_millis(300)).is_err());
    }
}
