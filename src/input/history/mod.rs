mod recall;

use std::{
    collections::VecDeque,
    io::{self, Write},
};

use tracing::trace;

pub use self::recall::{RecallError, RecallRef};

pub const HISTORY_DEPTH: usize = 10;

/// Bounded window over every command accepted this session.
///
/// Only the newest `capacity` lines are kept. Sequence numbers are not
/// stored per entry: the newest entry is numbered `total` and the window is
/// contiguous, so the number of any slot is derived from its position.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
    total: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Appends `line`, evicting the oldest entry when full, and returns the
    /// sequence number assigned to it.
    pub fn record(&mut self, line: &str) -> u64 {
        if self.entries.len() == self.capacity {
            let number = self.first_number();
            if let Some(evicted) = self.entries.pop_front() {
                trace!(number, command = %evicted, "evicted history entry");
            }
        }
        self.entries.push_back(line.to_owned());
        self.total += 1;
        self.total
    }

    /// Writes `<number>\t<command>\n` for every retained entry, oldest first.
    pub fn display<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (number, command) in self.iter() {
            writeln!(out, "{}\t{}", number, command)?;
        }
        out.flush()
    }

    pub fn resolve(&self, reference: RecallRef) -> Result<&str, RecallError> {
        if self.is_empty() {
            return Err(RecallError::NoHistory);
        }
        let number = match reference {
            RecallRef::Last => self.total,
            RecallRef::Number(number) => number,
        };
        if !self.contains(number) {
            return Err(RecallError::InvalidLineNumber);
        }
        let offset = (number - self.first_number()) as usize;
        self.entries
            .get(offset)
            .map(String::as_str)
            .ok_or(RecallError::InvalidLineNumber)
    }

    pub fn contains(&self, number: u64) -> bool {
        !self.is_empty() && number >= self.first_number() && number <= self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> + '_ {
        let first = self.first_number();
        self.entries
            .iter()
            .enumerate()
            .map(move |(offset, command)| (first + offset as u64, command.as_str()))
    }

    /// Number of the oldest retained entry, or `total + 1` when empty.
    pub fn first_number(&self) -> u64 {
        self.total + 1 - self.entries.len() as u64
    }

    /// Last sequence number issued, `0` before anything was recorded.
    pub fn last_number(&self) -> u64 {
        self.total
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
