use std::fmt;

/// A `!!` or `!N` reference to a previously accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallRef {
    Last,
    Number(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallError {
    NoHistory,
    InvalidLineNumber,
}

impl fmt::Display for RecallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecallError::NoHistory => write!(f, "There is no history"),
            RecallError::InvalidLineNumber => write!(f, "Invalid line number"),
        }
    }
}

impl std::error::Error for RecallError {}

impl RecallRef {
    pub fn is_recall(token: &str) -> bool {
        token.starts_with('!')
    }

    /// Parses a word starting with `!`.
    ///
    /// Only plain decimal digits are accepted after a single `!`; signs,
    /// zero and anything else yield `InvalidLineNumber`.
    pub fn parse(token: &str) -> Result<Self, RecallError> {
        let rest = token
            .strip_prefix('!')
            .ok_or(RecallError::InvalidLineNumber)?;
        if rest == "!" {
            return Ok(RecallRef::Last);
        }
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RecallError::InvalidLineNumber);
        }
        match rest.parse::<u64>() {
            Ok(0) | Err(_) => Err(RecallError::InvalidLineNumber),
            Ok(number) => Ok(RecallRef::Number(number)),
        }
    }
}
