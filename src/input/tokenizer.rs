/// Splits a command line into argument words.
///
/// Words are separated by spaces, tabs and newlines only; every returned
/// word borrows from the input line and is non-empty. Words past the token
/// budget are dropped silently. A trailing `&` is returned like any other
/// word, deciding what it means is up to the caller.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    max_tokens: usize,
}

const DELIMITERS: [char; 3] = [' ', '\t', '\n'];

impl Tokenizer {
    /// Budget derived from the line limit: a line of `n` bytes holds at most
    /// `n / 2 + 1` single-byte words.
    pub fn for_line_limit(line_limit: usize) -> Self {
        Self {
            max_tokens: line_limit / 2 + 1,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn tokenize<'a>(&self, line: &'a str) -> Vec<&'a str> {
        line.split(DELIMITERS)
            .filter(|word| !word.is_empty())
            .take(self.max_tokens)
            .collect()
    }
}
