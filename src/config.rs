use std::io::IsTerminal;

use crate::error::ShellError;
use crate::flags::Flags;
use crate::input::HISTORY_DEPTH;

/// Longest command line accepted, in bytes, excluding the newline.
pub const COMMAND_LENGTH: usize = 1024;
pub const LINE_LIMIT: usize = COMMAND_LENGTH - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub history_depth: usize,
    pub line_limit: usize,
    pub quiet: bool,
    pub debug: bool,
    /// Use rustyline. Only honoured when stdin is a terminal.
    pub line_editing: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_depth: HISTORY_DEPTH,
            line_limit: LINE_LIMIT,
            quiet: false,
            debug: false,
            line_editing: true,
        }
    }
}

impl ShellConfig {
    pub fn from_flags(flags: &Flags) -> Result<Self, ShellError> {
        let history_depth = match flags.get_value("history-depth") {
            Some(value) => parse_depth(value)?,
            None => HISTORY_DEPTH,
        };

        Ok(Self {
            history_depth,
            quiet: flags.is_set("quiet"),
            debug: flags.is_set("debug"),
            line_editing: !flags.is_set("plain"),
            ..Self::default()
        })
    }

    pub fn use_editor(&self) -> bool {
        self.line_editing && std::io::stdin().is_terminal()
    }
}

fn parse_depth(value: &str) -> Result<usize, ShellError> {
    match value.parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(ShellError::FlagError(format!(
            "History depth must be a positive integer, got {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(list: &[&str]) -> Flags {
        let mut flags = Flags::new();
        let args: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        flags.parse(&args).unwrap();
        flags
    }

    #[test]
    fn test_defaults() {
        let config = ShellConfig::from_flags(&Flags::new()).unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.history_depth, 10);
        assert_eq!(config.line_limit, 1023);
    }

    #[test]
    fn test_from_flags() {
        let config = ShellConfig::from_flags(&flags(&["-n", "3", "-q", "-p", "-d"])).unwrap();
        assert_eq!(config.history_depth, 3);
        assert!(config.quiet);
        assert!(config.debug);
        assert!(!config.line_editing);
        assert!(!config.use_editor());
    }

    #[test]
    fn test_rejects_bad_depth() {
        for bad in ["0", "-2", "ten", ""] {
            let result = ShellConfig::from_flags(&flags(&["--history-depth", bad]));
            assert!(matches!(result, Err(ShellError::FlagError(_))), "{:?}", bad);
        }
    }
}
