use std::env;
use std::io::Write;

use super::{Command, CommandError, Context, Flow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PwdCommand;

impl Command for PwdCommand {
    fn execute(&self, _args: &[&str], ctx: &mut Context<'_>) -> Result<Flow, CommandError> {
        let cwd = env::current_dir().map_err(CommandError::CurrentDir)?;
        writeln!(ctx.out, "{}", cwd.display())?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::History;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_pwd_prints_current_dir() {
        let mut history = History::default();
        let mut out = Vec::new();
        let mut ctx = Context {
            line: "pwd",
            history: &mut history,
            out: &mut out,
        };

        assert_eq!(PwdCommand.execute(&[], &mut ctx).unwrap(), Flow::Continue);
        let expected = format!("{}\n", env::current_dir().unwrap().display());
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
