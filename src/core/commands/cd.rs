use std::env;

use super::{Command, CommandError, Context, Flow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CdCommand;

impl Command for CdCommand {
    fn execute(&self, args: &[&str], _ctx: &mut Context<'_>) -> Result<Flow, CommandError> {
        let path = args.first().ok_or(CommandError::MissingPath)?;
        env::set_current_dir(path).map_err(|e| CommandError::ChangeDir(path.to_string(), e))?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::History;
    use serial_test::serial;

    fn run(args: &[&str]) -> Result<Flow, CommandError> {
        let mut history = History::default();
        let mut out = Vec::new();
        let mut ctx = Context {
            line: "cd",
            history: &mut history,
            out: &mut out,
        };
        CdCommand.execute(args, &mut ctx)
    }

    #[test]
    #[serial]
    fn test_cd_temp() {
        let original = env::current_dir().unwrap();
        let temp_dir = env::temp_dir().canonicalize().unwrap();

        assert!(run(&[temp_dir.to_str().unwrap()]).is_ok());
        assert_eq!(env::current_dir().unwrap(), temp_dir);

        env::set_current_dir(original).unwrap();
    }

    #[test]
    #[serial]
    fn test_cd_invalid_leaves_cwd_alone() {
        let before = env::current_dir().unwrap();
        let result = run(&["/nonexistent/path"]);
        assert!(matches!(result, Err(CommandError::ChangeDir(..))));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn test_cd_without_argument_is_an_error() {
        let before = env::current_dir().unwrap();
        assert!(matches!(run(&[]), Err(CommandError::MissingPath)));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
