use super::{Command, CommandError, Context, Flow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitCommand;

impl Command for ExitCommand {
    fn execute(&self, _args: &[&str], _ctx: &mut Context<'_>) -> Result<Flow, CommandError> {
        Ok(Flow::Exit)
    }
}
