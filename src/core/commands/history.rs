use super::{Command, CommandError, Context, Flow};

/// Lists the retained history, oldest first.
///
/// The invoking line is recorded before the listing is produced, so the
/// listing always ends with this very command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCommand;

impl Command for HistoryCommand {
    fn execute(&self, _args: &[&str], ctx: &mut Context<'_>) -> Result<Flow, CommandError> {
        ctx.history.record(ctx.line);
        ctx.history.display(&mut ctx.out)?;
        Ok(Flow::Continue)
    }
}
