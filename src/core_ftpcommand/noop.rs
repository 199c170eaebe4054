use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;

pub struct NoopCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(NoopCommand)
}

#[async_trait]
impl Command for NoopCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        client
            .control
            .reply(ReplyCode::COMMAND_OKAY, "Command okay.")
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
