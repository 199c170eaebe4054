use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;

/// Handles the ALLO FTP command. Storage is never preallocated.
pub struct AlloCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(AlloCommand)
}

#[async_trait]
impl Command for AlloCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        client
            .control
            .reply(
                ReplyCode::COMMAND_SUPERFLUOUS,
                "No storage allocation necessary.",
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
