use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::quote_path;
use crate::session::Client;
use async_trait::async_trait;

/// Handles the PWD FTP command.
pub struct PwdCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(PwdCommand)
}

#[async_trait]
impl Command for PwdCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let message = format!("{} is current directory.", quote_path(client.work_dir.as_str()));
        client
            .control
            .reply(ReplyCode::PATHNAME_CREATED, &message)
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
