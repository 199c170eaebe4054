use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the QUIT FTP command.
///
/// Says goodbye and marks the session finished; the session loop closes the
/// connection afterwards.
pub struct QuitCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(QuitCommand)
}

#[async_trait]
impl Command for QuitCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        info!("Received QUIT command from {}", client.peer);
        client
            .control
            .reply(ReplyCode::CLOSING_CONTROL, "Goodbye.")
            .await?;
        client.finish();
        Ok(CommandOutcome::Okay)
    }
}
