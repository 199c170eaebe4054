use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;

/// Handles the SYST FTP command. Always reports a UNIX system so clients
/// parse `LIST` output as `ls -l`.
pub struct SystCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(SystCommand)
}

#[async_trait]
impl Command for SystCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        client
            .control
            .reply(ReplyCode::NAME_SYSTEM_TYPE, "UNIX Type: L8")
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
