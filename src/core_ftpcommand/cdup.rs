use crate::core_control::ControlError;
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::cwd::change_working_dir;
use crate::session::Client;
use async_trait::async_trait;

/// Handles the CDUP FTP command, a CWD to the parent directory.
pub struct CdupCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(CdupCommand)
}

#[async_trait]
impl Command for CdupCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        change_working_dir(client, "..").await
    }
}
