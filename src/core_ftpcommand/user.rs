use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the USER FTP command.
///
/// Records the name and asks for a password. Unknown names get the same
/// answer as known ones.
pub struct UserCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(UserCommand { args })
}

#[async_trait]
impl Command for UserCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if client.is_logged_in() {
            client
                .control
                .reply(ReplyCode::BAD_COMMAND_SEQUENCE, "Already logged in.")
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        let username = self.args.arg_str.trim();
        info!("Received USER command with username: {}", username);
        client.begin_login(username);
        client
            .control
            .reply(
                ReplyCode::NEED_PASSWORD,
                &format!("Password required for {}.", username),
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
