use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the RMD (Remove Directory) FTP command.
///
/// A failure also skips post-command hooks, unlike other failing commands.
pub struct RmdCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(RmdCommand { args })
}

#[async_trait]
impl Command for RmdCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let target = client.resolve(&self.args.arg_str);
        let context = client.context.clone();

        if target.is_root() || target == client.work_dir {
            client
                .control
                .reply(
                    ReplyCode::ACTION_NOT_OKAY,
                    &format!("{}: Cannot remove the current directory", self.args.arg_str),
                )
                .await?;
            return Ok(CommandOutcome::SkipPostScript);
        }

        if let Err(e) = context.vfs.remove_dir(client.username(), &target).await {
            reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, &self.args.arg_str, &e).await?;
            return Ok(CommandOutcome::SkipPostScript);
        }

        info!("{} removed directory {}", client.username(), target);
        client
            .control
            .reply(ReplyCode::FILE_ACTION_OKAY, "Directory removed.")
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
