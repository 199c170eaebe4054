use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::{quote_path, reply_fs_error};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the MKD (Make Directory) FTP command.
///
/// Creates a single directory; missing parents are not created.
pub struct MkdCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(MkdCommand { args })
}

#[async_trait]
impl Command for MkdCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let target = client.resolve(&self.args.arg_str);
        let context = client.context.clone();

        if let Err(e) = context.vfs.make_dir(client.username(), &target).await {
            reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, &self.args.arg_str, &e).await?;
            return Ok(CommandOutcome::Failed);
        }

        info!("{} created directory {}", client.username(), target);
        client
            .control
            .reply(
                ReplyCode::PATHNAME_CREATED,
                &format!("{} created.", quote_path(target.as_str())),
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
