use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the DELE FTP command. Only plain files can be deleted.
pub struct DeleCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(DeleCommand { args })
}

#[async_trait]
impl Command for DeleCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let target = client.resolve(&self.args.arg_str);
        let context = client.context.clone();

        if let Err(e) = context.vfs.delete_file(client.username(), &target).await {
            reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, &self.args.arg_str, &e).await?;
            return Ok(CommandOutcome::Failed);
        }

        info!("{} deleted {}", client.username(), target);
        client
            .control
            .reply(ReplyCode::FILE_ACTION_OKAY, "File deleted.")
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
