use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::session::Client;
use async_trait::async_trait;

/// Handles the SIZE FTP command. Reports the size on disk, whatever the
/// transfer type.
pub struct SizeCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SizeCommand { args })
}

#[async_trait]
impl Command for SizeCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let target = client.resolve(&self.args.arg_str);
        let meta = client.context.vfs.file_metadata(&target).await;
        match meta {
            Ok(meta) => {
                client
                    .control
                    .reply(ReplyCode::FILE_STATUS, &meta.len().to_string())
                    .await?;
                Ok(CommandOutcome::Okay)
            }
            Err(e) => {
                reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, &self.args.arg_str, &e).await?;
                Ok(CommandOutcome::Failed)
            }
        }
    }
}
