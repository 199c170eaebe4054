use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the RNTO FTP command. The pending RNFR source is consumed
/// whether the rename succeeds or not.
pub struct RntoCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(RntoCommand { args })
}

#[async_trait]
impl Command for RntoCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let source = match client.rename_from.take() {
            Some(source) => source,
            None => {
                client
                    .control
                    .reply(ReplyCode::BAD_COMMAND_SEQUENCE, "RNFR required first.")
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };
        let target = client.resolve(&self.args.arg_str);
        let context = client.context.clone();

        if let Err(e) = context.vfs.rename(client.username(), &source, &target).await {
            reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, &self.args.arg_str, &e).await?;
            return Ok(CommandOutcome::Failed);
        }

        info!("{} renamed {} to {}", client.username(), source, target);
        client
            .control
            .reply(ReplyCode::FILE_ACTION_OKAY, "Rename successful.")
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
