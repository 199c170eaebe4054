use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::session::Client;
use async_trait::async_trait;

/// Handles the RNFR FTP command, the first half of a rename.
pub struct RnfrCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(RnfrCommand { args })
}

#[async_trait]
impl Command for RnfrCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let source = client.resolve(&self.args.arg_str);
        client.rename_from = None;

        if let Err(e) = client.context.vfs.exists(&source).await {
            reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, &self.args.arg_str, &e).await?;
            return Ok(CommandOutcome::Failed);
        }

        client.rename_from = Some(source);
        client
            .control
            .reply(
                ReplyCode::PENDING_MORE_INFO,
                "File exists, ready for destination name.",
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
