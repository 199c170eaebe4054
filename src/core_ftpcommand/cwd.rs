use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the CWD FTP command.
///
/// # Arguments
///
/// * `arg` - Target directory, absolute or relative to the working directory.
pub struct CwdCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(CwdCommand { args })
}

/// Moves the working directory to `arg`. Shared with CDUP.
pub async fn change_working_dir(
    client: &mut Client,
    arg: &str,
) -> Result<CommandOutcome, ControlError> {
    let target = client.resolve(arg);
    let context = client.context.clone();

    if let Err(e) = context.vfs.change_dir(client.username(), &target).await {
        reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, arg, &e).await?;
        return Ok(CommandOutcome::Failed);
    }

    info!("{} changed directory to {}", client.username(), target);
    client.work_dir = target;
    client
        .control
        .reply(
            ReplyCode::FILE_ACTION_OKAY,
            &format!("Directory changed to {}.", client.work_dir),
        )
        .await?;
    Ok(CommandOutcome::Okay)
}

#[async_trait]
impl Command for CwdCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        change_working_dir(client, &self.args.arg_str).await
    }
}
