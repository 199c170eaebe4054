use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::core_vfs::FsError;
use crate::session::Client;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Handles the MDTM FTP command: the modification time as
/// `YYYYMMDDHHMMSS` in UTC.
pub struct MdtmCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(MdtmCommand { args })
}

#[async_trait]
impl Command for MdtmCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let target = client.resolve(&self.args.arg_str);
        let modified = client
            .context
            .vfs
            .file_metadata(&target)
            .await
            .and_then(|meta| meta.modified().map_err(FsError::from));

        match modified {
            Ok(modified) => {
                let stamp = DateTime::<Utc>::from(modified).format("%Y%m%d%H%M%S");
                client
                    .control
                    .reply(ReplyCode::FILE_STATUS, &stamp.to_string())
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
