use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::retr::reply_aborted;
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::core_transfer::{copy_paced, Direction};
use crate::session::{Client, TransferType};
use async_trait::async_trait;
use log::{info, warn};
use tokio::io::AsyncWriteExt;

/// Handles the STOR FTP command.
///
/// Uploads always create a new file. When the transfer fails the partial
/// file is removed again.
pub struct StorCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(StorCommand { args })
}

#[async_trait]
impl Command for StorCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let arg = self.args.arg_str.as_str();
        let context = client.context.clone();

        if !client.data.is_ready() {
            client
                .control
                .reply(
                    ReplyCode::CANT_OPEN_DATA_CONNECTION,
                    "Can't open data connection.",
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        if client.transfer_type == TransferType::Ascii && !context.config.transfer.ascii_uploads {
            client
                .control
                .reply(
                    ReplyCode::ACTION_NOT_OKAY,
                    "ASCII uploads are disabled, use TYPE I.",
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        let target = client.resolve(arg);
        let mut file = match context.vfs.create_write(client.username(), &target).await {
            Ok(file) => file,
            Err(e) => {
                reply_fs_error(client, ReplyCode::FILENAME_NOT_ALLOWED, arg, &e).await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        let mut stream = match client.data.take() {
            Some(stream) => stream,
            None => {
                context.vfs.discard(&target).await;
                client
                    .control
                    .reply(
                        ReplyCode::CANT_OPEN_DATA_CONNECTION,
                        "Can't open data connection.",
                    )
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        client
            .control
            .reply(
                ReplyCode::FILE_STATUS_OKAY,
                &format!(
                    "Opening {} mode data connection for {}.",
                    client.transfer_type,
                    target.file_name().unwrap_or(arg)
                ),
            )
            .await?;

        let options = client.copy_options(Direction::Upload);
        let signal = client.control.signal().clone();
        let copied = match copy_paced(&mut stream, &mut file, Direction::Upload, &options, &signal).await {
            Ok(state) => file.flush().await.map(|_| state),
            Err(e) => Err(e),
        };
        drop(file);

        match copied {
            Ok(state) => {
                info!(
                    "{} uploaded {} ({} bytes, {:.2} KiB/s)",
                    client.username(),
                    target,
                    state.bytes(),
                    state.average_speed_kbps()
                );
                client
                    .control
                    .reply(ReplyCode::TRANSFER_COMPLETE, "Transfer complete.")
                    .await?;
                Ok(CommandOutcome::Okay)
            }
            Err(e) => {
                warn!("Upload of {} by {} failed: {}", target, client.username(), e);
                context.vfs.discard(&target).await;
                reply_aborted(client, &e).await?;
                Ok(CommandOutcome::Failed)
            }
        }
    }
}
