use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::core_transfer::{copy_paced, Direction};
use crate::session::{Client, TransferType};
use async_trait::async_trait;
use log::{info, warn};
use std::io;
use tokio::io::AsyncWriteExt;

/// Handles the RETR FTP command.
///
/// Streams the file over the attached data connection, paced to the
/// effective download limit. ASCII mode converts line endings on the fly.
pub struct RetrCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(RetrCommand { args })
}

/// Replies 426 for a transfer that stopped half way.
pub async fn reply_aborted(client: &mut Client, err: &io::Error) -> Result<(), ControlError> {
    let message = if err.kind() == io::ErrorKind::Interrupted {
        "Transfer aborted."
    } else {
        "Connection closed; transfer aborted."
    };
    client
        .control
        .reply(ReplyCode::DATA_CLOSED_ABORTED, message)
        .await
}

#[async_trait]
impl Command for RetrCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let arg = self.args.arg_str.as_str();
        let context = client.context.clone();

        if client.transfer_type == TransferType::Ascii && !context.config.transfer.ascii_downloads {
            client
                .control
                .reply(
                    ReplyCode::ACTION_NOT_OKAY,
                    "ASCII downloads are disabled, use TYPE I.",
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        let target = client.resolve(arg);
        let mut file = match context.vfs.open_read(client.username(), &target).await {
            Ok(file) => file,
            Err(e) => {
                reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, arg, &e).await?;
                return Ok(CommandOutcome::Failed);
            }
        };
        let size = file.metadata().await.map(|meta| meta.len()).unwrap_or(0);

        let mut stream = match client.data.take() {
            Some(stream) => stream,
            None => {
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
                    "Opening {} mode data connection for {} ({} bytes).",
                    client.transfer_type, arg, size
                ),
            )
            .await?;

        let options = client.copy_options(Direction::Download);
        let signal = client.control.signal().clone();
        let copied = match copy_paced(&mut file, &mut stream, Direction::Download, &options, &signal).await {
            Ok(state) => stream.shutdown().await.map(|_| state),
            Err(e) => Err(e),
        };

        match copied {
            Ok(state) => {
                info!(
                    "{} downloaded {} ({} bytes, {:.2} KiB/s)",
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
                warn!("Download of {} by {} failed: {}", target, client.username(), e);
                reply_aborted(client, &e).await?;
                Ok(CommandOutcome::Failed)
            }
        }
    }
}
