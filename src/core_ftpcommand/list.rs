use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::core_vfs::{format_long, DirEntry};
use crate::session::Client;
use async_trait::async_trait;
use chrono::Local;
use log::{info, warn};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    /// `ls -l` lines, for LIST.
    Long,
    /// Bare names, for NLST.
    NamesOnly,
}

/// Handles the LIST and NLST FTP commands.
///
/// Leading `-` options (`-la`, `-a`) are accepted and ignored. The listing
/// goes over the attached data connection, which is closed afterwards.
pub struct ListCommand {
    args: CommandArgs,
    format: ListFormat,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(ListCommand {
        args,
        format: ListFormat::Long,
    })
}

pub fn create_nlst(args: CommandArgs) -> Box<dyn Command> {
    Box::new(ListCommand {
        args,
        format: ListFormat::NamesOnly,
    })
}

/// Strips leading `ls` style options from the argument string.
pub fn strip_list_options(arg: &str) -> &str {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        rest = match rest.find(char::is_whitespace) {
            Some(pos) => rest[pos..].trim_start(),
            None => "",
        };
    }
    rest
}

pub fn render_listing(entries: &[DirEntry], format: ListFormat) -> String {
    let now = Local::now();
    let mut out = String::new();
    for entry in entries {
        match format {
            ListFormat::Long => out.push_str(&format_long(entry, now)),
            ListFormat::NamesOnly => out.push_str(&entry.name),
        }
        out.push_str("\r\n");
    }
    out
}

#[async_trait]
impl Command for ListCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let arg = strip_list_options(&self.args.arg_str);
        let target = if arg.is_empty() {
            client.work_dir.clone()
        } else {
            client.resolve(arg)
        };
        let context = client.context.clone();

        let entries = match context.vfs.list(client.username(), &target).await {
            Ok(entries) => entries,
            Err(e) => {
                let shown = if arg.is_empty() { target.as_str() } else { arg };
                reply_fs_error(client, ReplyCode::ACTION_NOT_OKAY, shown, &e).await?;
                return Ok(CommandOutcome::Failed);
            }
        };

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
                "Opening ASCII mode data connection for file list.",
            )
            .await?;

        let listing = render_listing(&entries, self.format);
        let written = async {
            stream.write_all(listing.as_bytes()).await?;
            stream.shutdown().await
        }
        .await;

        if let Err(e) = written {
            warn!("Listing of {} to {} failed: {}", target, client.peer, e);
            client
                .control
                .reply(
                    ReplyCode::DATA_CLOSED_ABORTED,
                    "Connection closed; transfer aborted.",
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        info!("Listed {} ({} entries) for {}", target, entries.len(), client.username());
        client
            .control
            .reply(ReplyCode::TRANSFER_COMPLETE, "Transfer complete.")
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
