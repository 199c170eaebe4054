use crate::constants::UNIQUE_FILENAME_LENGTH;
use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::utils::reply_fs_error;
use crate::core_vfs::FsError;
use crate::session::Client;
use async_trait::async_trait;
use log::{debug, error};
use rand::distributions::Alphanumeric;
use rand::Rng;

const MAX_NAME_ATTEMPTS: usize = 16;

/// Handles the STOU FTP command.
///
/// Picks a random name that does not exist yet in the working directory and
/// runs the registered STOR command with it.
pub struct StouCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(StouCommand)
}

pub fn unique_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UNIQUE_FILENAME_LENGTH)
        .map(char::from)
        .collect()
}

#[async_trait]
impl Command for StouCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let context = client.context.clone();

        let mut name = None;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = unique_name();
            match context.vfs.exists(&client.resolve(&candidate)).await {
                Err(FsError::NotFound) => {
                    name = Some(candidate);
                    break;
                }
                Ok(()) => debug!("STOU name {} already taken", candidate),
                Err(e) => {
                    reply_fs_error(client, ReplyCode::FILENAME_NOT_ALLOWED, &candidate, &e).await?;
                    return Ok(CommandOutcome::Failed);
                }
            }
        }
        let name = match name {
            Some(name) => name,
            None => {
                client
                    .control
                    .reply(
                        ReplyCode::FILENAME_NOT_ALLOWED,
                        "Could not generate a unique file name.",
                    )
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        let stor = match context.commands.lookup("STOR") {
            Ok(def) => def.factory,
            Err(e) => {
                error!("STOU needs STOR: {}", e);
                client
                    .control
                    .reply(
                        ReplyCode::ACTION_ABORTED_LOCAL_ERROR,
                        "Requested action aborted. Local error in processing.",
                    )
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        stor(CommandArgs::parse(&format!("STOR {}", name)))
            .execute(client)
            .await
    }
}
