use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;

/// Handles the PBSZ FTP command. Streaming TLS has no buffer, so any valid
/// size is answered with `PBSZ=0`.
pub struct PbszCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(PbszCommand { args })
}

#[async_trait]
impl Command for PbszCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if !client.control.is_encrypted() {
            client
                .control
                .reply(ReplyCode::BAD_COMMAND_SEQUENCE, "PBSZ requires AUTH first.")
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        if self.args.arg_str.trim().parse::<u64>().is_err() {
            client
                .control
                .reply(ReplyCode::SYNTAX_ERROR_ARGUMENTS, "Invalid buffer size.")
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        client.data.set_pbsz(0);
        client.control.reply(ReplyCode::COMMAND_OKAY, "PBSZ=0").await?;
        Ok(CommandOutcome::Okay)
    }
}
