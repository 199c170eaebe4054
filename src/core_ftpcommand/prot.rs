use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;

/// Handles the PROT FTP command: `C` for clear data transfers, `P` for
/// protected ones. Must follow PBSZ.
pub struct ProtCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(ProtCommand { args })
}

#[async_trait]
impl Command for ProtCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if client.data.pbsz().is_none() {
            client
                .control
                .reply(ReplyCode::BAD_COMMAND_SEQUENCE, "PROT requires PBSZ first.")
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        let level = self.args.arg_str.trim().to_ascii_uppercase();
        let protected = match level.as_str() {
            "C" => false,
            "P" => true,
            _ => {
                client
                    .control
                    .reply(
                        ReplyCode::PARAMETER_NOT_IMPLEMENTED,
                        &format!("Protection level {} not supported.", level),
                    )
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        client.data.set_protected(protected);
        client
            .control
            .reply(
                ReplyCode::COMMAND_OKAY,
                &format!("Protection level set to {}.", level),
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}
