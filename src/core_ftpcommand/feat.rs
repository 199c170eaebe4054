use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::Client;
use async_trait::async_trait;

/// Extensions advertised by FEAT, one per line.
const FEATURES: &[&str] = &["SIZE", "MDTM", "UTF8"];
const TLS_FEATURES: &[&str] = &["AUTH TLS", "PBSZ", "PROT"];

pub struct FeatCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(FeatCommand)
}

#[async_trait]
impl Command for FeatCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let tls = client.context.tls.is_some();
        client
            .control
            .part_reply(ReplyCode::SYSTEM_STATUS, "Features:")
            .await?;
        let extra = if tls { TLS_FEATURES } else { &[] };
        for feature in extra.iter().chain(FEATURES) {
            client
                .control
                .part_reply(ReplyCode::NO_CODE, &format!(" {}", feature))
                .await?;
        }
        client.control.reply(ReplyCode::SYSTEM_STATUS, "End").await?;
        Ok(CommandOutcome::Okay)
    }
}
