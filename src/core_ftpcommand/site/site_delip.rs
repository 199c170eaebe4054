use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::site::helper::{require_siteop, respond_with_success};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// SITE DELIP <user> <ident@ip> [...]
pub struct SiteDelIpCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteDelIpCommand { args })
}

#[async_trait]
impl Command for SiteDelIpCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if !require_siteop(client).await? {
            return Ok(CommandOutcome::Failed);
        }

        let name = self.args.param(0).unwrap_or("");
        let context = client.context.clone();
        for mask in &self.args.args[2..] {
            let line = match context.ipmasks.delete(name, mask).await {
                Ok(()) => {
                    info!("{} removed IP mask {} from {}", client.username(), mask, name);
                    format!("Removed IP mask {}.", mask)
                }
                Err(e) => format!("{}: {}", mask, e),
            };
            client
                .control
                .part_reply(ReplyCode::COMMAND_OKAY, &line)
                .await?;
        }

        respond_with_success(client, "Command okay.").await?;
        Ok(CommandOutcome::Okay)
    }
}
