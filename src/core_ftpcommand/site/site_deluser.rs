use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::site::helper::{require_siteop, respond_with_error, respond_with_success};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// SITE DELUSER <user>: removes the account and its masks and kicks any
/// session still using it.
pub struct SiteDelUserCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteDelUserCommand { args })
}

#[async_trait]
impl Command for SiteDelUserCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if !require_siteop(client).await? {
            return Ok(CommandOutcome::Failed);
        }

        let name = self.args.param(0).unwrap_or("");
        if name == client.username() {
            client
                .control
                .reply(ReplyCode::ACTION_NOT_OKAY, "You cannot delete yourself.")
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        let context = client.context.clone();
        if let Err(e) = context.users.delete(name).await {
            respond_with_error(client, &e).await?;
            return Ok(CommandOutcome::Failed);
        }
        context.ipmasks.delete_user(name).await;
        let kicked = context.clients.kick(name).await;

        info!("{} deleted user {} ({} sessions kicked)", client.username(), name, kicked);
        respond_with_success(client, &format!("User {} deleted.", name)).await?;
        Ok(CommandOutcome::Okay)
    }
}
