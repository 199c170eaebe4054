use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::site::helper::{require_siteop, respond_with_error, respond_with_success};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// SITE ADDUSER <user> <password> [ident@ip ...]
///
/// Creates an account without flags, then adds any masks given. A mask that
/// cannot be added is reported but does not undo the account.
pub struct SiteAddUserCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteAddUserCommand { args })
}

#[async_trait]
impl Command for SiteAddUserCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if !require_siteop(client).await? {
            return Ok(CommandOutcome::Failed);
        }

        let (name, password) = match (self.args.param(0), self.args.param(1)) {
            (Some(name), Some(password)) => (name, password),
            _ => return Ok(CommandOutcome::Failed),
        };
        let context = client.context.clone();

        if let Err(e) = context.users.create(name, password, "").await {
            respond_with_error(client, &e).await?;
            return Ok(CommandOutcome::Failed);
        }
        info!("{} added user {}", client.username(), name);

        for mask in self.args.args.iter().skip(3) {
            let line = match context.ipmasks.add(name, mask).await {
                Ok(_) => format!("Added IP mask {}.", mask),
                Err(e) => format!("{}: {}", mask, e),
            };
            client
                .control
                .part_reply(ReplyCode::COMMAND_OKAY, &line)
                .await?;
        }

        respond_with_success(client, &format!("User {} added.", name)).await?;
        Ok(CommandOutcome::Okay)
    }
}
