use crate::core_acl::{AclError, User};
use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::site::helper::{require_siteop, respond_with_error, respond_with_success};
use crate::session::Client;
use async_trait::async_trait;

/// SITE USER [user]
///
/// Without an argument lists every account. With one, shows that account.
/// Anyone may look at their own account; everything else needs siteop.
pub struct SiteUserCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteUserCommand { args })
}

pub fn describe_user(user: &User, masks: &[String]) -> Vec<String> {
    let flags = if user.flags.is_empty() { "-" } else { user.flags.as_str() };
    let masks = if masks.is_empty() {
        "none".to_string()
    } else {
        masks.join(" ")
    };
    vec![
        format!("Username: {}", user.name),
        format!("Flags: {}", flags),
        format!("Created: {}", user.created_string()),
        format!("IP masks: {}", masks),
    ]
}

async fn list_all_users(client: &mut Client) -> Result<CommandOutcome, ControlError> {
    let users = client.context.users.list().await;
    for user in &users {
        let line = format!("{:<16} {}", user.name, if user.is_siteop() { "siteop" } else { "" });
        client
            .control
            .part_reply(ReplyCode::COMMAND_OKAY, line.trim_end())
            .await?;
    }
    respond_with_success(client, &format!("{} user(s).", users.len())).await?;
    Ok(CommandOutcome::Okay)
}

async fn show_user_info(client: &mut Client, name: &str) -> Result<CommandOutcome, ControlError> {
    let context = client.context.clone();
    let user = match context.users.get(name).await {
        Some(user) => user,
        None => {
            respond_with_error(client, &AclError::UserNotFound(name.to_string())).await?;
            return Ok(CommandOutcome::Failed);
        }
    };
    let masks = context.ipmasks.list(name).await.unwrap_or_default();

    for line in describe_user(&user, &masks) {
        client
            .control
            .part_reply(ReplyCode::COMMAND_OKAY, &line)
            .await?;
    }
    respond_with_success(client, "Command okay.").await?;
    Ok(CommandOutcome::Okay)
}

#[async_trait]
impl Command for SiteUserCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        match self.args.param(0) {
            Some(name) if name == client.username() => show_user_info(client, name).await,
            Some(name) => {
                if !require_siteop(client).await? {
                    return Ok(CommandOutcome::Failed);
                }
                show_user_info(client, name).await
            }
            None => {
                if !require_siteop(client).await? {
                    return Ok(CommandOutcome::Failed);
                }
                list_all_users(client).await
            }
        }
    }
}
