use crate::constants::MAX_ADDIP_IPS;
use crate::core_acl::AclError;
use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::site::helper::{require_siteop, respond_with_error, respond_with_success};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// SITE ADDIP <user> <ident@ip> [...]
///
/// Each mask is reported on its own line. Narrower masks replaced by a new
/// one are listed as removed.
pub struct SiteAddIpCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteAddIpCommand { args })
}

#[async_trait]
impl Command for SiteAddIpCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if !require_siteop(client).await? {
            return Ok(CommandOutcome::Failed);
        }

        let name = self.args.param(0).unwrap_or("");
        let masks = &self.args.args[2..];
        if masks.len() > MAX_ADDIP_IPS {
            client
                .control
                .reply(
                    ReplyCode::SYNTAX_ERROR_ARGUMENTS,
                    &format!("Too many IP masks, max {} allowed.", MAX_ADDIP_IPS),
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        let context = client.context.clone();
        if !context.users.exists(name).await {
            respond_with_error(client, &AclError::UserNotFound(name.to_string())).await?;
            return Ok(CommandOutcome::Failed);
        }

        for mask in masks {
            match context.ipmasks.add(name, mask).await {
                Ok(removed) => {
                    info!("{} added IP mask {} to {}", client.username(), mask, name);
                    client
                        .control
                        .part_reply(ReplyCode::COMMAND_OKAY, &format!("Added IP mask {}.", mask))
                        .await?;
                    for old in removed {
                        client
                            .control
                            .part_reply(
                                ReplyCode::COMMAND_OKAY,
                                &format!("Removed narrower IP mask {}.", old),
                            )
                            .await?;
                    }
                }
                Err(e) => {
                    client
                        .control
                        .part_reply(ReplyCode::COMMAND_OKAY, &format!("{}: {}", mask, e))
                        .await?;
                }
            }
        }

        respond_with_success(client, "Command okay.").await?;
        Ok(CommandOutcome::Okay)
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{logged_in_client, read_replies, read_reply};

    #[tokio::test]
    async fn test_addip_broader_and_narrower() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = client.context.clone();

        context
            .commands
            .dispatch(&mut client, "SITE ADDIP bob *@10.0.0.1 *@10.0.0.2")
            .await
            .unwrap();
        assert_eq!(
            read_replies(&mut peer).await,
            vec![
                "200-Added IP mask *@10.0.0.1.",
                "200-Added IP mask *@10.0.0.2.",
                "200 Command okay.",
            ]
        );

        context
            .commands
            .dispatch(&mut client, "SITE ADDIP bob *@10.0.0.*")
            .await
            .unwrap();
        assert_eq!(
            read_replies(&mut peer).await,
            vec![
                "200-Added IP mask *@10.0.0.*.",
                "200-Removed narrower IP mask *@10.0.0.1.",
                "200-Removed narrower IP mask *@10.0.0.2.",
                "200 Command okay.",
            ]
        );

        context
            .commands
            .dispatch(&mut client, "SITE ADDIP bob *@10.0.0.9")
            .await
            .unwrap();
        assert_eq!(
            read_replies(&mut peer).await,
            vec!["200-*@10.0.0.9: Broader IP mask exists.", "200 Command okay."]
        );
        assert_eq!(context.ipmasks.list("bob").await.unwrap(), vec!["*@10.0.0.*"]);
    }

    #[tokio::test]
    async fn test_addip_limits() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = client.context.clone();

        let many: Vec<String> = (0..11).map(|i| format!("*@10.0.1.{}", i)).collect();
        context
            .commands
            .dispatch(&mut client, &format!("SITE ADDIP bob {}", many.join(" ")))
            .await
            .unwrap();
        assert_eq!(
            read_reply(&mut peer).await,
            "501 Too many IP masks, max 10 allowed."
        );

        context
            .commands
            .dispatch(&mut client, "SITE ADDIP ghost *@1.1.1.1")
            .await
            .unwrap();
        assert_eq!(read_reply(&mut peer).await, "550 User not found: ghost");
    }
}
