use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::site::helper::{require_siteop, respond_with_success};
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// SITE KICK <user>: cancels every session of the user. Each one closes
/// with `421` at its next wait.
pub struct SiteKickCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteKickCommand { args })
}

#[async_trait]
impl Command for SiteKickCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        if !require_siteop(client).await? {
            return Ok(CommandOutcome::Failed);
        }

        let target = self.args.param(0).unwrap_or("");
        let kicked = client.context.clients.kick(target).await;
        if kicked == 0 {
            client
                .control
                .reply(
                    ReplyCode::ACTION_NOT_OKAY,
                    &format!("{} is not online.", target),
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        info!("{} kicked {} ({} sessions)", client.username(), target, kicked);
        respond_with_success(client, &format!("Kicked {} session(s) of {}.", kicked, target))
            .await?;
        Ok(CommandOutcome::Okay)
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{client_for, logged_in_client, login_as, read_reply};

    #[tokio::test]
    async fn test_kick_cancels_target_sessions() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = client.context.clone();
        let (mut victim, _victim_peer) = client_for(context.clone()).await;
        login_as(&mut victim, "bob").await;

        context.commands.dispatch(&mut client, "SITE KICK bob").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "200 Kicked 1 session(s) of bob.");
        assert!(victim.control.signal().is_cancelled());
        assert!(!client.control.signal().is_cancelled());

        context.commands.dispatch(&mut client, "SITE KICK nobody").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "550 nobody is not online.");
    }

    #[tokio::test]
    async fn test_kick_requires_siteop() {
        let (client, _peer, _dir) = logged_in_client().await;
        let context = client.context.clone();
        let (mut bob, mut bob_peer) = client_for(context.clone()).await;
        login_as(&mut bob, "bob").await;

        context.commands.dispatch(&mut bob, "SITE KICK alice").await.unwrap();
        assert_eq!(read_reply(&mut bob_peer).await, "550 Permission denied.");
        assert!(!client.control.signal().is_cancelled());
    }
}
