use crate::core_acl::wildcard_match;
use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::{Client, ClientState};
use async_trait::async_trait;
use log::{info, warn};

/// Handles the PASS FTP command.
///
/// Checks the password of the name given to USER. With ip mask checking
/// enabled the user also needs a mask matching `*@<peer address>`.
pub struct PassCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(PassCommand { args })
}

#[async_trait]
impl Command for PassCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let username = match (client.state(), client.pending_user()) {
            (ClientState::WaitingPassword, Some(name)) => name.to_string(),
            _ => {
                client
                    .control
                    .reply(ReplyCode::BAD_COMMAND_SEQUENCE, "Login with USER first.")
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        let context = client.context.clone();
        let verified = context.users.verify(&username, &self.args.arg_str).await;
        let address_ok = !context.config.server.ipmask_check
            || context
                .ipmasks
                .list(&username)
                .await
                .map(|masks| {
                    let addr = format!("*@{}", client.peer.ip());
                    masks.iter().any(|mask| wildcard_match(mask, &addr, false))
                })
                .unwrap_or(false);

        let user = match context.users.get(&username).await {
            Some(user) if verified && address_ok => user,
            _ => {
                warn!("Login failed for {} from {}", username, client.peer);
                client.fail_login();
                client
                    .control
                    .reply(ReplyCode::NOT_LOGGED_IN, "Login incorrect.")
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        if let Err(e) = context.vfs.change_dir(&user.name, &client.work_dir).await {
            warn!("Home directory unavailable for {}: {}", username, e);
            client.fail_login();
            client
                .control
                .reply(ReplyCode::NOT_LOGGED_IN, "Home directory unavailable.")
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        info!("User {} logged in from {}", username, client.peer);
        client.finish_login(user).await;
        client
            .control
            .reply(
                ReplyCode::USER_LOGGED_IN,
                &format!("User {} logged in.", username),
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{
        anonymous_client, client_for, context_with, read_reply, test_config, TEST_PASSWORD,
    };
    use crate::session::ClientState;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_login_sequence() {
        let (mut client, mut peer, _dir) = anonymous_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "USER bob").await.unwrap();
        read_reply(&mut peer).await;
        context
            .commands
            .dispatch(&mut client, &format!("PASS {}", TEST_PASSWORD))
            .await
            .unwrap();
        assert_eq!(read_reply(&mut peer).await, "230 User bob logged in.");
        assert!(client.is_logged_in());

        let who = context.clients.snapshot().await;
        assert_eq!(who[0].username.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_wrong_password_resets_login() {
        let (mut client, mut peer, _dir) = anonymous_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "USER bob").await.unwrap();
        read_reply(&mut peer).await;
        context.commands.dispatch(&mut client, "PASS nope").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "530 Login incorrect.");
        assert_eq!(client.state(), ClientState::LoggedOut);

        context.commands.dispatch(&mut client, "PASS nope").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "503 Login with USER first.");
    }

    #[tokio::test]
    async fn test_unknown_user_is_refused() {
        let (mut client, mut peer, _dir) = anonymous_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "USER mallory").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "331 Password required for mallory.");
        context
            .commands
            .dispatch(&mut client, &format!("PASS {}", TEST_PASSWORD))
            .await
            .unwrap();
        assert_eq!(read_reply(&mut peer).await, "530 Login incorrect.");
    }

    #[tokio::test]
    async fn test_ipmask_is_required_when_enabled() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.server.ipmask_check = true;
        let context = context_with(config).await;
        context.ipmasks.add("alice", "*@127.0.0.1").await.unwrap();
        let (mut client, mut peer) = client_for(context.clone()).await;

        context.commands.dispatch(&mut client, "USER bob").await.unwrap();
        read_reply(&mut peer).await;
        context
            .commands
            .dispatch(&mut client, &format!("PASS {}", TEST_PASSWORD))
            .await
            .unwrap();
        assert_eq!(read_reply(&mut peer).await, "530 Login incorrect.");

        context.commands.dispatch(&mut client, "USER alice").await.unwrap();
        read_reply(&mut peer).await;
        context
            .commands
            .dispatch(&mut client, &format!("PASS {}", TEST_PASSWORD))
            .await
            .unwrap();
        assert_eq!(read_reply(&mut peer).await, "230 User alice logged in.");
    }
}
