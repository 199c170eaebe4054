use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_tls::TlsError;
use crate::session::Client;
use async_trait::async_trait;
use log::{info, warn};

/// Handles the AUTH FTP command.
///
/// Only `TLS` and its legacy alias `SSL` are understood. The `234` reply is
/// sent in plaintext, then the handshake runs on the same socket. A failed
/// handshake ends the session since the channel state is unknown.
pub struct AuthCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(AuthCommand { args })
}

#[async_trait]
impl Command for AuthCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let mechanism = self.args.arg_str.trim().to_ascii_uppercase();
        if !matches!(mechanism.as_str(), "TLS" | "TLS-C" | "SSL") {
            client
                .control
                .reply(
                    ReplyCode::PARAMETER_NOT_IMPLEMENTED,
                    &format!("AUTH {} not supported.", mechanism),
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        let context = client.context.clone();
        let tls = match context.tls.as_ref() {
            Some(tls) => tls,
            None => {
                warn!("AUTH {} requested but TLS is not configured", mechanism);
                let (code, message) = TlsError::TlsNotConfigured.to_ftp_response();
                client.control.reply(code, message).await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        if client.control.is_encrypted() {
            client
                .control
                .reply(
                    ReplyCode::BAD_COMMAND_SEQUENCE,
                    "Control channel is already encrypted.",
                )
                .await?;
            return Ok(CommandOutcome::Failed);
        }

        client
            .control
            .reply(ReplyCode::AUTH_OKAY, "AUTH TLS successful.")
            .await?;
        client.control.negotiate_tls(tls).await?;
        info!("Control channel of {} upgraded to TLS", client.peer);
        Ok(CommandOutcome::Okay)
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{anonymous_client, read_reply};

    #[tokio::test]
    async fn test_auth_without_tls_configured() {
        let (mut client, mut peer, _dir) = anonymous_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "AUTH TLS").await.unwrap();
        assert_eq!(
            read_reply(&mut peer).await,
            "504 TLS not available. Please configure TLS on the server."
        );
        assert!(!client.control.is_encrypted());
    }

    #[tokio::test]
    async fn test_unknown_mechanism() {
        let (mut client, mut peer, _dir) = anonymous_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "AUTH KERBEROS").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "504 AUTH KERBEROS not supported.");
    }
}
