use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_network::ClientSummary;
use crate::session::Client;
use async_trait::async_trait;

/// SITE WHO: one line per connected session.
pub struct SiteWhoCommand;

pub fn create(_args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteWhoCommand)
}

pub fn format_who_line(summary: &ClientSummary) -> String {
    format!(
        "{:>4} {:<16} {:<22} {:>6}s {}",
        summary.id,
        summary.username.as_deref().unwrap_or("-"),
        summary.peer,
        summary.connected_for.as_secs(),
        summary.command
    )
}

#[async_trait]
impl Command for SiteWhoCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let sessions = client.context.clients.snapshot().await;

        client
            .control
            .part_reply(ReplyCode::COMMAND_OKAY, "  ID User             Address                Online Command")
            .await?;
        for summary in &sessions {
            client
                .control
                .part_reply(ReplyCode::COMMAND_OKAY, &format_who_line(summary))
                .await?;
        }
        client
            .control
            .reply(
                ReplyCode::COMMAND_OKAY,
                &format!("{} session(s) online.", sessions.len()),
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{client_for, logged_in_client, login_as, read_replies};

    #[tokio::test]
    async fn test_who_lists_sessions() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = client.context.clone();
        let (mut other, _other_peer) = client_for(context.clone()).await;
        login_as(&mut other, "bob").await;
        context.clients.set_command(other.id, "RETR big.iso").await;

        context.commands.dispatch(&mut client, "SITE WHO").await.unwrap();
        let lines = read_replies(&mut peer).await;
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("alice"));
        assert!(lines[2].contains("bob"));
        assert!(lines[2].ends_with("RETR big.iso"));
        assert_eq!(lines[3], "200 2 session(s) online.");
    }
}
