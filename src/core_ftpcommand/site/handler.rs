use crate::core_control::ControlError;
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::core_ftpcommand::registry::DispatchOutcome;
use crate::session::Client;
use async_trait::async_trait;
use log::info;

/// Handles the SITE FTP command by dispatching the rest of the line through
/// the sub-command registry.
pub struct SiteCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(SiteCommand { args })
}

#[async_trait]
impl Command for SiteCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        info!("{} runs SITE {}", client.username(), self.args.param(0).unwrap_or(""));
        let context = client.context.clone();
        let outcome = context
            .site_commands
            .dispatch(client, &self.args.arg_str)
            .await?;

        // Nothing ran when the sub-command was refused, so nothing to hook.
        Ok(match outcome {
            DispatchOutcome::Executed(outcome) => outcome,
            DispatchOutcome::Unknown | DispatchOutcome::Rejected => CommandOutcome::SkipPostScript,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{logged_in_client, read_reply};

    #[tokio::test]
    async fn test_unknown_site_command() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "SITE FROBNICATE").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "500 Command not understood.");

        context.commands.dispatch(&mut client, "SITE").await.unwrap();
        assert_eq!(
            read_reply(&mut peer).await,
            "501 Syntax: SITE <command> [arguments]"
        );
    }
}
