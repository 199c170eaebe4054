use crate::core_control::{ControlError, ReplyCode};
use crate::core_ftpcommand::command::{Command, CommandArgs, CommandOutcome};
use crate::session::{Client, TransferType};
use async_trait::async_trait;
use log::info;

/// Handles the TYPE FTP command.
///
/// # Arguments
///
/// * `A` - ASCII transfers, line endings are converted.
/// * `I` - binary transfers, bytes are copied unchanged.
///
/// A trailing format or byte-size token (`A N`, `L 8`) is accepted for the
/// types that have one.
pub struct TypeCommand {
    args: CommandArgs,
}

pub fn create(args: CommandArgs) -> Box<dyn Command> {
    Box::new(TypeCommand { args })
}

#[async_trait]
impl Command for TypeCommand {
    async fn execute(self: Box<Self>, client: &mut Client) -> Result<CommandOutcome, ControlError> {
        let kind = self.args.param(0).unwrap_or("").to_ascii_uppercase();
        let extra = self.args.param(1).map(str::to_ascii_uppercase);

        let transfer_type = match (kind.as_str(), extra.as_deref()) {
            ("A", None) | ("A", Some("N")) => TransferType::Ascii,
            ("I", None) | ("L", Some("8")) => TransferType::Binary,
            _ => {
                client
                    .control
                    .reply(
                        ReplyCode::PARAMETER_NOT_IMPLEMENTED,
                        &format!("Type {} not implemented.", self.args.arg_str.trim()),
                    )
                    .await?;
                return Ok(CommandOutcome::Failed);
            }
        };

        info!("{} switched to {} mode", client.username(), transfer_type);
        client.transfer_type = transfer_type;
        let letter = match transfer_type {
            TransferType::Ascii => "A",
            TransferType::Binary => "I",
        };
        client
            .control
            .reply(
                ReplyCode::COMMAND_OKAY,
                &format!("Type set to {}.", letter),
            )
            .await?;
        Ok(CommandOutcome::Okay)
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{logged_in_client, read_reply};
    use crate::session::TransferType;

    #[tokio::test]
    async fn test_type_switches_mode() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "TYPE I").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "200 Type set to I.");
        assert_eq!(client.transfer_type, TransferType::Binary);

        context.commands.dispatch(&mut client, "type a").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "200 Type set to A.");
        assert_eq!(client.transfer_type, TransferType::Ascii);

        context.commands.dispatch(&mut client, "TYPE L 8").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "200 Type set to I.");
    }

    #[tokio::test]
    async fn test_unknown_type_is_refused() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = client.context.clone();

        context.commands.dispatch(&mut client, "TYPE E").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "504 Type E not implemented.");
        assert_eq!(client.transfer_type, TransferType::Ascii);

        context.commands.dispatch(&mut client, "TYPE").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "501 Syntax: TYPE <A|I>");
    }
}
