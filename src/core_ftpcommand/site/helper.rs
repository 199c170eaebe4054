use crate::core_acl::AclError;
use crate::core_control::{ControlError, ReplyCode};
use crate::session::Client;
use log::warn;

/// Answers `550 Permission denied.` unless the user carries the siteop flag.
pub async fn require_siteop(client: &mut Client) -> Result<bool, ControlError> {
    if client.is_siteop().await {
        return Ok(true);
    }
    warn!("{} is not allowed to run SITE user management", client.username());
    client
        .control
        .reply(ReplyCode::ACTION_NOT_OKAY, "Permission denied.")
        .await?;
    Ok(false)
}

pub async fn respond_with_error(client: &mut Client, err: &AclError) -> Result<(), ControlError> {
    client
        .control
        .reply(ReplyCode::ACTION_NOT_OKAY, &err.to_string())
        .await
}

pub async fn respond_with_success(client: &mut Client, message: &str) -> Result<(), ControlError> {
    client.control.reply(ReplyCode::COMMAND_OKAY, message).await
}
