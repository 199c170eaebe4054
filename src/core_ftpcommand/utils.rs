use crate::core_control::{ControlError, ReplyCode};
use crate::core_vfs::FsError;
use crate::session::Client;
use log::warn;

/// Replies `550 <arg>: <reason>` for a filesystem failure.
pub async fn reply_fs_error(
    client: &mut Client,
    code: ReplyCode,
    arg: &str,
    err: &FsError,
) -> Result<(), ControlError> {
    warn!("{} {}: {}", client.username(), arg, err);
    client.control.reply(code, &format!("{}: {}", arg, err)).await
}

/// Quotes a path for a 257 reply, doubling embedded quotes.
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}
