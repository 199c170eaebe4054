use crate::constants::SERVER_NAME;
use crate::core_acl::User;
use crate::core_control::{CancellationSignal, ControlChannel, ControlError, ReplyCode};
use crate::core_network::BoxedIo;
use crate::core_transfer::{effective_speed_limit, CopyOptions, DataChannel, Direction};
use crate::core_vfs::VirtualPath;
use crate::server::ServerContext;
use log::{debug, error, info, warn};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    LoggedOut,
    WaitingPassword,
    LoggedIn,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Ascii => write!(f, "ASCII"),
            TransferType::Binary => write!(f, "BINARY"),
        }
    }
}

/// Per-connection state shared by every command of one session.
pub struct Client {
    pub id: u64,
    pub peer: SocketAddr,
    pub control: ControlChannel,
    pub data: DataChannel,
    pub context: Arc<ServerContext>,
    pub work_dir: VirtualPath,
    /// Source of a pending rename, set by RNFR.
    pub rename_from: Option<VirtualPath>,
    pub transfer_type: TransferType,
    state: ClientState,
    /// Name given to USER, kept until PASS settles it.
    pending_user: Option<String>,
    user: Option<User>,
}

impl Client {
    pub fn new(
        id: u64,
        peer: SocketAddr,
        control: ControlChannel,
        context: Arc<ServerContext>,
    ) -> Self {
        Self {
            id,
            peer,
            control,
            data: DataChannel::new(),
            context,
            work_dir: VirtualPath::root(),
            rename_from: None,
            transfer_type: TransferType::Ascii,
            state: ClientState::LoggedOut,
            pending_user: None,
            user: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == ClientState::LoggedIn
    }

    pub fn begin_login(&mut self, name: &str) {
        self.pending_user = Some(name.to_string());
        self.user = None;
        self.state = ClientState::WaitingPassword;
    }

    pub fn pending_user(&self) -> Option<&str> {
        self.pending_user.as_deref()
    }

    pub async fn finish_login(&mut self, user: User) {
        self.context.clients.set_username(self.id, &user.name).await;
        self.pending_user = None;
        self.user = Some(user);
        self.state = ClientState::LoggedIn;
    }

    pub fn fail_login(&mut self) {
        self.pending_user = None;
        self.user = None;
        self.state = ClientState::LoggedOut;
    }

    pub fn finish(&mut self) {
        self.state = ClientState::Finished;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Logged-in name, or the name awaiting its password, or empty.
    pub fn username(&self) -> &str {
        self.user
            .as_ref()
            .map(|user| user.name.as_str())
            .or(self.pending_user.as_deref())
            .unwrap_or("")
    }

    /// Re-reads the account so flag changes made by others take effect.
    pub async fn is_siteop(&self) -> bool {
        match &self.user {
            Some(user) => self.context.users.is_siteop(&user.name).await,
            None => false,
        }
    }

    pub fn resolve(&self, arg: &str) -> VirtualPath {
        self.work_dir.join(arg)
    }

    pub fn copy_options(&self, direction: Direction) -> CopyOptions {
        let transfer = &self.context.config.transfer;
        let (global, own, buffer_size) = match direction {
            Direction::Download => (
                transfer.max_download_speed,
                self.user.as_ref().map_or(0, |user| user.max_download_speed),
                transfer.download_buffer_size,
            ),
            Direction::Upload => (
                transfer.max_upload_speed,
                self.user.as_ref().map_or(0, |user| user.max_upload_speed),
                transfer.upload_buffer_size,
            ),
        };
        CopyOptions {
            ascii: self.transfer_type == TransferType::Ascii,
            max_speed_kbps: effective_speed_limit(global, own),
            min_sleep: transfer.min_sleep(),
            buffer_size,
        }
    }

    /// Runs the session until QUIT, disconnect, timeout or cancellation.
    pub async fn run(&mut self) -> Result<(), ControlError> {
        let config = &self.context.config.server;
        if config.ipmask_check {
            let addr = format!("*@{}", self.peer.ip());
            if !self.context.ipmasks.check(&addr).await {
                warn!("Refused {}: no ip mask matches", self.peer);
                self.control
                    .reply(
                        ReplyCode::SERVICE_UNAVAILABLE,
                        "Connection refused: no ip mask matches your address.",
                    )
                    .await?;
                return Ok(());
            }
        }

        if let Some(banner) = self.context.banner.as_deref() {
            self.control.part_reply(ReplyCode::SERVICE_READY, banner).await?;
        }
        self.control
            .reply(ReplyCode::SERVICE_READY, &format!("{} ready.", SERVER_NAME))
            .await?;

        let idle_timeout = self.context.config.server.idle_timeout();
        loop {
            let line = match self.control.next_command(idle_timeout).await {
                Ok(line) => line,
                Err(ControlError::Timeout) => {
                    info!("Session {} idle, closing", self.id);
                    self.close_with("Idle timeout exceeded, closing connection.")
                        .await;
                    return Ok(());
                }
                Err(ControlError::Cancelled(reason)) => {
                    info!("Session {} cancelled: {}", self.id, reason);
                    self.close_with(reason.message()).await;
                    return Ok(());
                }
                Err(ControlError::LineTooLong(max)) => {
                    self.control
                        .reply(
                            ReplyCode::SYNTAX_ERROR,
                            &format!("Command line too long (max {} bytes).", max),
                        )
                        .await?;
                    continue;
                }
                Err(ControlError::Disconnected) => {
                    info!("Session {} disconnected", self.id);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            if line.trim().is_empty() {
                continue;
            }

            self.context
                .clients
                .set_command(self.id, &loggable_command(&line))
                .await;

            let context = Arc::clone(&self.context);
            context.commands.dispatch(self, &line).await?;

            if self.state == ClientState::Finished {
                return Ok(());
            }
        }
    }

    async fn close_with(&mut self, message: &str) {
        if let Err(e) = self
            .control
            .reply(ReplyCode::SERVICE_UNAVAILABLE, message)
            .await
        {
            debug!("Could not send closing reply: {}", e);
        }
    }
}

/// The command line as shown to other users; passwords are masked.
pub fn loggable_command(line: &str) -> String {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((verb, _)) if verb.eq_ignore_ascii_case("PASS") => format!("{} ********", verb),
        _ => line.to_string(),
    }
}

/// Serves one accepted connection from greeting to close.
pub async fn handle_session(context: Arc<ServerContext>, stream: BoxedIo, peer: SocketAddr) {
    let signal = CancellationSignal::new();
    let id = context.clients.register(peer, signal.clone()).await;
    info!("Session {} opened from {}", id, peer);

    let mut control = ControlChannel::new(stream, signal);
    control.set_single_line_replies(context.config.server.single_line_replies);
    let mut client = Client::new(id, peer, control, Arc::clone(&context));

    if let Err(e) = client.run().await {
        error!("Session {} from {} failed: {}", id, peer, e);
    }

    client.control.close().await;
    context.clients.unregister(id).await;
    info!(
        "Session {} closed ({} bytes in, {} bytes out)",
        id,
        client.control.bytes_read(),
        client.control.bytes_written()
    );
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};

    pub const TEST_PASSWORD: &str = "secret";

    pub fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.chroot_dir = dir.path().to_string_lossy().into_owned();
        config.server.min_homedir = "/site".to_string();
        config.server.data_dir = dir.path().join("data").to_string_lossy().into_owned();
        config.server.bcrypt_cost = 4;
        config.server.idle_timeout_secs = 5;
        config
    }

    pub async fn context_with(config: Config) -> Arc<ServerContext> {
        std::fs::create_dir_all(
            std::path::Path::new(&config.server.chroot_dir).join("site"),
        )
        .unwrap();
        let context = ServerContext::build(config).await.unwrap();
        context
            .users
            .create("alice", TEST_PASSWORD, "1")
            .await
            .unwrap();
        context.users.create("bob", TEST_PASSWORD, "").await.unwrap();
        context
    }

    pub async fn client_for(context: Arc<ServerContext>) -> (Client, DuplexStream) {
        let (server_io, peer) = duplex(64 * 1024);
        let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let signal = CancellationSignal::new();
        let id = context.clients.register(addr, signal.clone()).await;
        let control = ControlChannel::new(Box::new(server_io), signal);
        (Client::new(id, addr, control, context), peer)
    }

    pub async fn anonymous_client() -> (Client, DuplexStream, TempDir) {
        let dir = TempDir::new().unwrap();
        let context = context_with(test_config(&dir)).await;
        let (client, peer) = client_for(context).await;
        (client, peer, dir)
    }

    /// A session already logged in as the siteop `alice`.
    pub async fn logged_in_client() -> (Client, DuplexStream, TempDir) {
        let (mut client, peer, dir) = anonymous_client().await;
        login_as(&mut client, "alice").await;
        (client, peer, dir)
    }

    pub async fn login_as(client: &mut Client, name: &str) {
        let user = client.context.users.get(name).await.unwrap();
        client.finish_login(user).await;
    }

    /// Hook for `verb` whose script appends `verb|arg|user` to `log`.
    #[cfg(unix)]
    pub fn recording_hook(
        dir: &TempDir,
        verb: &str,
        log: &std::path::Path,
    ) -> crate::config::PostHookConfig {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.path().join(format!("hook-{}.sh", verb.replace(' ', "_")));
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$1|$2|$3\" >> '{}'\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        crate::config::PostHookConfig {
            verb: verb.to_string(),
            command: script.to_string_lossy().into_owned(),
            timeout_secs: 5,
        }
    }

    /// Lines written by `recording_hook` scripts so far.
    pub fn hook_runs(log: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// One reply line without its terminator.
    pub async fn read_reply(peer: &mut DuplexStream) -> String {
        let mut line = Vec::new();
        loop {
            let byte = peer.read_u8().await.unwrap();
            if byte == b'\n' {
                break;
            }
            line.push(byte);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8(line).unwrap()
    }

    /// Lines up to and including the closing `ccc ` line.
    pub async fn read_replies(peer: &mut DuplexStream) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = read_reply(peer).await;
            let closing = line.len() >= 4
                && line.as_bytes()[..3].iter().all(u8::is_ascii_digit)
                && line.as_bytes()[3] == b' ';
            lines.push(line);
            if closing {
                return lines;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::core_control::CancelReason;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_client_can_be_shared_across_awaits() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Client>();
        assert_sync::<BoxedIo>();
    }

    #[test]
    fn test_password_is_masked() {
        assert_eq!(loggable_command("PASS hunter2"), "PASS ********");
        assert_eq!(loggable_command("pass x y"), "pass ********");
        assert_eq!(loggable_command("RETR file"), "RETR file");
    }

    #[tokio::test]
    async fn test_session_greets_and_quits() {
        let (mut client, mut peer, _dir) = anonymous_client().await;
        let session = tokio::spawn(async move {
            client.run().await.unwrap();
            client
        });

        assert_eq!(read_reply(&mut peer).await, "220 oxftpd ready.");
        peer.write_all(b"NOOP\r\n").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "530 Please login with USER and PASS.");
        peer.write_all(b"\r\nQUIT\r\n").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "221 Goodbye.");

        let client = session.await.unwrap();
        assert_eq!(client.state(), ClientState::Finished);
    }

    #[tokio::test]
    async fn test_banner_is_sent_as_continuation_lines() {
        let dir = TempDir::new().unwrap();
        let banner = dir.path().join("banner.txt");
        std::fs::write(&banner, "Welcome\nto the site\n").unwrap();
        let mut config = test_config(&dir);
        config.server.banner_file = Some(banner.to_string_lossy().into_owned());
        let context = context_with(config).await;
        let (mut client, mut peer) = client_for(context).await;
        tokio::spawn(async move { client.run().await });

        assert_eq!(
            read_replies(&mut peer).await,
            vec!["220-Welcome", "220-to the site", "220 oxftpd ready."]
        );
    }

    #[tokio::test]
    async fn test_kick_closes_session_with_421() {
        let (mut client, mut peer, _dir) = logged_in_client().await;
        let context = Arc::clone(&client.context);
        let session = tokio::spawn(async move { client.run().await });

        assert_eq!(read_reply(&mut peer).await, "220 oxftpd ready.");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(context.clients.kick("alice").await, 1);

        assert_eq!(
            read_reply(&mut peer).await,
            "421 You have been kicked off the server."
        );
        session.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_session_with_421() {
        let (mut client, mut peer, _dir) = anonymous_client().await;
        let context = Arc::clone(&client.context);
        let session = tokio::spawn(async move { client.run().await });

        assert_eq!(read_reply(&mut peer).await, "220 oxftpd ready.");
        context.clients.cancel_all(CancelReason::Shutdown).await;
        assert_eq!(read_reply(&mut peer).await, "421 Server is shutting down.");
        session.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_idle_timeout_closes_session() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.server.idle_timeout_secs = 1;
        let context = context_with(config).await;
        let (mut client, mut peer) = client_for(context).await;
        tokio::spawn(async move { client.run().await });

        assert_eq!(read_reply(&mut peer).await, "220 oxftpd ready.");
        assert_eq!(
            read_reply(&mut peer).await,
            "421 Idle timeout exceeded, closing connection."
        );
    }

    #[tokio::test]
    async fn test_ipmask_gate_refuses_unknown_address() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.server.ipmask_check = true;
        let context = context_with(config).await;
        let (mut client, mut peer) = client_for(Arc::clone(&context)).await;
        client.run().await.unwrap();
        assert_eq!(
            read_reply(&mut peer).await,
            "421 Connection refused: no ip mask matches your address."
        );

        context.ipmasks.add("alice", "*@127.0.0.1").await.unwrap();
        let (mut client, mut peer) = client_for(context).await;
        tokio::spawn(async move { client.run().await });
        assert_eq!(read_reply(&mut peer).await, "220 oxftpd ready.");
    }

    #[tokio::test]
    async fn test_handle_session_unregisters() {
        let dir = TempDir::new().unwrap();
        let context = context_with(test_config(&dir)).await;
        let (server_io, mut peer) = tokio::io::duplex(4096);
        let addr: SocketAddr = "127.0.0.1:50001".parse().unwrap();

        let task = tokio::spawn(handle_session(
            Arc::clone(&context),
            Box::new(server_io),
            addr,
        ));
        assert_eq!(read_reply(&mut peer).await, "220 oxftpd ready.");
        assert_eq!(context.clients.len().await, 1);
        peer.write_all(b"QUIT\r\n").await.unwrap();
        assert_eq!(read_reply(&mut peer).await, "221 Goodbye.");
        task.await.unwrap();
        assert!(context.clients.is_empty().await);
    }
}
