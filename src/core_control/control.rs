use crate::constants::{CONTROL_READ_CHUNK, MAX_COMMAND_LENGTH, TELNET_STRIP_THRESHOLD};
use crate::core_control::error::ControlError;
use crate::core_control::reply::{format_reply_line, split_message, ReplyCode};
use crate::core_control::signal::CancellationSignal;
use crate::core_network::BoxedIo;
use crate::core_tls::TlsConnection;
use log::{debug, trace};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;

/// The control connection of one session: reply framing on the way out,
/// cancellable line reads on the way in.
pub struct ControlChannel {
    stream: Option<BoxedIo>,
    signal: CancellationSignal,
    single_line_replies: bool,
    /// Code of the multi-line reply still open, if any.
    last_code: Option<ReplyCode>,
    /// Bytes received but not yet returned as a command line.
    pending: Vec<u8>,
    /// Set after an over-long line until its terminator has been skipped.
    discarding: bool,
    encrypted: bool,
    bytes_read: u64,
    bytes_written: u64,
    final_replies: u64,
}

impl ControlChannel {
    pub fn new(stream: BoxedIo, signal: CancellationSignal) -> Self {
        Self {
            stream: Some(stream),
            signal,
            single_line_replies: false,
            last_code: None,
            pending: Vec::new(),
            discarding: false,
            encrypted: false,
            bytes_read: 0,
            bytes_written: 0,
            final_replies: 0,
        }
    }

    /// Compatibility mode for clients that choke on multi-line replies:
    /// continuation lines are dropped.
    pub fn set_single_line_replies(&mut self, enabled: bool) {
        self.single_line_replies = enabled;
    }

    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn open_sequence(&self) -> Option<ReplyCode> {
        self.last_code
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of closing, non-preliminary replies sent so far.
    pub fn final_replies(&self) -> u64 {
        self.final_replies
    }

    pub async fn send_reply(
        &mut self,
        code: ReplyCode,
        partial: bool,
        message: &str,
    ) -> Result<(), ControlError> {
        if self.single_line_replies && partial {
            return Ok(());
        }

        if let Some(open) = self.last_code {
            if open != code && !code.is_no_code() {
                return Err(ControlError::ProtocolSequence {
                    open,
                    attempted: code,
                });
            }
        }

        let line = format_reply_line(code, partial, message);
        self.write(line.as_bytes()).await?;
        debug!("{}", line.trim_end());

        if !code.is_no_code() {
            if partial {
                self.last_code = Some(code);
            } else {
                self.last_code = None;
                if !code.is_preliminary() {
                    self.final_replies += 1;
                }
            }
        }
        Ok(())
    }

    /// Sends every line of `message` as a continuation line.
    pub async fn part_reply(&mut self, code: ReplyCode, message: &str) -> Result<(), ControlError> {
        for line in split_message(message) {
            self.send_reply(code, true, line).await?;
        }
        Ok(())
    }

    /// Sends `message` and closes the sequence on its last line.
    pub async fn reply(&mut self, code: ReplyCode, message: &str) -> Result<(), ControlError> {
        let lines = split_message(message);
        let (last, leading) = match lines.split_last() {
            Some(split) => split,
            None => (&"", &[][..]),
        };
        for line in leading {
            self.send_reply(code, true, line).await?;
        }
        self.send_reply(code, false, last).await?;
        self.last_code = None;
        Ok(())
    }

    /// Upgrades the channel to TLS in place. Framing is unchanged afterwards.
    pub async fn negotiate_tls(&mut self, tls: &TlsConnection) -> Result<(), ControlError> {
        if self.encrypted {
            return Err(ControlError::ProtocolViolation(
                "control channel is already encrypted".to_string(),
            ));
        }
        if !self.pending.is_empty() {
            return Err(ControlError::ProtocolViolation(
                "plaintext data received before TLS handshake".to_string(),
            ));
        }

        let stream = self.stream.take().ok_or(ControlError::Disconnected)?;
        let tls_stream = tls.accept(stream).await?;
        self.stream = Some(Box::new(tls_stream));
        self.encrypted = true;
        Ok(())
    }

    /// Waits for the next command line.
    ///
    /// The socket read, the cancellation signal and the optional deadline are
    /// awaited together. A wakeup without a pending cancellation just resumes
    /// the wait. Partially received lines survive a timeout.
    pub async fn next_command(&mut self, timeout: Option<Duration>) -> Result<String, ControlError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        loop {
            if let Some(line) = self.take_line()? {
                debug!("{}", line);
                return Ok(line);
            }

            let stream = self.stream.as_mut().ok_or(ControlError::Disconnected)?;
            let mut chunk = [0u8; CONTROL_READ_CHUNK];

            tokio::select! {
                read = stream.read(&mut chunk) => {
                    let n = read?;
                    if n == 0 {
                        return Err(ControlError::Disconnected);
                    }
                    self.bytes_read += n as u64;
                    self.pending.extend_from_slice(&chunk[..n]);
                }
                _ = self.signal.wait() => {
                    self.signal.checkpoint().map_err(ControlError::Cancelled)?;
                    trace!("Control channel woken without cancellation");
                }
                _ = sleep_until(deadline) => {
                    return Err(ControlError::Timeout);
                }
            }
        }
    }

    /// Flushes and shuts down the underlying stream.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                trace!("Control stream shutdown failed: {}", e);
            }
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), ControlError> {
        let stream = self.stream.as_mut().ok_or(ControlError::Disconnected)?;
        stream.write_all(bytes).await?;
        stream.flush().await?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn take_line(&mut self) -> Result<Option<String>, ControlError> {
        loop {
            match self.pending.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    let raw: Vec<u8> = self.pending.drain(..=pos).collect();
                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }
                    if raw.len() > MAX_COMMAND_LENGTH {
                        return Err(ControlError::LineTooLong(MAX_COMMAND_LENGTH));
                    }
                    return Ok(Some(decode_command_line(&raw)));
                }
                None => {
                    if self.pending.len() > MAX_COMMAND_LENGTH {
                        self.pending.clear();
                        if !self.discarding {
                            self.discarding = true;
                            return Err(ControlError::LineTooLong(MAX_COMMAND_LENGTH));
                        }
                    }
                    return Ok(None);
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Removes trailing `\n` then trailing `\r` bytes.
pub fn trim_line_terminator(raw: &[u8]) -> &[u8] {
    let mut end = raw.len();
    while end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    while end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    &raw[..end]
}

/// Drops leading bytes above the telnet threshold (IAC and option codes).
///
/// This is a byte-value cutoff, not a telnet option parser: an option byte at
/// or below the threshold that follows IAC is kept.
pub fn strip_telnet_chars(raw: &[u8]) -> &[u8] {
    let start = raw
        .iter()
        .position(|&b| b <= TELNET_STRIP_THRESHOLD)
        .unwrap_or(raw.len());
    &raw[start..]
}

pub fn decode_command_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(strip_telnet_chars(trim_line_terminator(raw))).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_control::signal::CancelReason;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

    fn channel() -> (ControlChannel, DuplexStream) {
        let (client, server) = duplex(8192);
        (
            ControlChannel::new(Box::new(server), CancellationSignal::new()),
            client,
        )
    }

    async fn read_exactly(client: &mut DuplexStream, expected: &str) -> String {
        let mut buf = vec![0u8; expected.len()];
        client.read_exact(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_part_reply_then_reply() {
        let (mut control, mut client) = channel();
        control.part_reply(ReplyCode::SERVICE_READY, "hello").await.unwrap();
        assert_eq!(control.open_sequence(), Some(ReplyCode::SERVICE_READY));
        control.reply(ReplyCode::SERVICE_READY, "ready").await.unwrap();
        assert_eq!(control.open_sequence(), None);

        let expected = "220-hello\r\n220 ready\r\n";
        assert_eq!(read_exactly(&mut client, expected).await, expected);
        assert_eq!(control.final_replies(), 1);
    }

    #[tokio::test]
    async fn test_reply_splits_embedded_lines() {
        let (mut control, mut client) = channel();
        control
            .reply(ReplyCode::COMMAND_OKAY, "one\ntwo\r\nthree")
            .await
            .unwrap();
        let expected = "200-one\r\n200-two\r\n200 three\r\n";
        assert_eq!(read_exactly(&mut client, expected).await, expected);
    }

    #[tokio::test]
    async fn test_mismatched_code_is_a_protocol_error() {
        let (mut control, mut client) = channel();
        control.part_reply(ReplyCode::COMMAND_OKAY, "first").await.unwrap();

        let err = control
            .reply(ReplyCode::ACTION_NOT_OKAY, "second")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ControlError::ProtocolSequence { open, attempted }
                if open == ReplyCode::COMMAND_OKAY && attempted == ReplyCode::ACTION_NOT_OKAY
        ));
        assert!(!err.is_recoverable());

        let err = control
            .part_reply(ReplyCode::ACTION_NOT_OKAY, "third")
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::ProtocolSequence { .. }));

        // Nothing of the rejected lines reached the wire.
        drop(control);
        let mut rest = String::new();
        client.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "200-first\r\n");
    }

    #[tokio::test]
    async fn test_no_code_lines_inside_a_sequence() {
        let (mut control, mut client) = channel();
        control.part_reply(ReplyCode::COMMAND_OKAY, "head").await.unwrap();
        control.send_reply(ReplyCode::NO_CODE, false, "raw line").await.unwrap();
        assert_eq!(control.open_sequence(), Some(ReplyCode::COMMAND_OKAY));
        control.reply(ReplyCode::COMMAND_OKAY, "done").await.unwrap();

        let expected = "200-head\r\nraw line\r\n200 done\r\n";
        assert_eq!(read_exactly(&mut client, expected).await, expected);
    }

    #[tokio::test]
    async fn test_single_line_mode_drops_continuations() {
        let (mut control, mut client) = channel();
        control.set_single_line_replies(true);
        control.part_reply(ReplyCode::SERVICE_READY, "banner").await.unwrap();
        control
            .reply(ReplyCode::SERVICE_READY, "more\nready")
            .await
            .unwrap();

        let expected = "220 ready\r\n";
        assert_eq!(read_exactly(&mut client, expected).await, expected);
    }

    #[tokio::test]
    async fn test_next_command_strips_terminators() {
        let (mut control, mut client) = channel();
        client.write_all(b"USER bob\r\n").await.unwrap();
        let line = control.next_command(None).await.unwrap();
        assert_eq!(line, "USER bob");
        assert_eq!(control.bytes_read(), 10);
    }

    #[tokio::test]
    async fn test_next_command_returns_pipelined_lines_in_order() {
        let (mut control, mut client) = channel();
        client.write_all(b"USER bob\nPASS secret\r\n").await.unwrap();
        assert_eq!(control.next_command(None).await.unwrap(), "USER bob");
        assert_eq!(control.next_command(None).await.unwrap(), "PASS secret");
    }

    #[tokio::test]
    async fn test_telnet_prefix_is_stripped() {
        let (mut control, mut client) = channel();
        client.write_all(b"\xff\xf4\xff\xf2ABOR\r\n").await.unwrap();
        assert_eq!(control.next_command(None).await.unwrap(), "ABOR");
    }

    #[test]
    fn test_telnet_cutoff_keeps_low_option_bytes() {
        // IAC DO TIMING-MARK: the option byte 6 is below the cutoff and stays.
        assert_eq!(strip_telnet_chars(b"\xff\xfd\x06ABOR"), b"\x06ABOR");
        // 240 itself is not stripped.
        assert_eq!(strip_telnet_chars(b"\xf0NOOP"), b"\xf0NOOP");
        assert_eq!(strip_telnet_chars(b"\xff\xff"), b"");
    }

    #[test]
    fn test_trim_line_terminator() {
        assert_eq!(trim_line_terminator(b"NOOP\r\n"), b"NOOP");
        assert_eq!(trim_line_terminator(b"NOOP\n"), b"NOOP");
        assert_eq!(trim_line_terminator(b"NOOP\r\r\n\n"), b"NOOP");
        assert_eq!(trim_line_terminator(b"\r\n"), b"");
    }

    #[tokio::test]
    async fn test_timeout_keeps_channel_usable() {
        let (mut control, mut client) = channel();
        client.write_all(b"US").await.unwrap();

        let err = control
            .next_command(Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Timeout));
        assert!(err.is_recoverable());

        client.write_all(b"ER alice\r\n").await.unwrap();
        let line = control
            .next_command(Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(line, "USER alice");
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_blocked_read() {
        let (mut control, mut client) = channel();
        let signal = control.signal().clone();

        let (result, _) = tokio::join!(control.next_command(None), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signal.cancel(CancelReason::Kicked);
        });
        assert!(matches!(
            result,
            Err(ControlError::Cancelled(CancelReason::Kicked))
        ));

        client.write_all(b"NOOP\r\n").await.unwrap();
        let line = control
            .next_command(Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(line, "NOOP");
    }

    #[tokio::test]
    async fn test_wake_without_cancel_keeps_waiting() {
        let (mut control, mut client) = channel();
        let signal = control.signal().clone();

        let (result, _) = tokio::join!(control.next_command(Some(Duration::from_secs(2))), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signal.wake();
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.write_all(b"PWD\r\n").await.unwrap();
        });
        assert_eq!(result.unwrap(), "PWD");
    }

    #[tokio::test]
    async fn test_cancel_before_wait_is_observed() {
        let (mut control, _client) = channel();
        control.signal().cancel(CancelReason::Shutdown);
        let result = control.next_command(Some(Duration::from_secs(1))).await;
        assert!(matches!(
            result,
            Err(ControlError::Cancelled(CancelReason::Shutdown))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_is_reported() {
        let (mut control, client) = channel();
        drop(client);
        let result = control.next_command(None).await;
        assert!(matches!(result, Err(ControlError::Disconnected)));
    }

    #[tokio::test]
    async fn test_over_long_line_is_discarded() {
        let (mut control, mut client) = channel();
        let long = vec![b'A'; MAX_COMMAND_LENGTH + 100];
        client.write_all(&long).await.unwrap();
        client.write_all(b"AAAA\r\nNOOP\r\n").await.unwrap();

        let err = control
            .next_command(Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::LineTooLong(_)));
        let line = control
            .next_command(Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(line, "NOOP");
    }

    #[tokio::test]
    async fn test_tls_upgrade_keeps_framing() {
        use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName};
        use std::sync::Arc;

        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let cert_der = CertificateDer::from(cert.serialize_der().unwrap());
        let key_der =
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.serialize_private_key_der()));
        let tls =
            TlsConnection::from_der(vec![cert_der.clone()], key_der, Duration::from_secs(5))
                .unwrap();

        let mut roots = rustls::RootCertStore::empty();
        roots.add(cert_der).unwrap();
        let client_config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let connector = tokio_rustls::TlsConnector::from(Arc::new(client_config));

        let (client_io, server_io) = duplex(16 * 1024);
        let mut control = ControlChannel::new(Box::new(server_io), CancellationSignal::new());
        let server_name = ServerName::try_from("localhost").unwrap();

        let (server_result, client_result) = tokio::join!(
            control.negotiate_tls(&tls),
            connector.connect(server_name, client_io)
        );
        server_result.unwrap();
        let mut client = client_result.unwrap();
        assert!(control.is_encrypted());

        client.write_all(b"PBSZ 0\r\n").await.unwrap();
        client.flush().await.unwrap();
        let line = control
            .next_command(Some(Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(line, "PBSZ 0");

        control
            .reply(ReplyCode::COMMAND_OKAY, "PBSZ 0 successful.")
            .await
            .unwrap();
        let expected = "200 PBSZ 0 successful.\r\n";
        let mut buf = vec![0u8; expected.len()];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), expected);
    }
}
