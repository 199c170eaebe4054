use crate::core_control::reply::ReplyCode;
use crate::core_control::signal::CancelReason;
use crate::core_tls::TlsError;
use thiserror::Error;

/// Errors raised by the control channel. Apart from `Timeout` and
/// `LineTooLong` they end the session.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Invalid reply code sequence: {attempted} sent while {open} is open")]
    ProtocolSequence { open: ReplyCode, attempted: ReplyCode },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Timed out waiting for a command")]
    Timeout,

    #[error("Session cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("Client disconnected")]
    Disconnected,

    #[error("Command line longer than {0} bytes")]
    LineTooLong(usize),

    #[error(transparent)]
    Tls(#[from] TlsError),
}

impl ControlError {
    /// Whether the channel can still be used after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ControlError::Timeout | ControlError::LineTooLong(_))
    }
}
