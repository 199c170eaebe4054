use crate::core_control::ReplyCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("Failed to load TLS certificate: {0}")]
    CertificateLoadError(String),

    #[error("Failed to load TLS private key: {0}")]
    PrivateKeyLoadError(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshakeError(String),

    #[error("TLS handshake timed out after {0}s")]
    HandshakeTimeout(u64),

    #[error("TLS configuration error: {0}")]
    TlsConfigError(String),

    #[error("TLS not configured")]
    TlsNotConfigured,
}

impl TlsError {
    /// Reply sent to a client whose TLS request could not be served.
    pub fn to_ftp_response(&self) -> (ReplyCode, &'static str) {
        match self {
            TlsError::TlsNotConfigured => (
                ReplyCode::PARAMETER_NOT_IMPLEMENTED,
                "TLS not available. Please configure TLS on the server.",
            ),
            _ => (
                ReplyCode::ACTION_ABORTED_LOCAL_ERROR,
                "Requested action aborted. Local error in processing.",
            ),
        }
    }
}
