use crate::core_tls::error::TlsError;
use crate::core_tls::tls_config::TlsConfig;
use log::debug;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// Server-side TLS acceptor shared by every session.
#[derive(Clone)]
pub struct TlsConnection {
    acceptor: TlsAcceptor,
    handshake_timeout: Duration,
}

impl TlsConnection {
    pub fn from_config(config: &TlsConfig) -> Result<Self, TlsError> {
        if !config.enabled {
            return Err(TlsError::TlsNotConfigured);
        }
        config.validate()?;
        Self::from_pem_files(
            &config.cert_file,
            &config.key_file,
            config.handshake_timeout(),
        )
    }

    pub fn from_pem_files(
        cert_file: &Path,
        key_file: &Path,
        handshake_timeout: Duration,
    ) -> Result<Self, TlsError> {
        let cert_pem = std::fs::read(cert_file)
            .map_err(|e| TlsError::CertificateLoadError(e.to_string()))?;
        let key_pem =
            std::fs::read(key_file).map_err(|e| TlsError::PrivateKeyLoadError(e.to_string()))?;

        let cert_chain = rustls_pemfile::certs(&mut &cert_pem[..])
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TlsError::CertificateLoadError(e.to_string()))?;
        if cert_chain.is_empty() {
            return Err(TlsError::CertificateLoadError(format!(
                "No certificate found in {:?}",
                cert_file
            )));
        }

        let private_key = rustls_pemfile::private_key(&mut &key_pem[..])
            .map_err(|e| TlsError::PrivateKeyLoadError(e.to_string()))?
            .ok_or_else(|| TlsError::PrivateKeyLoadError("No private key found".to_string()))?;

        Self::from_der(cert_chain, private_key, handshake_timeout)
    }

    pub fn from_der(
        cert_chain: Vec<CertificateDer<'static>>,
        private_key: PrivateKeyDer<'static>,
        handshake_timeout: Duration,
    ) -> Result<Self, TlsError> {
        let config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)
            .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;

        Ok(Self {
            acceptor: TlsAcceptor::from(Arc::new(config)),
            handshake_timeout,
        })
    }

    /// Runs the server side of the handshake over `stream`.
    pub async fn accept<IO>(&self, stream: IO) -> Result<TlsStream<IO>, TlsError>
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        match tokio::time::timeout(self.handshake_timeout, self.acceptor.accept(stream)).await {
            Ok(Ok(tls_stream)) => {
                debug!("TLS handshake completed");
                Ok(tls_stream)
            }
            Ok(Err(e)) => Err(TlsError::TlsHandshakeError(e.to_string())),
            Err(_) => Err(TlsError::HandshakeTimeout(self.handshake_timeout.as_secs())),
        }
    }
}
