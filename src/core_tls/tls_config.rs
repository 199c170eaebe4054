use crate::core_tls::error::TlsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Enables `AUTH TLS` on the control channel.
    pub enabled: bool,

    /// PEM certificate chain.
    pub cert_file: PathBuf,

    /// PEM private key (PKCS#8, PKCS#1 or SEC1).
    pub key_file: PathBuf,

    /// Upper bound for one handshake, in seconds.
    pub handshake_timeout_secs: u64,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_file: PathBuf::from("etc/ssl/cert.pem"),
            key_file: PathBuf::from("etc/ssl/key.pem"),
            handshake_timeout_secs: 30,
        }
    }
}

impl TlsConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs.max(1))
    }

    /// Checks that the configured files exist when TLS is enabled.
    pub fn validate(&self) -> Result<(), TlsError> {
        if self.enabled {
            if !self.cert_file.exists() {
                return Err(TlsError::CertificateLoadError(format!(
                    "Certificate file not found: {:?}",
                    self.cert_file
                )));
            }

            if !self.key_file.exists() {
                return Err(TlsError::PrivateKeyLoadError(format!(
                    "Private key file not found: {:?}",
                    self.key_file
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_is_valid() {
        let config = TlsConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_certificate_is_rejected() {
        let config = TlsConfig {
            enabled: true,
            cert_file: PathBuf::from("/nonexistent/cert.pem"),
            ..TlsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TlsError::CertificateLoadError(_))
        ));
    }

    #[test]
    fn test_handshake_timeout_has_a_floor() {
        let config = TlsConfig {
            handshake_timeout_secs: 0,
            ..TlsConfig::default()
        };
        assert_eq!(config.handshake_timeout(), Duration::from_secs(1));
    }
}
