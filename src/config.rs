use crate::constants::{DEFAULT_DOWNLOAD_BUFFER_SIZE, DEFAULT_UPLOAD_BUFFER_SIZE};
use crate::core_tls::TlsConfig;
use crate::core_vfs::PathRule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    pub chroot_dir: String,
    pub min_homedir: String,
    /// Where the JSON document store keeps its containers.
    pub data_dir: String,
    pub banner_file: Option<String>,
    /// Seconds of control-channel silence before the session is closed, 0 to disable.
    pub idle_timeout_secs: u64,
    /// Refuse connections whose address matches no stored ip mask.
    pub ipmask_check: bool,
    pub single_line_replies: bool,
    pub bcrypt_cost: u32,
    /// How long shutdown waits for sessions to close.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("0.0.0.0"),
            listen_port: 21,
            chroot_dir: String::from("/var/ftp"),
            min_homedir: String::from("/site"),
            data_dir: String::from("/var/lib/oxftpd"),
            banner_file: None,
            idle_timeout_secs: 900,
            ipmask_check: false,
            single_line_replies: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            shutdown_grace_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    pub upload_buffer_size: usize,
    pub download_buffer_size: usize,
    /// KiB/s per transfer, 0 for unlimited.
    pub max_download_speed: u32,
    pub max_upload_speed: u32,
    /// Sleep after every buffer even when under the limit, in milliseconds.
    pub min_sleep_ms: u64,
    pub ascii_downloads: bool,
    pub ascii_uploads: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            upload_buffer_size: DEFAULT_UPLOAD_BUFFER_SIZE,
            download_buffer_size: DEFAULT_DOWNLOAD_BUFFER_SIZE,
            max_download_speed: 0,
            max_upload_speed: 0,
            min_sleep_ms: 0,
            ascii_downloads: true,
            ascii_uploads: true,
        }
    }
}

impl TransferConfig {
    pub fn min_sleep(&self) -> Duration {
        Duration::from_millis(self.min_sleep_ms)
    }
}

/// An external program run after a command completes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostHookConfig {
    /// Verb the hook is attached to, `SITE` sub-commands as `SITE WHO`.
    pub verb: String,
    pub command: String,
    #[serde(default = "default_hook_timeout")]
    pub timeout_secs: u64,
}

fn default_hook_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub transfer: TransferConfig,
    pub tls: TlsConfig,
    pub post_hooks: Vec<PostHookConfig>,
    pub path_rules: Vec<PathRule>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        Ok(config)
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path))
    }
}
