use crate::config::Config;
use anyhow::{Context, Result};
use log::{error, info};
use std::fs;

/// Logs the effective configuration at startup.
pub fn log_config(config: &Config) {
    info!(
        "  Listen Address: {}:{}",
        config.server.listen_address, config.server.listen_port
    );
    info!("  Chroot Directory: {}", config.server.chroot_dir);
    info!("  Minimum Home Directory: {}", config.server.min_homedir);
    info!("  Data Directory: {}", config.server.data_dir);
    info!("  Idle Timeout: {}s", config.server.idle_timeout_secs);
    info!(
        "  Upload Buffer Size: {} KB",
        config.transfer.upload_buffer_size / 1024
    );
    info!(
        "  Download Buffer Size: {} KB",
        config.transfer.download_buffer_size / 1024
    );
    info!(
        "  Speed Limits: {} KB/s down, {} KB/s up",
        config.transfer.max_download_speed, config.transfer.max_upload_speed
    );
    info!("  TLS: {}", if config.tls.enabled { "enabled" } else { "disabled" });
    info!("  Post Hooks: {}", config.post_hooks.len());
    info!("  Path Rules: {}", config.path_rules.len());
}

/// Reads the greeting text sent before `220 ... ready.`
pub fn load_banner(path: &str) -> Result<String> {
    let banner = fs::read_to_string(path)
        .map_err(|e| {
            error!("Failed to read banner file: {}: {}", path, e);
            anyhow::Error::new(e)
        })
        .with_context(|| format!("Failed to read banner file: {}", path))?;

    let banner = banner.trim_end_matches(['\r', '\n']).to_string();
    if banner.is_empty() {
        error!("Banner file is empty: {}", path);
        return Err(anyhow::Error::msg("Banner file is empty."));
    }

    info!("Banner file loaded successfully: {}", path);
    Ok(banner)
}
